//! hrvault storage backends
//!
//! The `ObjectStore` trait with its encrypted local, S3 and hybrid
//! implementations, the signed-URL issuer, and the `SecureFileStore`
//! engine that ties the upload pipeline's tail together.

pub mod engine;
pub mod factory;
pub mod hybrid;
pub mod local;
pub mod s3;
pub mod signer;
pub mod traits;

pub use engine::SecureFileStore;
pub use factory::create_store;
pub use hybrid::HybridStore;
pub use local::EncryptedLocalStore;
pub use s3::S3Store;
pub use signer::UrlSigner;
pub use traits::{ObjectStore, StorageError, StorageResult};
