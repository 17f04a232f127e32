use async_trait::async_trait;
use hrvault_core::models::FileMetadata;
use hrvault_core::StorageProvider;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Storage configuration error: {0}")]
    Configuration(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Backend-neutral object storage.
///
/// Keys are forward-slash separated relative paths such as
/// `private/{id}/{filename}`. Every backend must reject keys that
/// would escape its root.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object. Backends apply their at-rest protection here:
    /// the local store encrypts before writing, the S3 store requests
    /// server-side encryption on the put.
    async fn put(&self, key: &str, data: Vec<u8>, metadata: &FileMetadata) -> StorageResult<()>;

    /// Fetch an object's plaintext bytes.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object. Deleting a missing object is an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Backend-native presigned GET URL, or `None` when the backend has
    /// no native signing and the caller must issue an application URL.
    async fn presigned_get_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<Option<String>>;

    fn provider(&self) -> StorageProvider;
}
