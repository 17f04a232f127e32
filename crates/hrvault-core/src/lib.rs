//! hrvault Core Library
//!
//! This crate provides the domain models, error types, configuration,
//! version fingerprinting and at-rest encryption shared across all
//! hrvault components.

pub mod cipher;
pub mod config;
pub mod error;
pub mod etag;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use cipher::FileCipher;
pub use config::{BaseConfig, Config};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::{ScanProvider, StorageProvider};
