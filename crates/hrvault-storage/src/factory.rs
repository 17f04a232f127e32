//! Storage backend selection
//!
//! Fail-closed: a provider whose settings are incomplete is a startup
//! error, never a silent fallback to another backend.

use hrvault_core::{Config, FileCipher, StorageProvider};
use std::sync::Arc;
use tracing::info;

use crate::hybrid::HybridStore;
use crate::local::EncryptedLocalStore;
use crate::s3::S3Store;
use crate::traits::{ObjectStore, StorageError, StorageResult};

async fn build_local(config: &Config) -> StorageResult<EncryptedLocalStore> {
    let path = config.local_storage_path.as_deref().ok_or_else(|| {
        StorageError::Configuration("LOCAL_STORAGE_PATH is required for local storage".to_string())
    })?;
    let key = config.encryption_key.as_deref().ok_or_else(|| {
        StorageError::Configuration("FILE_ENCRYPTION_KEY is required for local storage".to_string())
    })?;
    let cipher =
        FileCipher::from_base64(key).map_err(|e| StorageError::Configuration(e.to_string()))?;
    EncryptedLocalStore::new(path, cipher).await
}

fn build_s3(config: &Config) -> StorageResult<S3Store> {
    let bucket = config.s3_bucket.clone().ok_or_else(|| {
        StorageError::Configuration("S3_BUCKET is required for S3 storage".to_string())
    })?;
    let region = config
        .s3_region
        .clone()
        .unwrap_or_else(|| "us-east-1".to_string());
    S3Store::new(
        bucket,
        region,
        config.s3_endpoint.clone(),
        &config.s3_sse_algorithm,
    )
}

/// Build the storage backend named by the configuration.
pub async fn create_store(config: &Config) -> StorageResult<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.storage_provider {
        StorageProvider::Local => Arc::new(build_local(config).await?),
        StorageProvider::S3 => Arc::new(build_s3(config)?),
        StorageProvider::Hybrid => Arc::new(HybridStore::new(
            build_s3(config)?,
            build_local(config).await?,
        )),
    };

    info!(provider = %config.storage_provider, "Storage backend ready");
    Ok(store)
}
