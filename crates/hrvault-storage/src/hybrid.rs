//! Hybrid backend: S3 primary with an encrypted local cache
//!
//! Writes must land in S3; the local copy is a cache and its failures
//! only warn. Reads prefer the local copy and fall back to S3.

use async_trait::async_trait;
use hrvault_core::models::FileMetadata;
use hrvault_core::StorageProvider;
use std::time::Duration;
use tracing::{debug, warn};

use crate::local::EncryptedLocalStore;
use crate::s3::S3Store;
use crate::traits::{ObjectStore, StorageError, StorageResult};

pub struct HybridStore {
    remote: S3Store,
    local: EncryptedLocalStore,
}

impl HybridStore {
    pub fn new(remote: S3Store, local: EncryptedLocalStore) -> Self {
        Self { remote, local }
    }
}

#[async_trait]
impl ObjectStore for HybridStore {
    async fn put(&self, key: &str, data: Vec<u8>, metadata: &FileMetadata) -> StorageResult<()> {
        self.remote.put(key, data.clone(), metadata).await?;

        if let Err(e) = self.local.put(key, data, metadata).await {
            warn!(key = %key, error = %e, "Local cache write failed; object is in S3 only");
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        match self.local.get(key).await {
            Ok(bytes) => Ok(bytes),
            Err(StorageError::NotFound(_)) => {
                debug!(key = %key, "Cache miss, reading from S3");
                self.remote.get(key).await
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Local cache read failed, reading from S3");
                self.remote.get(key).await
            }
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.remote.delete(key).await?;

        match self.local.delete(key).await {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(e) => warn!(key = %key, error = %e, "Failed to evict local cache copy"),
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.remote.exists(key).await
    }

    async fn presigned_get_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<Option<String>> {
        self.remote.presigned_get_url(key, expires_in).await
    }

    fn provider(&self) -> StorageProvider {
        StorageProvider::Hybrid
    }
}
