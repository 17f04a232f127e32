//! S3 backend with server-side encryption
//!
//! Every put requests SSE (AES256 by default) and carries object tags
//! derived from the file metadata. Presigned GET URLs come from the
//! object store's native signer.

use async_trait::async_trait;
use bytes::Bytes;
use hrvault_core::models::FileMetadata;
use hrvault_core::StorageProvider;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder, AmazonS3ConfigKey};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore as _, ObjectStoreExt, PutOptions, PutPayload, TagSet};
use std::time::Duration;
use tracing::{debug, info};

use crate::traits::{ObjectStore, StorageError, StorageResult};

#[derive(Clone)]
pub struct S3Store {
    store: AmazonS3,
    bucket: String,
}

impl S3Store {
    /// Build the backing client. Credentials come from the environment;
    /// bucket, region, optional endpoint and the SSE algorithm are
    /// explicit settings.
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        sse_algorithm: &str,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let sse_key: AmazonS3ConfigKey = "aws_server_side_encryption"
            .parse()
            .map_err(|e: ObjectStoreError| StorageError::Configuration(e.to_string()))?;
        builder = builder.with_config(sse_key, sse_algorithm);

        let store = builder
            .build()
            .map_err(|e| StorageError::Configuration(e.to_string()))?;

        info!(bucket = %bucket, sse = %sse_algorithm, "S3 storage initialized");
        Ok(Self { store, bucket })
    }

    fn map_error(&self, key: &str, error: ObjectStoreError) -> StorageError {
        match error {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::Backend(format!("S3 request failed: {}", other)),
        }
    }

    /// S3 object tags only allow a narrow character set; anything else
    /// is replaced rather than failing the upload.
    fn tag_value(raw: &str) -> String {
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || "+-=._:/@ ".contains(c) {
                    c
                } else {
                    '_'
                }
            })
            .take(256)
            .collect()
    }

    fn tags_for(metadata: &FileMetadata) -> TagSet {
        let mut tags = TagSet::default();
        tags.push("uploaded-by", &Self::tag_value(&metadata.uploaded_by));
        tags.push("checksum-sha256", &metadata.checksum);
        tags.push("uploaded-at", &metadata.uploaded_at.to_rfc3339());
        tags
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, data: Vec<u8>, metadata: &FileMetadata) -> StorageResult<()> {
        let location = Path::from(key);
        let size = data.len();
        let mut options = PutOptions::default();
        options.tags = Self::tags_for(metadata);

        self.store
            .put_opts(&location, PutPayload::from(Bytes::from(data)), options)
            .await
            .map_err(|e| self.map_error(key, e))?;

        info!(
            key = %key,
            bucket = %self.bucket,
            size_bytes = size,
            "File stored in S3"
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let location = Path::from(key);
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| self.map_error(key, e))?;
        let bytes = result.bytes().await.map_err(|e| self.map_error(key, e))?;
        debug!(key = %key, size_bytes = bytes.len(), "File read from S3");
        Ok(bytes.to_vec())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let location = Path::from(key);
        self.store
            .delete(&location)
            .await
            .map_err(|e| self.map_error(key, e))?;
        info!(key = %key, bucket = %self.bucket, "File deleted from S3");
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let location = Path::from(key);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.map_error(key, e)),
        }
    }

    async fn presigned_get_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<Option<String>> {
        let location = Path::from(key);
        let url = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await
            .map_err(|e| self.map_error(key, e))?;
        Ok(Some(url.to_string()))
    }

    fn provider(&self) -> StorageProvider {
        StorageProvider::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_value_sanitized() {
        assert_eq!(S3Store::tag_value("hr.admin@corp"), "hr.admin@corp");
        assert_eq!(S3Store::tag_value("weird\"chars<>"), "weird_chars__");
    }
}
