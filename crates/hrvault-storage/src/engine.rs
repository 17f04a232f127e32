//! Secure file store
//!
//! The tail of the upload pipeline: image re-encode, checksum, storage
//! key assignment and persistence through the configured backend, plus
//! signed URL issuing for reads. Database bookkeeping stays with the
//! caller.

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use hrvault_core::models::{FileMetadata, ImageInfo, StoredFile};
use hrvault_processing::{ImageCodec, ValidatedUpload};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::signer::UrlSigner;
use crate::traits::{ObjectStore, StorageError, StorageResult};

pub struct SecureFileStore {
    store: Arc<dyn ObjectStore>,
    signer: UrlSigner,
    url_ttl_seconds: i64,
}

impl SecureFileStore {
    pub fn new(store: Arc<dyn ObjectStore>, signer: UrlSigner, url_ttl_seconds: i64) -> Self {
        Self {
            store,
            signer,
            url_ttl_seconds,
        }
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Persist a validated, scanned upload.
    ///
    /// Images are decoded and re-encoded first, so the stored bytes and
    /// the checksum never cover the original (possibly metadata-laden)
    /// buffer.
    pub async fn store_file(
        &self,
        data: Vec<u8>,
        upload: &ValidatedUpload,
        uploaded_by: &str,
    ) -> StorageResult<StoredFile> {
        let id = Uuid::new_v4();

        let (bytes, mime_type, image) = if ImageCodec::is_image_mime(&upload.mime_type) {
            let sanitized = tokio::task::spawn_blocking(move || ImageCodec::sanitize(&data))
                .await
                .map_err(|e| StorageError::Backend(format!("Image task failed: {}", e)))?
                .map_err(|e| StorageError::ImageProcessing(e.to_string()))?;
            let info = ImageInfo {
                width: sanitized.width,
                height: sanitized.height,
                format: sanitized.format,
            };
            (sanitized.bytes, sanitized.mime_type, Some(info))
        } else {
            (data, upload.mime_type.clone(), None)
        };

        let checksum = hrvault_processing::sha256_hex_spawned(Bytes::from(bytes.clone()))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let now = Utc::now();
        let metadata = FileMetadata {
            original_name: upload.sanitized_name.clone(),
            mime_type,
            size: bytes.len() as u64,
            uploaded_by: uploaded_by.to_string(),
            uploaded_at: now,
            checksum,
            is_image: image.is_some(),
            image,
        };

        let storage_key = format!("private/{}/{}", id, upload.sanitized_name);
        self.store.put(&storage_key, bytes, &metadata).await?;

        let (url, expires_at) = self.issue_url(id, &storage_key).await?;

        info!(
            file_id = %id,
            key = %storage_key,
            size_bytes = metadata.size,
            uploaded_by = %uploaded_by,
            "File stored"
        );

        Ok(StoredFile {
            id,
            storage_key,
            url,
            metadata,
            expires_at,
        })
    }

    pub async fn load_file(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.store.get(storage_key).await
    }

    pub async fn delete_file(&self, storage_key: &str) -> StorageResult<()> {
        self.store.delete(storage_key).await
    }

    /// Issue a time-limited GET URL: backend-native presigning where the
    /// backend offers it, the application's HMAC URL otherwise.
    pub async fn issue_url(
        &self,
        file_id: Uuid,
        storage_key: &str,
    ) -> StorageResult<(String, DateTime<Utc>)> {
        let expires_at = Utc::now() + Duration::seconds(self.url_ttl_seconds);
        let expires_in = std::time::Duration::from_secs(self.url_ttl_seconds.max(0) as u64);

        let url = match self
            .store
            .presigned_get_url(storage_key, expires_in)
            .await?
        {
            Some(native) => native,
            None => self.signer.signed_url(file_id, expires_at)?,
        };
        Ok((url, expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::EncryptedLocalStore;
    use hrvault_core::FileCipher;
    use hrvault_processing::sha256_hex;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    async fn test_engine(dir: &std::path::Path) -> SecureFileStore {
        let cipher = FileCipher::from_key_bytes(b"01234567890123456789012345678901").unwrap();
        let store = EncryptedLocalStore::new(dir, cipher).await.unwrap();
        let signer = UrlSigner::new(
            "0123456789abcdef0123456789abcdef",
            "https://vault.example.com",
        );
        SecureFileStore::new(Arc::new(store), signer, 600)
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[tokio::test]
    async fn test_store_document_checksums_original_bytes() {
        let dir = tempdir().unwrap();
        let engine = test_engine(dir.path()).await;
        let data = b"plain text payroll notes".to_vec();
        let upload = ValidatedUpload {
            sanitized_name: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
            size: data.len(),
        };

        let stored = engine.store_file(data.clone(), &upload, "hr.admin").await.unwrap();

        assert_eq!(stored.metadata.checksum, sha256_hex(&data));
        assert_eq!(stored.metadata.size, data.len() as u64);
        assert!(!stored.metadata.is_image);
        assert_eq!(
            stored.storage_key,
            format!("private/{}/notes.txt", stored.id)
        );

        let read = engine.load_file(&stored.storage_key).await.unwrap();
        assert_eq!(read, data);
    }

    #[tokio::test]
    async fn test_store_image_reencodes_and_checksums_output() {
        let dir = tempdir().unwrap();
        let engine = test_engine(dir.path()).await;
        let data = png_bytes();
        let upload = ValidatedUpload {
            sanitized_name: "badge.png".to_string(),
            mime_type: "image/png".to_string(),
            size: data.len(),
        };

        let stored = engine.store_file(data.clone(), &upload, "hr.admin").await.unwrap();

        assert!(stored.metadata.is_image);
        let info = stored.metadata.image.as_ref().unwrap();
        assert_eq!((info.width, info.height), (16, 16));
        assert_eq!(info.format, "Png");

        // checksum covers what was persisted, not the upload buffer
        let persisted = engine.load_file(&stored.storage_key).await.unwrap();
        assert_eq!(stored.metadata.checksum, sha256_hex(&persisted));
        assert_eq!(stored.metadata.size, persisted.len() as u64);
    }

    #[tokio::test]
    async fn test_corrupt_image_rejected() {
        let dir = tempdir().unwrap();
        let engine = test_engine(dir.path()).await;
        let upload = ValidatedUpload {
            sanitized_name: "photo.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 12,
        };

        let result = engine
            .store_file(b"not an image".to_vec(), &upload, "hr.admin")
            .await;
        assert!(matches!(result, Err(StorageError::ImageProcessing(_))));
    }

    #[tokio::test]
    async fn test_issue_url_uses_application_signer_for_local() {
        let dir = tempdir().unwrap();
        let engine = test_engine(dir.path()).await;
        let id = Uuid::new_v4();

        let (url, expires_at) = engine
            .issue_url(id, "private/whatever/doc.pdf")
            .await
            .unwrap();
        assert!(url.contains(&id.to_string()));
        assert!(url.contains("signature="));
        assert!(expires_at > Utc::now());
    }

    #[tokio::test]
    async fn test_delete_file() {
        let dir = tempdir().unwrap();
        let engine = test_engine(dir.path()).await;
        let upload = ValidatedUpload {
            sanitized_name: "doc.txt".to_string(),
            mime_type: "text/plain".to_string(),
            size: 4,
        };
        let stored = engine
            .store_file(b"data".to_vec(), &upload, "hr.admin")
            .await
            .unwrap();

        engine.delete_file(&stored.storage_key).await.unwrap();
        assert!(matches!(
            engine.load_file(&stored.storage_key).await,
            Err(StorageError::NotFound(_))
        ));
    }
}
