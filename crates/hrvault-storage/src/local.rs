//! Encrypted local filesystem backend
//!
//! Objects are AES-256-GCM encrypted before touching disk and written
//! with owner-only permissions. A `{key}.meta.json` sidecar carries the
//! descriptive metadata so the directory is self-describing even
//! without the database.

use async_trait::async_trait;
use hrvault_core::models::FileMetadata;
use hrvault_core::{FileCipher, StorageProvider};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::traits::{ObjectStore, StorageError, StorageResult};

const METADATA_SUFFIX: &str = ".meta.json";

pub struct EncryptedLocalStore {
    base_path: PathBuf,
    cipher: FileCipher,
}

impl EncryptedLocalStore {
    pub async fn new(base_path: impl AsRef<Path>, cipher: FileCipher) -> StorageResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&base_path).await?;
        info!(path = %base_path.display(), "Encrypted local storage initialized");
        Ok(Self { base_path, cipher })
    }

    /// Resolve a storage key to a path under the base directory.
    /// Rejects absolute keys and any `..` component.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }
        if key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        if key.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(key))
    }

    fn metadata_path(&self, key: &str) -> StorageResult<PathBuf> {
        self.key_to_path(&format!("{}{}", key, METADATA_SUFFIX))
    }

    /// Write with 0600 permissions and fsync before returning.
    async fn write_private(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Read the metadata sidecar for a stored object.
    pub async fn read_metadata(&self, key: &str) -> StorageResult<FileMetadata> {
        let path = self.metadata_path(key)?;
        let raw = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        serde_json::from_slice(&raw)
            .map_err(|e| StorageError::Backend(format!("Corrupt metadata sidecar: {}", e)))
    }
}

#[async_trait]
impl ObjectStore for EncryptedLocalStore {
    async fn put(&self, key: &str, data: Vec<u8>, metadata: &FileMetadata) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let plaintext_len = data.len();

        let encrypted = self
            .cipher
            .encrypt(&data)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        self.write_private(&path, &encrypted).await?;

        let sidecar = serde_json::to_vec_pretty(metadata)
            .map_err(|e| StorageError::Backend(format!("Failed to encode metadata: {}", e)))?;
        self.write_private(&self.metadata_path(key)?, &sidecar)
            .await?;

        info!(
            key = %key,
            size_bytes = plaintext_len,
            encrypted_bytes = encrypted.len(),
            "File stored locally"
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;
        let encrypted = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        let plaintext = self
            .cipher
            .decrypt(&encrypted)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        debug!(key = %key, size_bytes = plaintext.len(), "File read locally");
        Ok(plaintext)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        // Sidecar removal is best-effort; the object itself is gone.
        if let Ok(meta_path) = self.metadata_path(key) {
            let _ = tokio::fs::remove_file(&meta_path).await;
        }

        info!(key = %key, "File deleted locally");
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn presigned_get_url(
        &self,
        _key: &str,
        _expires_in: Duration,
    ) -> StorageResult<Option<String>> {
        // Local objects are served through the application's signed
        // content endpoint.
        Ok(None)
    }

    fn provider(&self) -> StorageProvider {
        StorageProvider::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn test_metadata() -> FileMetadata {
        FileMetadata {
            original_name: "contract.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: 11,
            uploaded_by: "hr.admin".to_string(),
            uploaded_at: Utc::now(),
            checksum: "deadbeef".to_string(),
            is_image: false,
            image: None,
        }
    }

    async fn test_store(dir: &Path) -> EncryptedLocalStore {
        let cipher = FileCipher::from_key_bytes(b"01234567890123456789012345678901").unwrap();
        EncryptedLocalStore::new(dir, cipher).await.unwrap()
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;

        store
            .put("private/abc/contract.pdf", b"%PDF-1.4 ...".to_vec(), &test_metadata())
            .await
            .unwrap();
        let read = store.get("private/abc/contract.pdf").await.unwrap();
        assert_eq!(read, b"%PDF-1.4 ...");
    }

    #[tokio::test]
    async fn test_bytes_on_disk_are_encrypted() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;
        let plaintext = b"very sensitive salary data".to_vec();

        store
            .put("private/abc/salary.txt", plaintext.clone(), &test_metadata())
            .await
            .unwrap();

        let raw = tokio::fs::read(dir.path().join("private/abc/salary.txt"))
            .await
            .unwrap();
        assert_ne!(raw, plaintext);
        assert!(!raw
            .windows(plaintext.len())
            .any(|window| window == plaintext.as_slice()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;
        store
            .put("private/abc/doc.pdf", b"data".to_vec(), &test_metadata())
            .await
            .unwrap();

        let meta = tokio::fs::metadata(dir.path().join("private/abc/doc.pdf"))
            .await
            .unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_metadata_sidecar_written() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;
        store
            .put("private/abc/doc.pdf", b"data".to_vec(), &test_metadata())
            .await
            .unwrap();

        let read = store.read_metadata("private/abc/doc.pdf").await.unwrap();
        assert_eq!(read.original_name, "contract.pdf");
        assert_eq!(read.checksum, "deadbeef");
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;

        for key in ["../escape.txt", "private/../../etc/passwd", "/etc/passwd", ""] {
            let result = store.get(key).await;
            assert!(
                matches!(result, Err(StorageError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_delete_removes_object_and_sidecar() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;
        store
            .put("private/abc/doc.pdf", b"data".to_vec(), &test_metadata())
            .await
            .unwrap();

        store.delete("private/abc/doc.pdf").await.unwrap();
        assert!(!store.exists("private/abc/doc.pdf").await.unwrap());
        assert!(matches!(
            store.read_metadata("private/abc/doc.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;
        assert!(matches!(
            store.get("private/missing/doc.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_presign_defers_to_application() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;
        let url = store
            .presigned_get_url("private/abc/doc.pdf", Duration::from_secs(600))
            .await
            .unwrap();
        assert!(url.is_none());
    }
}
