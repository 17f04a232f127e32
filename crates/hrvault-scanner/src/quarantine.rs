//! Quarantine store for rejected upload bytes
//!
//! Best-effort: callers log a quarantine failure and still reject the
//! upload. Filenames are timestamp-prefixed, so the directory is
//! append-only and collisions are practically impossible.

use chrono::{DateTime, Utc};
use hrvault_processing::sanitize_filename;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct QuarantineRecord {
    pub path: PathBuf,
    pub original_name: String,
    pub quarantined_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct QuarantineStore {
    dir: PathBuf,
}

impl QuarantineStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub async fn quarantine(
        &self,
        data: &[u8],
        original_filename: &str,
    ) -> Result<QuarantineRecord, std::io::Error> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let now = Utc::now();
        let sanitized = sanitize_filename(original_filename);
        let sanitized = if sanitized.is_empty() {
            "unnamed".to_string()
        } else {
            sanitized
        };
        let path = self
            .dir
            .join(format!("{}_{}", now.timestamp_millis(), sanitized));

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::warn!(
            path = %path.display(),
            original_name = %original_filename,
            size_bytes = data.len(),
            "File quarantined"
        );

        Ok(QuarantineRecord {
            path,
            original_name: original_filename.to_string(),
            quarantined_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_quarantine_writes_timestamped_file() {
        let dir = tempdir().unwrap();
        let store = QuarantineStore::new(dir.path().join("q"));

        let record = store.quarantine(b"bad bytes", "evil.pdf").await.unwrap();
        assert!(record.path.exists());
        let name = record.path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_evil.pdf"));

        let written = tokio::fs::read(&record.path).await.unwrap();
        assert_eq!(written, b"bad bytes");
    }

    #[tokio::test]
    async fn test_quarantine_sanitizes_filename() {
        let dir = tempdir().unwrap();
        let store = QuarantineStore::new(dir.path());

        let record = store
            .quarantine(b"x", "../../etc/passwd")
            .await
            .unwrap();
        let name = record.path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_passwd"));
        assert!(record.path.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_quarantine_keeps_original_name_in_record() {
        let dir = tempdir().unwrap();
        let store = QuarantineStore::new(dir.path());
        let record = store.quarantine(b"x", "report q4.xlsx").await.unwrap();
        assert_eq!(record.original_name, "report q4.xlsx");
    }
}
