//! Stored file domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dimensions and format captured while re-encoding an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// Descriptive metadata recorded for every stored file.
///
/// For images the checksum covers the re-encoded bytes, since those are
/// what is persisted and later served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    /// sha256 hex of the persisted bytes
    pub checksum: String,
    pub is_image: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInfo>,
}

/// A file accepted by the pipeline and persisted by a storage backend.
///
/// Stored files are immutable; replacing content means a new upload with
/// a new id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: Uuid,
    /// `private/{id}/{sanitized_name}`
    pub storage_key: String,
    pub url: String,
    pub metadata: FileMetadata,
    /// Bounds the signed URL, not the file's retention.
    pub expires_at: DateTime<Utc>,
}
