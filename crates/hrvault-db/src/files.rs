//! Stored file catalog
//!
//! Persists the descriptive metadata of every accepted upload. The bytes
//! themselves live in the configured object store; this table is how the
//! retrieval endpoints find a storage key and MIME type by file id.

use chrono::{DateTime, Utc};
use hrvault_core::models::{FileMetadata, ImageInfo, StoredFile};
use hrvault_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub storage_key: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub checksum: String,
    pub is_image: bool,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
    pub image_format: Option<String>,
}

impl FileRecord {
    pub fn metadata(&self) -> FileMetadata {
        let image = match (self.image_width, self.image_height, &self.image_format) {
            (Some(w), Some(h), Some(format)) => Some(ImageInfo {
                width: w as u32,
                height: h as u32,
                format: format.clone(),
            }),
            _ => None,
        };
        FileMetadata {
            original_name: self.original_name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size_bytes as u64,
            uploaded_by: self.uploaded_by.clone(),
            uploaded_at: self.uploaded_at,
            checksum: self.checksum.clone(),
            is_image: self.is_image,
            image,
        }
    }
}

#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, file: &StoredFile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO stored_files (
                id, storage_key, original_name, mime_type, size_bytes,
                uploaded_by, uploaded_at, checksum, is_image,
                image_width, image_height, image_format
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(file.id)
        .bind(&file.storage_key)
        .bind(&file.metadata.original_name)
        .bind(&file.metadata.mime_type)
        .bind(file.metadata.size as i64)
        .bind(&file.metadata.uploaded_by)
        .bind(file.metadata.uploaded_at)
        .bind(&file.metadata.checksum)
        .bind(file.metadata.is_image)
        .bind(file.metadata.image.as_ref().map(|i| i.width as i32))
        .bind(file.metadata.image.as_ref().map(|i| i.height as i32))
        .bind(file.metadata.image.as_ref().map(|i| i.format.clone()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileRecord>(
            "SELECT * FROM stored_files WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Returns true if a row was deleted.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM stored_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
