//! File endpoints: upload pipeline, metadata, signed content, delete.
//!
//! Uploads run validate, then scan, then store, strictly in that order.
//! A rejected or failed scan quarantines the bytes and stores nothing.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use hrvault_core::models::{FileMetadata, StoredFile};
use hrvault_core::AppError;
use hrvault_processing::UploadCandidate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Non-file form fields tolerated before the request is rejected.
const MAX_EXTRA_FIELDS: usize = 4;

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: Uuid,
    pub url: String,
    pub expires_at: DateTime<Utc>,
    pub metadata: FileMetadata,
}

impl From<StoredFile> for FileResponse {
    fn from(stored: StoredFile) -> Self {
        Self {
            id: stored.id,
            url: stored.url,
            expires_at: stored.expires_at,
            metadata: stored.metadata,
        }
    }
}

/// Pull exactly one `file` field out of the multipart body. A second
/// file field, a file under another name, or a pile of stray fields are
/// each rejected with their own message.
async fn extract_upload(mut multipart: Multipart) -> Result<UploadCandidate, AppError> {
    let mut upload: Option<UploadCandidate> = None;
    let mut extra_fields = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            if upload.is_some() {
                return Err(AppError::MultipleFiles(
                    "Multiple file fields are not allowed; send exactly one field named 'file'"
                        .to_string(),
                ));
            }
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::BadRequest("File field has no filename".to_string()))?;
            let declared_mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?
                .to_vec();
            upload = Some(UploadCandidate {
                data,
                filename,
                declared_mime,
            });
        } else if field.file_name().is_some() {
            return Err(AppError::BadRequest(format!(
                "Unexpected file field '{}'; the file must be sent as 'file'",
                name
            )));
        } else {
            extra_fields += 1;
            if extra_fields > MAX_EXTRA_FIELDS {
                return Err(AppError::TooManyFields(
                    "Too many form fields in upload request".to_string(),
                ));
            }
        }
    }

    upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))
}

async fn quarantine_rejected(state: &AppState, candidate: &UploadCandidate) {
    if let Err(e) = state
        .pipeline
        .quarantine
        .quarantine(&candidate.data, &candidate.filename)
        .await
    {
        tracing::error!(
            error = %e,
            filename = %candidate.filename,
            "Failed to quarantine rejected upload"
        );
    }
}

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let candidate = extract_upload(multipart).await.map_err(HttpAppError)?;

    let validated = state.pipeline.validator.validate(&candidate)?;

    let outcome = match state
        .pipeline
        .scanner
        .scan_buffer(&candidate.data, &validated.sanitized_name, &identity.0)
        .await
    {
        Ok(outcome) => outcome,
        Err(scan_err) => {
            quarantine_rejected(&state, &candidate).await;
            return Err(scan_err.into());
        }
    };

    if !outcome.is_clean {
        quarantine_rejected(&state, &candidate).await;
        return Err(HttpAppError(AppError::SecurityThreat {
            threats: outcome.threats,
        }));
    }

    let stored = state
        .pipeline
        .engine
        .store_file(candidate.data, &validated, &identity.0)
        .await?;

    if let Err(e) = state.db.files.insert(&stored).await {
        // The object is orphaned without its catalog row; remove it.
        let engine = state.pipeline.engine.clone();
        let key = stored.storage_key.clone();
        tokio::spawn(async move {
            if let Err(cleanup_err) = engine.delete_file(&key).await {
                tracing::debug!(
                    error = %cleanup_err,
                    key = %key,
                    "Failed to clean up stored object after catalog insert error"
                );
            }
        });
        return Err(e.into());
    }

    Ok((StatusCode::CREATED, Json(FileResponse::from(stored))))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    _identity: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<FileResponse>, HttpAppError> {
    let record = state
        .db
        .files
        .get_by_id(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound(format!("File {} not found", id))))?;

    let (url, expires_at) = state
        .pipeline
        .engine
        .issue_url(record.id, &record.storage_key)
        .await?;

    Ok(Json(FileResponse {
        id: record.id,
        url,
        expires_at,
        metadata: record.metadata(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub expires: i64,
    pub signature: String,
}

/// Signed content retrieval. Possession of a valid, unexpired URL is the
/// only credential; no identity header is consulted here.
pub async fn get_file_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ContentQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let signer = state.pipeline.engine.signer();
    if !signer.verify(id, query.expires, &query.signature, Utc::now()) {
        return Err(HttpAppError(AppError::Unauthorized(
            "Signed URL is invalid or expired".to_string(),
        )));
    }

    let record = state
        .db
        .files
        .get_by_id(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound(format!("File {} not found", id))))?;

    let bytes = state.pipeline.engine.load_file(&record.storage_key).await?;

    tracing::info!(
        file_id = %id,
        size_bytes = bytes.len(),
        "Serving signed file content"
    );

    let headers = [
        (header::CONTENT_TYPE, record.mime_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", record.original_name),
        ),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
    ];
    Ok((headers, bytes))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    identity: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let record = state
        .db
        .files
        .get_by_id(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound(format!("File {} not found", id))))?;

    match state.pipeline.engine.delete_file(&record.storage_key).await {
        Ok(()) => {}
        Err(hrvault_storage::StorageError::NotFound(_)) => {
            tracing::warn!(
                file_id = %id,
                key = %record.storage_key,
                "Catalog row existed but the object was already gone"
            );
        }
        Err(e) => return Err(e.into()),
    }

    state.db.files.delete(id).await.map_err(HttpAppError)?;

    tracing::info!(
        file_id = %id,
        deleted_by = %identity.0,
        "File deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
