//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain
//! errors convert into `AppError` here (orphan rules keep the
//! `IntoResponse` impl on a local wrapper) and render as a consistent
//! JSON body with status, machine-readable code and recoverability.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hrvault_core::{AppError, ErrorMetadata, LogLevel};
use hrvault_processing::ValidationError;
use hrvault_scanner::ScanError;
use hrvault_storage::StorageError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    /// Current version fingerprint, present on 412 responses only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// Wrapper so we can implement IntoResponse for the core AppError.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        let app = match err {
            ValidationError::FileTooLarge { size, max } => {
                AppError::PayloadTooLarge(format!("{} bytes exceeds max {} bytes", size, max))
            }
            other => AppError::Validation(other.to_string()),
        };
        HttpAppError(app)
    }
}

impl From<ScanError> for HttpAppError {
    fn from(err: ScanError) -> Self {
        HttpAppError(AppError::ScanUnavailable(err.to_string()))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("File not found: {}", key)),
            StorageError::InvalidKey(msg) => AppError::BadRequest(format!("Invalid key: {}", msg)),
            StorageError::ImageProcessing(msg) => {
                AppError::Validation(format!("Image could not be processed: {}", msg))
            }
            StorageError::Configuration(msg) => AppError::Internal(msg),
            StorageError::Backend(msg) => AppError::Storage(msg),
            StorageError::Io(e) => AppError::Storage(format!("IO error: {}", e)),
        };
        HttpAppError(app)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Request failed");
        }
    }
}

/// Detail-hiding mode, injected once from the validated config at
/// startup. Until it is set, responses hide details.
static PRODUCTION_MODE: std::sync::OnceLock<bool> = std::sync::OnceLock::new();

pub fn set_production_mode(is_production: bool) {
    let _ = PRODUCTION_MODE.set(is_production);
}

fn is_production() -> bool {
    PRODUCTION_MODE.get().copied().unwrap_or(true)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let expected = match app_error {
            AppError::PreconditionFailed { expected } => Some(expected.clone()),
            _ => None,
        };

        // Sensitive errors hide details in production.
        let body = if is_production || app_error.is_sensitive() {
            Json(ErrorResponse {
                error: app_error.client_message(),
                details: None,
                error_type: None,
                code: app_error.error_code().to_string(),
                recoverable: app_error.is_recoverable(),
                suggested_action: app_error.suggested_action().map(String::from),
                expected,
            })
        } else {
            Json(ErrorResponse {
                error: app_error.client_message(),
                details: Some(app_error.detailed_message()),
                error_type: Some(app_error.error_type().to_string()),
                code: app_error.error_code().to_string(),
                recoverable: app_error.is_recoverable(),
                suggested_action: app_error.suggested_action().map(String::from),
                expected,
            })
        };

        (status, body).into_response()
    }
}
