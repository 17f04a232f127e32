//! Error types module
//!
//! This module provides the core error types used throughout the hrvault
//! application. All errors are unified under the `AppError` enum which can
//! represent database, storage, validation, scanning, and concurrency
//! errors.

use std::io;

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for security-relevant rejections
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "SECURITY_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Security threat detected: {}", threats.join(", "))]
    SecurityThreat { threats: Vec<String> },

    #[error("Antivirus scan unavailable: {0}")]
    ScanUnavailable(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Multiple file fields: {0}")]
    MultipleFiles(String),

    #[error("Too many form fields: {0}")]
    TooManyFields(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Precondition failed: expected version {expected}")]
    PreconditionFailed { expected: String },

    #[error("Precondition required: {0}")]
    PreconditionRequired(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

// Error conversion implementations
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::BadRequest(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// Reduces duplication in ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Check file type, name and size and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::SecurityThreat { .. } => (
            422,
            "SECURITY_ERROR",
            false,
            Some("The file was rejected by the antivirus scan"),
            false,
            LogLevel::Warn,
        ),
        AppError::ScanUnavailable(_) => (
            503,
            "SCAN_UNAVAILABLE",
            true,
            Some("Retry after the antivirus service recovers"),
            true,
            LogLevel::Error,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::MultipleFiles(_) => (
            400,
            "MULTIPLE_FILES",
            false,
            Some("Send exactly one file field named 'file'"),
            false,
            LogLevel::Debug,
        ),
        AppError::TooManyFields(_) => (
            400,
            "TOO_MANY_FIELDS",
            false,
            Some("Remove extra form fields from the upload request"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::PreconditionFailed { .. } => (
            412,
            "PRECONDITION_FAILED",
            true,
            Some("Re-fetch the entity and retry with the current ETag"),
            false,
            LogLevel::Debug,
        ),
        AppError::PreconditionRequired(_) => (
            400,
            "PRECONDITION_REQUIRED",
            false,
            Some("Send an If-Match header with the current ETag"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Check authentication with the upstream gateway"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::Validation(_) => "Validation",
            AppError::SecurityThreat { .. } => "SecurityThreat",
            AppError::ScanUnavailable(_) => "ScanUnavailable",
            AppError::BadRequest(_) => "BadRequest",
            AppError::MultipleFiles(_) => "MultipleFiles",
            AppError::TooManyFields(_) => "TooManyFields",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::PreconditionFailed { .. } => "PreconditionFailed",
            AppError::PreconditionRequired(_) => "PreconditionRequired",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Validation(ref msg) => msg.clone(),
            AppError::SecurityThreat { threats } => {
                format!("File rejected by security scan: {}", threats.join(", "))
            }
            AppError::ScanUnavailable(_) => {
                "Antivirus scanning is currently unavailable".to_string()
            }
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::MultipleFiles(ref msg) => msg.clone(),
            AppError::TooManyFields(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::PreconditionFailed { expected } => {
                format!("Entity was modified concurrently; current version is {}", expected)
            }
            AppError::PreconditionRequired(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access database");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_security_threat() {
        let err = AppError::SecurityThreat {
            threats: vec!["Eicar-Test-Signature".to_string()],
        };
        assert_eq!(err.http_status_code(), 422);
        assert_eq!(err.error_code(), "SECURITY_ERROR");
        assert!(!err.is_recoverable());
        assert!(err.client_message().contains("Eicar-Test-Signature"));
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_scan_unavailable() {
        let err = AppError::ScanUnavailable("clamd timeout".to_string());
        assert_eq!(err.http_status_code(), 503);
        assert_eq!(err.error_code(), "SCAN_UNAVAILABLE");
        assert!(err.is_recoverable());
        // provider internals never reach the client message
        assert!(!err.client_message().contains("clamd"));
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_precondition_failed() {
        let err = AppError::PreconditionFailed {
            expected: "\"abc123\"".to_string(),
        };
        assert_eq!(err.http_status_code(), 412);
        assert_eq!(err.error_code(), "PRECONDITION_FAILED");
        assert!(err.is_recoverable());
        assert!(err.client_message().contains("\"abc123\""));
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_upload_rejection_codes_are_distinct() {
        let multiple = AppError::MultipleFiles("second 'file' field".to_string());
        let fields = AppError::TooManyFields("limit is 4".to_string());
        let generic = AppError::BadRequest("malformed".to_string());
        assert_eq!(multiple.http_status_code(), 400);
        assert_eq!(fields.http_status_code(), 400);
        assert_eq!(multiple.error_code(), "MULTIPLE_FILES");
        assert_eq!(fields.error_code(), "TOO_MANY_FIELDS");
        assert_ne!(multiple.error_code(), generic.error_code());
        assert_ne!(fields.error_code(), generic.error_code());
        assert_eq!(multiple.client_message(), "second 'file' field");
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("Resource not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Resource not found");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }
}
