//! Employee read/update with version fingerprints.
//!
//! GET returns the entity plus an `ETag`; PUT demands `If-Match` and
//! compares before writing, then the repository's conditional UPDATE
//! re-checks atomically. A stale fingerprint writes nothing and answers
//! 412 with the current one.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use hrvault_core::models::{Employee, EmployeeUpdate};
use hrvault_core::{etag, AppError};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Compare the caller's `If-Match` against the row's current
/// fingerprint; a stale value rejects the write and surfaces the
/// fingerprint the caller must re-fetch against.
fn check_precondition(if_match: &str, current_fingerprint: &str) -> Result<(), AppError> {
    if etag::matches_if_match(if_match, current_fingerprint) {
        Ok(())
    } else {
        Err(AppError::PreconditionFailed {
            expected: current_fingerprint.to_string(),
        })
    }
}

async fn fetch_employee(state: &AppState, id: Uuid) -> Result<Employee, HttpAppError> {
    state
        .db
        .employees
        .get_by_id(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound(format!("Employee {} not found", id))))
}

pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    _identity: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let employee = fetch_employee(&state, id).await?;
    let fingerprint = etag::generate(employee.id, employee.updated_at);
    Ok(([(header::ETAG, fingerprint)], Json(employee)))
}

pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    identity: CallerIdentity,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(update): Json<EmployeeUpdate>,
) -> Result<impl IntoResponse, HttpAppError> {
    let if_match = headers
        .get(header::IF_MATCH)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            HttpAppError(AppError::PreconditionRequired(
                "If-Match header is required for updates".to_string(),
            ))
        })?;

    let current = fetch_employee(&state, id).await?;
    let current_fingerprint = etag::generate(current.id, current.updated_at);

    if let Err(stale) = check_precondition(if_match, &current_fingerprint) {
        tracing::debug!(
            employee_id = %id,
            requested_by = %identity.0,
            "Stale If-Match; rejecting update"
        );
        return Err(HttpAppError(stale));
    }

    // The repository re-checks updated_at in the UPDATE itself, so a
    // writer landing between the read above and this call still loses.
    let updated = state
        .db
        .employees
        .update_guarded(id, &update, current.updated_at)
        .await
        .map_err(HttpAppError)?;

    tracing::info!(
        employee_id = %id,
        updated_by = %identity.0,
        "Employee updated"
    );

    let fingerprint = etag::generate(updated.id, updated.updated_at);
    Ok(([(header::ETAG, fingerprint)], Json(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_check_precondition_accepts_current_fingerprint() {
        let fingerprint = etag::generate(Uuid::new_v4(), Utc::now());
        assert!(check_precondition(&fingerprint, &fingerprint).is_ok());
    }

    #[test]
    fn test_check_precondition_accepts_wildcard() {
        let fingerprint = etag::generate(Uuid::new_v4(), Utc::now());
        assert!(check_precondition("*", &fingerprint).is_ok());
    }

    #[test]
    fn test_check_precondition_stale_surfaces_current_fingerprint() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let stale = etag::generate(id, now - chrono::Duration::seconds(5));
        let current = etag::generate(id, now);

        let err = check_precondition(&stale, &current).unwrap_err();
        match err {
            AppError::PreconditionFailed { expected } => assert_eq!(expected, current),
            other => panic!("Expected PreconditionFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_update_renders_412_with_expected_fingerprint() {
        let current = etag::generate(Uuid::new_v4(), Utc::now());
        let err = check_precondition("\"deadbeef\"", &current).unwrap_err();

        let response = HttpAppError(err).into_response();
        assert_eq!(response.status().as_u16(), 412);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body.get("code").and_then(|v| v.as_str()),
            Some("PRECONDITION_FAILED")
        );
        assert_eq!(
            body.get("expected").and_then(|v| v.as_str()),
            Some(current.as_str())
        );
    }
}
