//! Caller identity extractor
//!
//! Authentication is handled by an upstream gateway which asserts the
//! caller in the `X-Authenticated-User` header. This service only
//! consumes the assertion; a request without it is unauthorized.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hrvault_core::AppError;

use crate::error::HttpAppError;

pub const IDENTITY_HEADER: &str = "x-authenticated-user";

#[derive(Debug, Clone)]
pub struct CallerIdentity(pub String);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match user {
            Some(user) => Ok(CallerIdentity(user.to_string())),
            None => Err(HttpAppError(AppError::Unauthorized(
                "Missing authenticated user header".to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CallerIdentity, HttpAppError> {
        let (mut parts, _) = request.into_parts();
        CallerIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_present_header_accepted() {
        let request = Request::builder()
            .header("X-Authenticated-User", "hr.admin")
            .body(())
            .unwrap();
        let identity = extract(request).await.unwrap();
        assert_eq!(identity.0, "hr.admin");
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let request = Request::builder().body(()).unwrap();
        assert!(extract(request).await.is_err());
    }

    #[tokio::test]
    async fn test_blank_header_rejected() {
        let request = Request::builder()
            .header("X-Authenticated-User", "   ")
            .body(())
            .unwrap();
        assert!(extract(request).await.is_err());
    }
}
