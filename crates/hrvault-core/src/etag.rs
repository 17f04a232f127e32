//! Version fingerprints for optimistic concurrency control.
//!
//! A fingerprint is derived from an entity's id and its `updated_at`
//! timestamp; it is never persisted. Any successful mutation advances
//! `updated_at`, which invalidates every previously issued fingerprint.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate the version fingerprint for an entity revision.
///
/// Returns a quoted hex digest suitable for use directly as an HTTP
/// `ETag` header value. Pure: same inputs always yield the same output.
pub fn generate(entity_id: Uuid, updated_at: DateTime<Utc>) -> String {
    let input = format!("{}:{}", entity_id, updated_at.timestamp_millis());
    let digest = Sha256::digest(input.as_bytes());
    format!("\"{}\"", hex::encode(digest))
}

/// Check an `If-Match` header value against the current fingerprint.
///
/// The header may carry a comma-separated list of fingerprints; `*`
/// matches any current version. Comparison is exact, including quotes.
pub fn matches_if_match(if_match: &str, current: &str) -> bool {
    if_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate == current)
}
