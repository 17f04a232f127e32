//! Security posture endpoint.
//!
//! Reports booleans, limits and counters only. Hosts, keys and secrets
//! never appear here.

use axum::{extract::State, Json};
use hrvault_scanner::ScanMetricsSnapshot;
use serde::Serialize;
use std::sync::Arc;

use crate::identity::CallerIdentity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AntivirusStatus {
    pub enabled: bool,
    pub provider: String,
    pub max_scan_size_bytes: usize,
    pub scan_timeout_seconds: u64,
    pub scans: ScanMetricsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct StorageStatus {
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct UploadPolicy {
    pub max_file_size_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct SignedUrlPolicy {
    pub ttl_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct SecurityStatus {
    pub antivirus: AntivirusStatus,
    pub storage: StorageStatus,
    pub uploads: UploadPolicy,
    pub signed_urls: SignedUrlPolicy,
}

pub async fn security_status(
    State(state): State<Arc<AppState>>,
    _identity: CallerIdentity,
) -> Json<SecurityStatus> {
    let scanner = &state.pipeline.scanner;

    Json(SecurityStatus {
        antivirus: AntivirusStatus {
            enabled: scanner.is_enabled(),
            provider: scanner.provider().to_string(),
            max_scan_size_bytes: scanner.max_scan_size(),
            scan_timeout_seconds: state.config.scan_timeout_seconds,
            scans: scanner.metrics(),
        },
        storage: StorageStatus {
            provider: state.config.storage_provider.to_string(),
        },
        uploads: UploadPolicy {
            max_file_size_bytes: state.config.max_file_size_bytes,
        },
        signed_urls: SignedUrlPolicy {
            ttl_seconds: state.config.signed_url_ttl_seconds,
        },
    })
}
