//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only
//! what they need via Axum's `FromRef`.

use hrvault_core::Config;
use hrvault_db::{EmployeeRepository, FileRepository};
use hrvault_processing::UploadValidator;
use hrvault_scanner::{QuarantineStore, Scanner};
use hrvault_storage::SecureFileStore;
use sqlx::PgPool;
use std::sync::Arc;

/// Database pool and repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub employees: EmployeeRepository,
    pub files: FileRepository,
}

/// The upload pipeline: validator, scanner, quarantine, storage engine.
#[derive(Clone)]
pub struct PipelineState {
    pub validator: UploadValidator,
    pub scanner: Arc<Scanner>,
    pub quarantine: QuarantineStore,
    pub engine: Arc<SecureFileStore>,
}

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub pipeline: PipelineState,
    pub config: Config,
}

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for PipelineState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.pipeline.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
