//! Service and repository wiring.

use anyhow::{Context, Result};
use hrvault_core::Config;
use hrvault_db::{EmployeeRepository, FileRepository};
use hrvault_processing::UploadValidator;
use hrvault_scanner::{QuarantineStore, Scanner};
use hrvault_storage::{SecureFileStore, UrlSigner};
use sqlx::PgPool;
use std::sync::Arc;

use crate::state::{AppState, DbState, PipelineState};

pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let db = DbState {
        employees: EmployeeRepository::new(pool.clone()),
        files: FileRepository::new(pool.clone()),
        pool,
    };

    let store = hrvault_storage::create_store(config)
        .await
        .context("Failed to initialize storage backend")?;
    let signer = UrlSigner::new(&config.url_signing_secret, &config.public_base_url);
    let engine = Arc::new(SecureFileStore::new(
        store,
        signer,
        config.signed_url_ttl_seconds,
    ));

    let scanner = if config.antivirus_enabled {
        Arc::new(
            Scanner::from_config(config)
                .map_err(|e| anyhow::anyhow!("Failed to initialize antivirus scanner: {}", e))?,
        )
    } else {
        tracing::warn!(
            "Antivirus scanning is DISABLED; every upload will be rejected at scan time"
        );
        Arc::new(Scanner::disabled())
    };

    let pipeline = PipelineState {
        validator: UploadValidator::new(config.max_file_size_bytes),
        scanner,
        quarantine: QuarantineStore::new(&config.quarantine_dir),
        engine,
    };

    Ok(Arc::new(AppState {
        db,
        pipeline,
        config: config.clone(),
    }))
}
