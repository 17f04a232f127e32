//! Application setup and initialization.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod telemetry;

use crate::state::AppState;
use anyhow::{Context, Result};
use hrvault_core::Config;
use std::sync::Arc;

/// Initialize the entire application.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Config::from_env already validated; re-validate in case the caller
    // constructed the config another way.
    config
        .validate()
        .context("Configuration validation failed")?;

    telemetry::init_telemetry();
    crate::error::set_production_mode(config.is_production());

    tracing::info!(
        environment = %config.base.environment,
        storage_provider = %config.storage_provider,
        antivirus_enabled = config.antivirus_enabled,
        "Configuration loaded"
    );

    let pool = database::setup_database(&config).await?;

    let state = services::initialize_services(&config, pool).await?;

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
