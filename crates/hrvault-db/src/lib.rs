//! hrvault database layer
//!
//! Postgres repositories for the versioned employee entity and the stored
//! file catalog. The employee repository carries the conditional update
//! that makes the ETag compare-and-swap atomic at the database.

pub mod employees;
pub mod files;

pub use employees::EmployeeRepository;
pub use files::{FileRecord, FileRepository};

use anyhow::Context;
use sqlx::PgPool;

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}
