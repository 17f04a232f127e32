//! Employee repository
//!
//! The guarded update is a single conditional UPDATE keyed on both id and
//! the expected `updated_at`, so concurrent writers cannot interleave
//! between the version check and the write.

use chrono::{DateTime, Utc};
use hrvault_core::models::{Employee, EmployeeUpdate};
use hrvault_core::{etag, AppError};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<Postgres, Employee>(
            "SELECT * FROM employees WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Apply an update only if the row's `updated_at` still matches the
    /// revision the caller read. Zero rows affected means either the row
    /// is gone or someone else won the race; the follow-up read tells the
    /// two apart and surfaces the now-current fingerprint on conflict.
    pub async fn update_guarded(
        &self,
        id: Uuid,
        update: &EmployeeUpdate,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<Employee, AppError> {
        let updated = sqlx::query_as::<Postgres, Employee>(
            r#"
            UPDATE employees
            SET full_name = $3, email = $4, department = $5, updated_at = NOW()
            WHERE id = $1 AND updated_at = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_updated_at)
        .bind(&update.full_name)
        .bind(&update.email)
        .bind(&update.department)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(employee) = updated {
            return Ok(employee);
        }

        match self.get_by_id(id).await? {
            Some(current) => {
                tracing::debug!(
                    employee_id = %id,
                    "Guarded update lost the race; returning current fingerprint"
                );
                Err(AppError::PreconditionFailed {
                    expected: etag::generate(current.id, current.updated_at),
                })
            }
            None => Err(AppError::NotFound(format!("Employee {} not found", id))),
        }
    }
}
