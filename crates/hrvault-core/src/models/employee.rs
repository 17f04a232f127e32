//! Employee entity - the versioned record guarded by the ETag protocol

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable fields accepted by the guarded update.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeUpdate {
    pub full_name: String,
    pub email: String,
    pub department: String,
}
