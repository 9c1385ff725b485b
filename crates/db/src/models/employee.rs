//! Employee entity model and DTOs.

use atrium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `employees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: DbId,
    pub tenant_id: DbId,
    pub user_id: Option<DbId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub employment_status: String,
    pub hired_on: Option<chrono::NaiveDate>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new employee.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployee {
    pub user_id: Option<DbId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub department: Option<String>,
    /// Defaults to `active` if omitted.
    pub employment_status: Option<String>,
    pub hired_on: Option<chrono::NaiveDate>,
}

/// DTO for updating an employee. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEmployee {
    pub user_id: Option<DbId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub employment_status: Option<String>,
    pub hired_on: Option<chrono::NaiveDate>,
}
