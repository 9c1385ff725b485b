//! Task entity model and DTOs.

use atrium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub assignee_user_id: Option<DbId>,
    pub due_date: Option<chrono::NaiveDate>,
    pub completed_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `todo` if omitted.
    pub status: Option<String>,
    /// Defaults to `medium` if omitted.
    pub priority: Option<String>,
    pub assignee_user_id: Option<DbId>,
    pub due_date: Option<chrono::NaiveDate>,
}

/// DTO for updating a task. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_user_id: Option<DbId>,
    pub due_date: Option<chrono::NaiveDate>,
}
