//! Repository for the `tasks` table.

use atrium_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::task::{CreateTask, Task, UpdateTask};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, tenant_id, project_id, title, description, status, priority, \
                        assignee_user_id, due_date, completed_at, created_by, created_at, updated_at";

/// Provides tenant-scoped CRUD operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task, returning the created row.
    ///
    /// The caller must have verified that `input.project_id` belongs to the
    /// tenant. `completed_at` is stamped when the task is created as `done`.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        created_by: DbId,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks
                (tenant_id, project_id, title, description, status, priority,
                 assignee_user_id, due_date, created_by, completed_at)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'todo'), COALESCE($6, 'medium'), $7, $8, $9,
                     CASE WHEN $5::TEXT = 'done' THEN NOW() END)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(tenant_id)
            .bind(input.project_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(input.assignee_user_id)
            .bind(input.due_date)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a task by ID within a tenant. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's tasks, optionally narrowed to one project, status, or
    /// assignee. Ordered by due date (undated last), then newest first.
    pub async fn list(
        pool: &PgPool,
        tenant_id: DbId,
        project_id: Option<DbId>,
        status: Option<&str>,
        assignee_user_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2::BIGINT IS NULL OR project_id = $2)
               AND ($3::TEXT IS NULL OR status = $3)
               AND ($4::BIGINT IS NULL OR assignee_user_id = $4)
             ORDER BY due_date ASC NULLS LAST, created_at DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(tenant_id)
            .bind(project_id)
            .bind(status)
            .bind(assignee_user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a task. Only non-`None` fields in `input` are applied.
    ///
    /// `completed_at` is written as given: the caller computes it from the
    /// status change so entering `done` stamps it and leaving `done` clears it.
    pub async fn update(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
        input: &UpdateTask,
        completed_at: Option<Timestamp>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                assignee_user_id = COALESCE($7, assignee_user_id),
                due_date = COALESCE($8, due_date),
                completed_at = $9
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(input.assignee_user_id)
            .bind(input.due_date)
            .bind(completed_at)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a task. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW()
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
