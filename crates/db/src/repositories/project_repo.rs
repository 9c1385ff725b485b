//! Repository for the `projects` table.

use atrium_core::projects::TaskCounts;
use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, tenant_id, name, description, status, start_date, due_date, \
                        owner_user_id, created_by, created_at, updated_at";

/// Provides tenant-scoped CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// If `status` is `None` in the input, defaults to `planning`.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        created_by: DbId,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects
                (tenant_id, name, description, status, start_date, due_date, owner_user_id, created_by)
             VALUES ($1, $2, $3, COALESCE($4, 'planning'), $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(tenant_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .bind(input.start_date)
            .bind(input.due_date)
            .bind(input.owner_user_id)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a project by ID within a tenant. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's projects ordered by most recently created first.
    pub async fn list(
        pool: &PgPool,
        tenant_id: DbId,
        status: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::TEXT IS NULL OR name ILIKE $3)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(tenant_id)
            .bind(status)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no live row with the given `id` exists in the tenant.
    pub async fn update(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                start_date = COALESCE($6, start_date),
                due_date = COALESCE($7, due_date),
                owner_user_id = COALESCE($8, owner_user_id)
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .bind(input.start_date)
            .bind(input.due_date)
            .bind(input.owner_user_id)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a project and its tasks. Returns `true` if the project was
    /// marked deleted.
    pub async fn soft_delete(pool: &PgPool, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW()
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            sqlx::query(
                "UPDATE tasks SET deleted_at = NOW()
                 WHERE project_id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
            )
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count live tasks of a project by status, plus how many are overdue.
    pub async fn task_counts(
        pool: &PgPool,
        tenant_id: DbId,
        project_id: DbId,
    ) -> Result<(TaskCounts, i64), sqlx::Error> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            "SELECT status,
                    COUNT(*)::BIGINT,
                    COUNT(*) FILTER (WHERE due_date < CURRENT_DATE AND status <> 'done')::BIGINT
             FROM tasks
             WHERE tenant_id = $1 AND project_id = $2 AND deleted_at IS NULL
             GROUP BY status",
        )
        .bind(tenant_id)
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        let mut counts = TaskCounts::default();
        let mut overdue = 0;
        for (status, count, late) in rows {
            counts.add(&status, count);
            overdue += late;
        }
        Ok((counts, overdue))
    }
}
