//! Read-only aggregate queries for the analytics overview.

use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::analytics::TenantOverview;

/// Provides tenant-scoped headline counts.
pub struct AnalyticsRepo;

impl AnalyticsRepo {
    /// Compute the overview in one round trip using scalar subqueries.
    pub async fn tenant_overview(
        pool: &PgPool,
        tenant_id: DbId,
    ) -> Result<TenantOverview, sqlx::Error> {
        sqlx::query_as::<_, TenantOverview>(
            "SELECT
                (SELECT COUNT(*) FROM customers
                  WHERE tenant_id = $1 AND deleted_at IS NULL) AS customers,
                (SELECT COUNT(*) FROM leads
                  WHERE tenant_id = $1 AND deleted_at IS NULL) AS leads,
                (SELECT COUNT(*) FROM leads
                  WHERE tenant_id = $1 AND deleted_at IS NULL
                    AND status NOT IN ('converted', 'unqualified')) AS open_leads,
                (SELECT COUNT(*) FROM deals
                  WHERE tenant_id = $1 AND deleted_at IS NULL
                    AND stage NOT IN ('closed_won', 'closed_lost')) AS open_deals,
                (SELECT COALESCE(SUM(value_cents), 0)::BIGINT FROM deals
                  WHERE tenant_id = $1 AND deleted_at IS NULL
                    AND stage NOT IN ('closed_won', 'closed_lost')) AS open_pipeline_cents,
                (SELECT COUNT(*) FROM deals
                  WHERE tenant_id = $1 AND deleted_at IS NULL
                    AND stage = 'closed_won') AS won_deals,
                (SELECT COUNT(*) FROM projects
                  WHERE tenant_id = $1 AND deleted_at IS NULL) AS projects,
                (SELECT COUNT(*) FROM projects
                  WHERE tenant_id = $1 AND deleted_at IS NULL
                    AND status = 'active') AS active_projects,
                (SELECT COUNT(*) FROM tasks
                  WHERE tenant_id = $1 AND deleted_at IS NULL
                    AND status <> 'done') AS open_tasks,
                (SELECT COUNT(*) FROM tasks
                  WHERE tenant_id = $1 AND deleted_at IS NULL
                    AND status <> 'done' AND due_date < CURRENT_DATE) AS overdue_tasks,
                (SELECT COUNT(*) FROM employees
                  WHERE tenant_id = $1 AND deleted_at IS NULL
                    AND employment_status = 'active') AS active_employees,
                (SELECT COUNT(*) FROM content_items
                  WHERE tenant_id = $1 AND deleted_at IS NULL
                    AND status = 'published') AS published_content",
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await
    }
}
