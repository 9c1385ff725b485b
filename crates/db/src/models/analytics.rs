//! Read-only aggregates for the analytics overview.

use serde::Serialize;
use sqlx::FromRow;

/// Per-tenant headline counts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TenantOverview {
    pub customers: i64,
    pub leads: i64,
    pub open_leads: i64,
    pub open_deals: i64,
    pub open_pipeline_cents: i64,
    pub won_deals: i64,
    pub projects: i64,
    pub active_projects: i64,
    pub open_tasks: i64,
    pub overdue_tasks: i64,
    pub active_employees: i64,
    pub published_content: i64,
}
