//! Per-tenant analytics.

use atrium_db::models::analytics::TenantOverview;
use atrium_db::repositories::AnalyticsRepo;
use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::tenant::TenantScope;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/analytics/overview
///
/// Headline counts across CRM, projects, HR, and content for the tenant.
pub async fn overview(
    State(state): State<AppState>,
    scope: TenantScope,
) -> AppResult<Json<DataResponse<TenantOverview>>> {
    let overview = AnalyticsRepo::tenant_overview(&state.pool, scope.tenant_id).await?;
    Ok(Json(DataResponse { data: overview }))
}
