//! Platform administration endpoints (super admin only).

use atrium_db::repositories::TenantRepo;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireSuperAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Snapshot of process and pool health.
#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub uptime_secs: u64,
    pub db_healthy: bool,
    /// Open connections in the pool (idle + in use).
    pub db_pool_size: u32,
    pub db_pool_idle: usize,
    pub ws_connections: usize,
    pub ws_online_users: usize,
    pub event_bus_subscribers: usize,
    pub active_tenants: i64,
}

/// GET /api/v1/admin/system-status
pub async fn system_status(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
) -> AppResult<Json<DataResponse<SystemStatus>>> {
    let db_healthy = atrium_db::health_check(&state.pool).await.is_ok();
    let active_tenants = TenantRepo::count_active(&state.pool).await?;

    Ok(Json(DataResponse {
        data: SystemStatus {
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: state.started_at.elapsed().as_secs(),
            db_healthy,
            db_pool_size: state.pool.size(),
            db_pool_idle: state.pool.num_idle(),
            ws_connections: state.ws_manager.connection_count().await,
            ws_online_users: state.ws_manager.online_user_count().await,
            event_bus_subscribers: state.events.bus().subscriber_count(),
            active_tenants,
        },
    }))
}
