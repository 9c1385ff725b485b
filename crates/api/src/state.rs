use std::sync::Arc;
use std::time::Instant;

use atrium_events::EventRelay;

use crate::config::ServerConfig;
use crate::policy::PermissionGate;
use crate::rate_limit::LoginRateLimiter;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything inside is an `Arc`, a pool handle, or `Copy`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: atrium_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Persists events and fans them out on the in-process bus.
    pub events: EventRelay,
    pub gate: PermissionGate,
    pub login_limiter: Arc<LoginRateLimiter>,
    /// Process start, for the uptime in system status.
    pub started_at: Instant,
}
