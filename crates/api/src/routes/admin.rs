//! Route definitions for `/admin` and `/analytics`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{admin, analytics};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /system-status             -> system_status (super admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/system-status", get(admin::system_status))
}

/// Routes mounted at `/analytics`.
///
/// ```text
/// GET    /overview                  -> overview
/// ```
pub fn analytics_router() -> Router<AppState> {
    Router::new().route("/overview", get(analytics::overview))
}
