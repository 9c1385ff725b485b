//! Route definitions for `/audit-logs`.

use axum::routing::get;
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

/// Routes mounted at `/audit-logs`.
///
/// ```text
/// GET    /                          -> query_audit_logs (audit.read)
/// GET    /export                    -> export_audit_logs (audit.read)
/// GET    /integrity-check           -> check_integrity (super admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(audit::query_audit_logs))
        .route("/export", get(audit::export_audit_logs))
        .route("/integrity-check", get(audit::check_integrity))
}
