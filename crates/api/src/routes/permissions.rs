//! Route definitions for `/permissions`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::permissions;
use crate::state::AppState;

/// Routes mounted at `/permissions`.
///
/// ```text
/// GET    /                          -> list_catalog
/// POST   /grants                    -> grant_permission (permissions.grant)
/// DELETE /grants/{id}               -> revoke_permission (permissions.grant)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(permissions::list_catalog))
        .route("/grants", post(permissions::grant_permission))
        .route("/grants/{id}", delete(permissions::revoke_permission))
}
