//! Route definitions for the `/users` resource.
//!
//! Tenant-scoped; super admins pick the tenant with `X-Tenant-Id`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{permissions, users};
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /                          -> list_users
/// POST   /                          -> create_user (users.manage)
/// GET    /{id}                      -> get_user
/// PUT    /{id}                      -> update_user (users.manage)
/// DELETE /{id}                      -> delete_user (users.manage)
/// POST   /{id}/reset-password       -> reset_password (users.manage)
/// GET    /{id}/permissions          -> user_permissions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/{id}/reset-password", post(users::reset_password))
        .route("/{id}/permissions", get(permissions::user_permissions))
}
