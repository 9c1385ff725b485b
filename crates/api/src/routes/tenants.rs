//! Route definitions for the `/tenants` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::tenants;
use crate::state::AppState;

/// Routes mounted at `/tenants`.
///
/// ```text
/// GET    /                          -> list_tenants
/// POST   /                          -> create_tenant (tenants.manage)
/// GET    /{id}                      -> get_tenant
/// PUT    /{id}                      -> update_tenant (tenant.configure)
/// DELETE /{id}                      -> delete_tenant (tenants.manage)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tenants::list_tenants).post(tenants::create_tenant))
        .route(
            "/{id}",
            get(tenants::get_tenant)
                .put(tenants::update_tenant)
                .delete(tenants::delete_tenant),
        )
}
