pub mod admin;
pub mod audit;
pub mod auth;
pub mod content;
pub mod crm;
pub mod employees;
pub mod events;
pub mod health;
pub mod notifications;
pub mod permissions;
pub mod projects;
pub mod tenants;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                              WebSocket (?token=)
///
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout
/// /auth/me                                         current user + permissions
///
/// /tenants                                         list, create
/// /tenants/{id}                                    get, update, deactivate
///
/// /users                                           list, create
/// /users/{id}                                      get, update, delete
/// /users/{id}/reset-password                       reset password
/// /users/{id}/permissions                          effective permissions
///
/// /permissions                                     catalogue
/// /permissions/grants                              grant
/// /permissions/grants/{id}                         revoke
///
/// /customers, /leads, /deals                       CRM CRUD
/// /leads/{id}/convert                              convert lead
/// /deals/pipeline                                  pipeline summary
///
/// /projects                                        list, create
/// /projects/{id}                                   get, update, delete
/// /projects/{id}/summary                           task progress
/// /tasks                                           list, create
/// /tasks/{id}                                      get, update, delete
///
/// /employees                                       HR CRUD
/// /content                                         content CRUD
///
/// /audit-logs                                      query
/// /audit-logs/export                               export (json, csv)
/// /audit-logs/integrity-check                      verify hash chain
///
/// /events                                          list, publish
/// /events/{id}                                     get
/// /notifications                                   list, read, read-all
///
/// /analytics/overview                              tenant counts
/// /admin/system-status                             process + pool status
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        // Authentication routes (login, refresh, logout, me).
        .nest("/auth", auth::router())
        // Platform administration.
        .nest("/tenants", tenants::router())
        .nest("/users", users::router())
        .nest("/permissions", permissions::router())
        .nest("/admin", admin::router())
        // CRM.
        .nest("/customers", crm::customers_router())
        .nest("/leads", crm::leads_router())
        .nest("/deals", crm::deals_router())
        // Projects and tasks.
        .nest("/projects", projects::router())
        .nest("/tasks", projects::tasks_router())
        // HR and content.
        .nest("/employees", employees::router())
        .nest("/content", content::router())
        // Audit, events, notifications, analytics.
        .nest("/audit-logs", audit::router())
        .nest("/events", events::router())
        .nest("/notifications", notifications::router())
        .nest("/analytics", admin::analytics_router())
}
