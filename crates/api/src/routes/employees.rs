//! Route definitions for the `/employees` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::employees;
use crate::state::AppState;

/// Routes mounted at `/employees`.
///
/// ```text
/// GET    /                          -> list_employees
/// POST   /                          -> create_employee (hr.write)
/// GET    /{id}                      -> get_employee
/// PUT    /{id}                      -> update_employee (hr.write)
/// DELETE /{id}                      -> delete_employee (hr.write)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(employees::list_employees).post(employees::create_employee))
        .route(
            "/{id}",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
}
