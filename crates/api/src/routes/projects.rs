//! Route definitions for projects and their tasks.

use axum::routing::get;
use axum::Router;

use crate::handlers::{projects, tasks};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                          -> list_projects
/// POST   /                          -> create_project (projects.write)
/// GET    /{id}                      -> get_project
/// PUT    /{id}                      -> update_project (projects.write)
/// DELETE /{id}                      -> delete_project (projects.write)
/// GET    /{id}/summary              -> project_summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list_projects).post(projects::create_project))
        .route(
            "/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/{id}/summary", get(projects::project_summary))
}

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /                          -> list_tasks (?project_id=&status=&assignee_user_id=)
/// POST   /                          -> create_task (projects.write)
/// GET    /{id}                      -> get_task
/// PUT    /{id}                      -> update_task (projects.write)
/// DELETE /{id}                      -> delete_task (projects.write)
/// ```
pub fn tasks_router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
}
