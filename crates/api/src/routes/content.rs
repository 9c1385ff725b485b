//! Route definitions for the `/content` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::content;
use crate::state::AppState;

/// Routes mounted at `/content`.
///
/// ```text
/// GET    /                          -> list_content
/// POST   /                          -> create_content (content.write)
/// GET    /{id}                      -> get_content
/// PUT    /{id}                      -> update_content (content.write)
/// DELETE /{id}                      -> delete_content (content.write)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(content::list_content).post(content::create_content))
        .route(
            "/{id}",
            get(content::get_content)
                .put(content::update_content)
                .delete(content::delete_content),
        )
}
