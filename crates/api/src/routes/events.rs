//! Route definitions for `/events`.

use axum::routing::get;
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// GET    /                          -> list_events (?prefix=)
/// POST   /                          -> publish_event (events.publish)
/// GET    /{id}                      -> get_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::publish_event))
        .route("/{id}", get(events::get_event))
}
