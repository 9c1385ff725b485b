//! Route definitions for the CRM resources: customers, leads, and deals.
//!
//! Reads need tenant membership; writes need `crm.write`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{customers, deals, leads};
use crate::state::AppState;

/// Routes mounted at `/customers`.
///
/// ```text
/// GET    /                          -> list_customers
/// POST   /                          -> create_customer
/// GET    /{id}                      -> get_customer
/// PUT    /{id}                      -> update_customer
/// DELETE /{id}                      -> delete_customer
/// ```
pub fn customers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::list_customers).post(customers::create_customer))
        .route(
            "/{id}",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
}

/// Routes mounted at `/leads`.
///
/// ```text
/// GET    /                          -> list_leads
/// POST   /                          -> create_lead
/// GET    /{id}                      -> get_lead
/// PUT    /{id}                      -> update_lead
/// DELETE /{id}                      -> delete_lead
/// POST   /{id}/convert              -> convert_lead
/// ```
pub fn leads_router() -> Router<AppState> {
    Router::new()
        .route("/", get(leads::list_leads).post(leads::create_lead))
        .route(
            "/{id}",
            get(leads::get_lead)
                .put(leads::update_lead)
                .delete(leads::delete_lead),
        )
        .route("/{id}/convert", post(leads::convert_lead))
}

/// Routes mounted at `/deals`.
///
/// ```text
/// GET    /                          -> list_deals
/// POST   /                          -> create_deal
/// GET    /pipeline                  -> pipeline
/// GET    /{id}                      -> get_deal
/// PUT    /{id}                      -> update_deal
/// DELETE /{id}                      -> delete_deal
/// ```
pub fn deals_router() -> Router<AppState> {
    Router::new()
        .route("/", get(deals::list_deals).post(deals::create_deal))
        .route("/pipeline", get(deals::pipeline))
        .route(
            "/{id}",
            get(deals::get_deal)
                .put(deals::update_deal)
                .delete(deals::delete_deal),
        )
}
