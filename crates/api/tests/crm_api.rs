//! HTTP-level integration tests for customers, leads, and deals.

mod common;

use atrium_core::roles::{ROLE_ID_MANAGER, ROLE_ID_TENANT_ADMIN};
use axum::http::StatusCode;
use common::{body_json, get_auth, post_json_auth, put_json_auth};
use sqlx::PgPool;

async fn setup(pool: PgPool) -> (axum::Router, String) {
    let acme = common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, Some(acme.id), "ada", ROLE_ID_TENANT_ADMIN).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "ada@test.com").await;
    (app, token)
}

async fn create(app: &axum::Router, token: &str, uri: &str, body: serde_json::Value) -> serde_json::Value {
    let response = post_json_auth(app.clone(), uri, token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED, "POST {uri}");
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_customer_crud_and_search(pool: PgPool) {
    let (app, token) = setup(pool).await;

    let initech = create(&app, &token, "/api/v1/customers", serde_json::json!({ "name": "Initech", "email": "Sales@Initech.com" })).await;
    assert_eq!(initech["status"], "active");
    assert_eq!(initech["email"], "sales@initech.com");
    create(&app, &token, "/api/v1/customers", serde_json::json!({ "name": "Globex", "status": "prospect" })).await;

    let json = body_json(get_auth(app.clone(), "/api/v1/customers?search=init", &token).await).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Initech");

    let json = body_json(get_auth(app.clone(), "/api/v1/customers?status=prospect", &token).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/customers/{}", initech["id"]);
    let json = body_json(put_json_auth(app, &uri, &token, serde_json::json!({ "status": "inactive" })).await).await;
    assert_eq!(json["data"]["status"], "inactive");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_customer_with_bad_status_is_rejected(pool: PgPool) {
    let (app, token) = setup(pool).await;

    let response = post_json_auth(
        app,
        "/api/v1/customers",
        &token,
        serde_json::json!({ "name": "Initech", "status": "vip" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_convert_lead_creates_customer_and_deal(pool: PgPool) {
    let (app, token) = setup(pool).await;
    let lead = create(
        &app,
        &token,
        "/api/v1/leads",
        serde_json::json!({ "name": "Peter Gibbons", "email": "peter@initech.com", "company": "Initech", "status": "qualified" }),
    )
    .await;
    let uri = format!("/api/v1/leads/{}/convert", lead["id"]);

    let body = serde_json::json!({ "deal": { "title": "TPS rollout", "value_cents": 500_000 } });
    let response = post_json_auth(app.clone(), &uri, &token, body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["lead"]["status"], "converted");
    assert_eq!(data["lead"]["converted_customer_id"], data["customer"]["id"]);
    assert_eq!(data["customer"]["name"], "Initech");
    assert_eq!(data["deal"]["stage"], "qualification");
    assert_eq!(data["deal"]["currency"], "USD");
    assert_eq!(data["deal"]["customer_id"], data["customer"]["id"]);

    let response = post_json_auth(app, &uri, &token, body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lead_cannot_be_converted_through_update(pool: PgPool) {
    let (app, token) = setup(pool).await;
    let lead = create(&app, &token, "/api/v1/leads", serde_json::json!({ "name": "Peter Gibbons" })).await;

    let uri = format!("/api/v1/leads/{}", lead["id"]);
    let response = put_json_auth(app, &uri, &token, serde_json::json!({ "status": "converted" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lead_score_out_of_range(pool: PgPool) {
    let (app, token) = setup(pool).await;

    let response = post_json_auth(
        app,
        "/api/v1/leads",
        &token,
        serde_json::json!({ "name": "Peter Gibbons", "score": 140 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Deals
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deal_stage_defaults_probability(pool: PgPool) {
    let (app, token) = setup(pool).await;
    let deal = create(&app, &token, "/api/v1/deals", serde_json::json!({ "title": "Renewal", "value_cents": 10_000 })).await;
    assert_eq!(deal["stage"], "prospecting");
    assert_eq!(deal["probability"], 10);

    let uri = format!("/api/v1/deals/{}", deal["id"]);
    let json = body_json(put_json_auth(app.clone(), &uri, &token, serde_json::json!({ "stage": "negotiation" })).await).await;
    assert_eq!(json["data"]["probability"], 75);

    let json = body_json(
        put_json_auth(app, &uri, &token, serde_json::json!({ "stage": "proposal", "probability": 60 })).await,
    )
    .await;
    assert_eq!(json["data"]["probability"], 60);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_closed_deal_is_frozen(pool: PgPool) {
    let (app, token) = setup(pool).await;
    let deal = create(&app, &token, "/api/v1/deals", serde_json::json!({ "title": "Renewal" })).await;
    let uri = format!("/api/v1/deals/{}", deal["id"]);

    let response = put_json_auth(app.clone(), &uri, &token, serde_json::json!({ "stage": "closed_won" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["closed_at"].is_string());

    let response = put_json_auth(app, &uri, &token, serde_json::json!({ "stage": "proposal" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pipeline_summary(pool: PgPool) {
    let (app, token) = setup(pool).await;
    create(&app, &token, "/api/v1/deals", serde_json::json!({ "title": "A", "stage": "proposal", "value_cents": 10_000 })).await;
    create(&app, &token, "/api/v1/deals", serde_json::json!({ "title": "B", "stage": "closed_won", "value_cents": 30_000 })).await;
    create(&app, &token, "/api/v1/deals", serde_json::json!({ "title": "C", "stage": "closed_lost", "value_cents": 4_000 })).await;

    let response = get_auth(app, "/api/v1/deals/pipeline", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["stages"].as_array().unwrap().len(), 6);
    assert_eq!(data["open_value_cents"], 10_000);
    assert_eq!(data["weighted_open_value_cents"], 5_000);
    assert_eq!(data["won_value_cents"], 30_000);
    assert_eq!(data["win_rate"], 0.5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deal_rejects_foreign_owner(pool: PgPool) {
    let globex = common::seed_tenant(&pool, "globex").await;
    let hank = common::seed_user(&pool, Some(globex.id), "hank", ROLE_ID_MANAGER).await;
    let (app, token) = setup(pool).await;

    let response = post_json_auth(
        app,
        "/api/v1/deals",
        &token,
        serde_json::json!({ "title": "Renewal", "owner_user_id": hank.id }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Managers hold `crm.write` through their role.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_manager_can_write_crm(pool: PgPool) {
    let acme = common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, Some(acme.id), "mia", ROLE_ID_MANAGER).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "mia@test.com").await;

    create(&app, &token, "/api/v1/deals", serde_json::json!({ "title": "Upsell" })).await;
}
