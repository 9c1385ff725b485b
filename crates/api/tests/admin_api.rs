//! Integration tests for platform administration and the analytics overview.

mod common;

use atrium_core::roles::{ROLE_ID_MEMBER, ROLE_ID_SUPER_ADMIN, ROLE_ID_TENANT_ADMIN};
use axum::http::{Method, StatusCode};
use common::{body_json, get_auth, post_json_auth};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_system_status_for_super_admin(pool: PgPool) {
    common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, None, "root", ROLE_ID_SUPER_ADMIN).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "root@test.com").await;

    let response = get_auth(app, "/api/v1/admin/system-status", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["db_healthy"], true);
    assert_eq!(json["data"]["active_tenants"], 1);
    assert_eq!(json["data"]["ws_connections"], 0);
    assert!(json["data"]["version"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_system_status_rejects_tenant_admin(pool: PgPool) {
    let acme = common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, Some(acme.id), "ada", ROLE_ID_TENANT_ADMIN).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "ada@test.com").await;

    let response = get_auth(app, "/api/v1/admin/system-status", &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_overview_counts_tenant_records(pool: PgPool) {
    let acme = common::seed_tenant(&pool, "acme").await;
    let globex = common::seed_tenant(&pool, "globex").await;
    common::seed_user(&pool, Some(acme.id), "ada", ROLE_ID_TENANT_ADMIN).await;
    common::seed_user(&pool, Some(acme.id), "bob", ROLE_ID_MEMBER).await;
    common::seed_user(&pool, Some(globex.id), "hank", ROLE_ID_TENANT_ADMIN).await;
    let app = common::build_test_app(pool);
    let ada = common::login(&app, "ada@test.com").await;
    let bob = common::login(&app, "bob@test.com").await;
    let hank = common::login(&app, "hank@test.com").await;

    post_json_auth(app.clone(), "/api/v1/customers", &ada, serde_json::json!({ "name": "Initech" })).await;
    post_json_auth(app.clone(), "/api/v1/leads", &ada, serde_json::json!({ "name": "Peter" })).await;
    post_json_auth(
        app.clone(),
        "/api/v1/deals",
        &ada,
        serde_json::json!({ "title": "Renewal", "value_cents": 2500 }),
    )
    .await;
    post_json_auth(
        app.clone(),
        "/api/v1/deals",
        &ada,
        serde_json::json!({ "title": "Upsell", "value_cents": 900, "stage": "closed_won" }),
    )
    .await;
    post_json_auth(app.clone(), "/api/v1/customers", &hank, serde_json::json!({ "name": "Globex Corp" })).await;

    // Any tenant member may read the overview.
    let response = get_auth(app.clone(), "/api/v1/analytics/overview", &bob).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["customers"], 1);
    assert_eq!(data["leads"], 1);
    assert_eq!(data["open_leads"], 1);
    assert_eq!(data["open_deals"], 1);
    assert_eq!(data["open_pipeline_cents"], 2500);
    assert_eq!(data["won_deals"], 1);
    assert_eq!(data["published_content"], 0);

    let response = common::send(
        app,
        Method::GET,
        "/api/v1/analytics/overview",
        Some(&hank),
        None,
        None,
    )
    .await;
    assert_eq!(body_json(response).await["data"]["customers"], 1);
}
