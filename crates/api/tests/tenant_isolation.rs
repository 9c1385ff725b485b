//! Tenant isolation across the tenant-scoped resources.
//!
//! Data belonging to one tenant must be invisible to every other tenant:
//! lists omit it, direct lookups report 404, and the tenant header cannot be
//! used to jump tenants.

mod common;

use atrium_core::roles::{ROLE_ID_SUPER_ADMIN, ROLE_ID_TENANT_ADMIN};
use axum::http::{Method, StatusCode};
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth};
use sqlx::PgPool;

struct TwoTenants {
    app: axum::Router,
    acme_id: i64,
    acme_token: String,
    globex_token: String,
}

async fn setup(pool: PgPool) -> TwoTenants {
    let acme = common::seed_tenant(&pool, "acme").await;
    let globex = common::seed_tenant(&pool, "globex").await;
    common::seed_user(&pool, Some(acme.id), "ada", ROLE_ID_TENANT_ADMIN).await;
    common::seed_user(&pool, Some(globex.id), "hank", ROLE_ID_TENANT_ADMIN).await;
    let app = common::build_test_app(pool);
    let acme_token = common::login(&app, "ada@test.com").await;
    let globex_token = common::login(&app, "hank@test.com").await;
    TwoTenants {
        app,
        acme_id: acme.id,
        acme_token,
        globex_token,
    }
}

/// Create a row as acme and assert globex can neither list, read, update,
/// nor delete it.
async fn assert_isolated(t: &TwoTenants, collection: &str, body: serde_json::Value) {
    let response = post_json_auth(t.app.clone(), collection, &t.acme_token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED, "create {collection}");
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let item = format!("{collection}/{id}");

    let json = body_json(get_auth(t.app.clone(), collection, &t.globex_token).await).await;
    assert!(
        json["data"].as_array().unwrap().iter().all(|row| row["id"] != id),
        "{collection} leaked into another tenant's list"
    );

    let response = get_auth(t.app.clone(), &item, &t.globex_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {item}");

    let response = put_json_auth(t.app.clone(), &item, &t.globex_token, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND, "PUT {item}");

    let response = delete_auth(t.app.clone(), &item, &t.globex_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND, "DELETE {item}");

    // Still there for its owner.
    let response = get_auth(t.app.clone(), &item, &t.acme_token).await;
    assert_eq!(response.status(), StatusCode::OK, "owner GET {item}");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_crm_rows_are_isolated(pool: PgPool) {
    let t = setup(pool).await;

    assert_isolated(&t, "/api/v1/customers", serde_json::json!({ "name": "Initech" })).await;
    assert_isolated(&t, "/api/v1/leads", serde_json::json!({ "name": "Peter Gibbons" })).await;
    assert_isolated(&t, "/api/v1/deals", serde_json::json!({ "title": "TPS rollout" })).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_workspace_rows_are_isolated(pool: PgPool) {
    let t = setup(pool).await;

    assert_isolated(&t, "/api/v1/projects", serde_json::json!({ "name": "Website" })).await;
    assert_isolated(
        &t,
        "/api/v1/employees",
        serde_json::json!({ "first_name": "Milton", "last_name": "Waddams", "email": "milton@acme.com" }),
    )
    .await;
    assert_isolated(&t, "/api/v1/content", serde_json::json!({ "title": "Launch notes" })).await;
}

/// A task cannot be attached to another tenant's project.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_task_cannot_reference_foreign_project(pool: PgPool) {
    let t = setup(pool).await;

    let response = post_json_auth(
        t.app.clone(),
        "/api/v1/projects",
        &t.acme_token,
        serde_json::json!({ "name": "Website" }),
    )
    .await;
    let project_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        t.app.clone(),
        "/api/v1/tasks",
        &t.globex_token,
        serde_json::json!({ "project_id": project_id, "title": "Sneak in" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tenant_header_cannot_switch_tenant(pool: PgPool) {
    let t = setup(pool).await;

    let response = common::send(
        t.app.clone(),
        Method::GET,
        "/api/v1/customers",
        Some(&t.globex_token),
        Some(t.acme_id),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_super_admin_reads_any_tenant_via_header(pool: PgPool) {
    common::seed_user(&pool, None, "root", ROLE_ID_SUPER_ADMIN).await;
    let t = setup(pool).await;
    let root = common::login(&t.app, "root@test.com").await;

    post_json_auth(
        t.app.clone(),
        "/api/v1/customers",
        &t.acme_token,
        serde_json::json!({ "name": "Initech" }),
    )
    .await;

    let response = common::send(
        t.app.clone(),
        Method::GET,
        "/api/v1/customers",
        Some(&root),
        Some(t.acme_id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    // An unknown tenant is a 404, not an empty list.
    let response = common::send(
        t.app.clone(),
        Method::GET,
        "/api/v1/customers",
        Some(&root),
        Some(999_999),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
