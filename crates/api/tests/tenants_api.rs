//! HTTP-level integration tests for `/tenants`.

mod common;

use atrium_core::roles::{ROLE_ID_MEMBER, ROLE_ID_SUPER_ADMIN, ROLE_ID_TENANT_ADMIN};
use axum::http::StatusCode;
use common::{body_json, delete_auth, get_auth, post_json, post_json_auth, put_json_auth, TEST_PASSWORD};
use sqlx::PgPool;

fn new_tenant(slug: &str) -> serde_json::Value {
    serde_json::json!({ "name": "Globex Corporation", "slug": slug, "plan": "starter" })
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_super_admin_creates_tenant_with_admin(pool: PgPool) {
    common::seed_user(&pool, None, "root", ROLE_ID_SUPER_ADMIN).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "root@test.com").await;

    let mut body = new_tenant("globex");
    body["admin"] = serde_json::json!({
        "username": "hank",
        "email": "Hank@Globex.com",
        "password": TEST_PASSWORD,
    });
    let response = post_json_auth(app.clone(), "/api/v1/tenants", &token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let tenant_id = json["data"]["tenant"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["tenant"]["slug"], "globex");
    assert_eq!(json["data"]["tenant"]["plan"], "starter");
    assert_eq!(json["data"]["admin"]["role"], "tenant_admin");
    assert_eq!(json["data"]["admin"]["tenant_id"], tenant_id);

    // The new admin can log in with the normalized email.
    let login = serde_json::json!({ "email": "hank@globex.com", "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", login).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_slug_returns_409(pool: PgPool) {
    common::seed_user(&pool, None, "root", ROLE_ID_SUPER_ADMIN).await;
    common::seed_tenant(&pool, "globex").await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "root@test.com").await;

    let response = post_json_auth(app, "/api/v1/tenants", &token, new_tenant("globex")).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reserved_slug_is_rejected(pool: PgPool) {
    common::seed_user(&pool, None, "root", ROLE_ID_SUPER_ADMIN).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "root@test.com").await;

    let response = post_json_auth(app, "/api/v1/tenants", &token, new_tenant("admin")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// A failed admin insert must not leave an orphan tenant behind.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tenant_creation_is_atomic(pool: PgPool) {
    common::seed_user(&pool, None, "root", ROLE_ID_SUPER_ADMIN).await;
    let app = common::build_test_app(pool.clone());
    let token = common::login(&app, "root@test.com").await;

    let mut body = new_tenant("globex");
    body["admin"] = serde_json::json!({
        "username": "taken",
        "email": "root@test.com",
        "password": TEST_PASSWORD,
    });
    let response = post_json_auth(app, "/api/v1/tenants", &token, body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE slug = 'globex'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tenant_admin_cannot_create_tenant(pool: PgPool) {
    let tenant = common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, Some(tenant.id), "ada", ROLE_ID_TENANT_ADMIN).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "ada@test.com").await;

    let response = post_json_auth(app, "/api/v1/tenants", &token, new_tenant("globex")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Read and configure
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_shows_only_own_tenant(pool: PgPool) {
    let acme = common::seed_tenant(&pool, "acme").await;
    common::seed_tenant(&pool, "globex").await;
    common::seed_user(&pool, Some(acme.id), "ada", ROLE_ID_MEMBER).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "ada@test.com").await;

    let json = body_json(get_auth(app, "/api/v1/tenants", &token).await).await;

    let tenants = json["data"].as_array().unwrap();
    assert_eq!(tenants.len(), 1);
    assert_eq!(tenants[0]["id"], acme.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_other_tenant_is_not_found(pool: PgPool) {
    let acme = common::seed_tenant(&pool, "acme").await;
    let globex = common::seed_tenant(&pool, "globex").await;
    common::seed_user(&pool, Some(acme.id), "ada", ROLE_ID_TENANT_ADMIN).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "ada@test.com").await;

    let response = get_auth(app.clone(), &format!("/api/v1/tenants/{}", globex.id), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(app, &format!("/api/v1/tenants/{}", acme.id), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_settings_are_merged_on_update(pool: PgPool) {
    let acme = common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, Some(acme.id), "ada", ROLE_ID_TENANT_ADMIN).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "ada@test.com").await;
    let uri = format!("/api/v1/tenants/{}", acme.id);

    let first = serde_json::json!({ "settings": { "timezone": "UTC", "locale": "en" } });
    let response = put_json_auth(app.clone(), &uri, &token, first).await;
    assert_eq!(response.status(), StatusCode::OK);

    let second = serde_json::json!({ "settings": { "locale": "de" } });
    let json = body_json(put_json_auth(app, &uri, &token, second).await).await;

    assert_eq!(json["data"]["settings"]["timezone"], "UTC");
    assert_eq!(json["data"]["settings"]["locale"], "de");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_member_cannot_configure_tenant(pool: PgPool) {
    let acme = common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, Some(acme.id), "bob", ROLE_ID_MEMBER).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "bob@test.com").await;

    let body = serde_json::json!({ "name": "Renamed" });
    let response = put_json_auth(app, &format!("/api/v1/tenants/{}", acme.id), &token, body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Deactivate
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deactivated_tenant_blocks_its_users(pool: PgPool) {
    let acme = common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, None, "root", ROLE_ID_SUPER_ADMIN).await;
    common::seed_user(&pool, Some(acme.id), "ada", ROLE_ID_MEMBER).await;
    let app = common::build_test_app(pool);
    let root = common::login(&app, "root@test.com").await;
    let ada = common::login(&app, "ada@test.com").await;

    let response = delete_auth(app.clone(), &format!("/api/v1/tenants/{}", acme.id), &root).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Existing tokens lose access to tenant data.
    let response = get_auth(app.clone(), "/api/v1/customers", &ada).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // New logins are refused.
    let login = serde_json::json!({ "email": "ada@test.com", "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", login).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
