//! Integration tests for the audit trail: recording, querying, export, and
//! hash-chain verification.

mod common;

use atrium_core::roles::{ROLE_ID_MEMBER, ROLE_ID_SUPER_ADMIN, ROLE_ID_TENANT_ADMIN};
use axum::http::StatusCode;
use common::{body_json, body_text, get_auth, post_json_auth};
use sqlx::PgPool;

async fn setup(pool: PgPool) -> (axum::Router, String, i64) {
    let acme = common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, Some(acme.id), "ada", ROLE_ID_TENANT_ADMIN).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "ada@test.com").await;
    (app, token, acme.id)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mutation_writes_audit_entry(pool: PgPool) {
    let (app, token, tenant_id) = setup(pool).await;

    let response = post_json_auth(app.clone(), "/api/v1/customers", &token, serde_json::json!({ "name": "Initech" })).await;
    let customer_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/v1/audit-logs?entity_type=customer&entity_id={customer_id}");
    let response = get_auth(app, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    let entry = &json["data"]["items"][0];
    assert_eq!(entry["action_type"], "entity_create");
    assert_eq!(entry["tenant_id"], tenant_id);
    assert!(entry["request_id"].is_string());
    assert!(entry["integrity_hash"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_attempts_are_audited(pool: PgPool) {
    let (app, token, _) = setup(pool).await;

    let bad = serde_json::json!({ "email": "ada@test.com", "password": "definitely-wrong" });
    common::post_json(app.clone(), "/api/v1/auth/login", bad).await;

    let json = body_json(get_auth(app, "/api/v1/audit-logs?action_type=login", &token).await).await;
    let items = json["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let outcomes: Vec<bool> = items
        .iter()
        .map(|i| i["details_json"]["success"].as_bool().unwrap())
        .collect();
    assert!(outcomes.contains(&true));
    assert!(outcomes.contains(&false));
}

/// Password values never reach the audit details.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sensitive_fields_are_redacted(pool: PgPool) {
    let (app, token, _) = setup(pool.clone()).await;

    let body = serde_json::json!({ "username": "carol", "email": "carol@acme.com", "password": common::TEST_PASSWORD });
    post_json_auth(app, "/api/v1/users", &token, body).await;

    let leaked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_logs WHERE details_json::text LIKE '%' || $1 || '%'",
    )
    .bind(common::TEST_PASSWORD)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(leaked, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_member_cannot_read_audit(pool: PgPool) {
    let acme = common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, Some(acme.id), "bob", ROLE_ID_MEMBER).await;
    let app = common::build_test_app(pool);
    let token = common::login(&app, "bob@test.com").await;

    let response = get_auth(app, "/api/v1/audit-logs", &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_audit_is_tenant_scoped(pool: PgPool) {
    let globex = common::seed_tenant(&pool, "globex").await;
    common::seed_user(&pool, Some(globex.id), "hank", ROLE_ID_TENANT_ADMIN).await;
    let (app, token, _) = setup(pool).await;
    let hank = common::login(&app, "hank@test.com").await;

    post_json_auth(app.clone(), "/api/v1/customers", &token, serde_json::json!({ "name": "Initech" })).await;

    let json = body_json(get_auth(app, "/api/v1/audit-logs?entity_type=customer", &hank).await).await;
    assert_eq!(json["data"]["total"], 0);
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_csv_export(pool: PgPool) {
    let (app, token, _) = setup(pool).await;
    post_json_auth(app.clone(), "/api/v1/customers", &token, serde_json::json!({ "name": "Initech, Inc." })).await;

    let response = get_auth(app, "/api/v1/audit-logs/export?format=csv", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let csv = body_text(response).await;
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("id,timestamp,user_id"));
    assert!(csv.contains("entity_create"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_json_export_and_bad_format(pool: PgPool) {
    let (app, token, _) = setup(pool).await;

    let response = get_auth(app.clone(), "/api/v1/audit-logs/export?format=json", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"].is_array());

    let response = get_auth(app, "/api/v1/audit-logs/export?format=xml", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_integrity_check_detects_tampering(pool: PgPool) {
    common::seed_user(&pool, None, "root", ROLE_ID_SUPER_ADMIN).await;
    let (app, token, _) = setup(pool.clone()).await;
    let root = common::login(&app, "root@test.com").await;
    post_json_auth(app.clone(), "/api/v1/customers", &token, serde_json::json!({ "name": "Initech" })).await;

    let json = body_json(get_auth(app.clone(), "/api/v1/audit-logs/integrity-check", &root).await).await;
    assert_eq!(json["data"]["chain_valid"], true);
    assert!(json["data"]["verified_entries"].as_i64().unwrap() >= 3);

    // Rows are immutable through normal writes, so bypass the guard trigger.
    sqlx::query("ALTER TABLE audit_logs DISABLE TRIGGER trg_audit_logs_immutable")
        .execute(&pool)
        .await
        .unwrap();
    let tampered: i64 = sqlx::query_scalar(
        "UPDATE audit_logs SET action_type = 'entity_delete'
         WHERE id = (SELECT MIN(id) FROM audit_logs WHERE action_type = 'entity_create')
         RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let json = body_json(get_auth(app, "/api/v1/audit-logs/integrity-check", &root).await).await;
    assert_eq!(json["data"]["chain_valid"], false);
    assert_eq!(json["data"]["first_break"], tampered);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_audit_rows_cannot_be_updated(pool: PgPool) {
    let (_app, _token, _) = setup(pool.clone()).await;

    let result = sqlx::query("UPDATE audit_logs SET action_type = 'x'")
        .execute(&pool)
        .await;

    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_integrity_check_requires_super_admin(pool: PgPool) {
    let (app, token, _) = setup(pool).await;

    let response = get_auth(app, "/api/v1/audit-logs/integrity-check", &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
