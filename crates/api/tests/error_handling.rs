//! Tests for `AppError` to HTTP response mapping.
//!
//! No server is needed: each case calls `IntoResponse` directly and checks
//! the status, the `code`, and the message in the JSON body.

use atrium_api::error::AppError;
use atrium_core::error::CoreError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_names_the_entity() {
    let (status, json) = error_to_response(AppError::not_found("Customer", 42)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Customer with id 42 not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("Lead score must be 0-100".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Lead score must be 0-100");
}

#[tokio::test]
async fn bad_request_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("Missing X-Tenant-Id".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn conflict_returns_409() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Conflict("Lead has already been converted".into()))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn auth_errors_keep_their_message() {
    let (status, json) = error_to_response(AppError::unauthorized("Invalid or expired token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "Invalid or expired token");

    let (status, json) = error_to_response(AppError::forbidden("Missing permission crm.write")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn rate_limited_returns_429_with_retry_after() {
    let response = AppError::RateLimited { retry_after_secs: 30 }.into_response();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get("retry-after").unwrap(), "30");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    for err in [
        AppError::InternalError("connection string postgres://secret".into()),
        AppError::Core(CoreError::Internal("hash failure".into())),
        AppError::Database(sqlx::Error::PoolTimedOut),
    ] {
        let (status, json) = error_to_response(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["error"], "An internal error occurred");
    }
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Database constraint violations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn constraint_violations_map_to_client_errors(pool: sqlx::PgPool) {
    sqlx::query("INSERT INTO tenants (name, slug) VALUES ('Acme', 'acme')")
        .execute(&pool)
        .await
        .unwrap();

    let duplicate = sqlx::query("INSERT INTO tenants (name, slug) VALUES ('Acme 2', 'acme')")
        .execute(&pool)
        .await
        .unwrap_err();
    let (status, json) = error_to_response(AppError::Database(duplicate)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("uq_tenants_slug"));

    let bad_plan = sqlx::query("INSERT INTO tenants (name, slug, plan) VALUES ('Globex', 'globex', 'platinum')")
        .execute(&pool)
        .await
        .unwrap_err();
    let (status, json) = error_to_response(AppError::Database(bad_plan)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let orphan = sqlx::query("INSERT INTO customers (tenant_id, name) VALUES (999999, 'Nobody')")
        .execute(&pool)
        .await
        .unwrap_err();
    let (status, json) = error_to_response(AppError::Database(orphan)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}
