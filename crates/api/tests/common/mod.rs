#![allow(dead_code)]

use std::sync::Arc;
use std::time::Instant;

use atrium_api::auth::jwt::JwtConfig;
use atrium_api::auth::password::hash_password;
use atrium_api::config::{LogFormat, ServerConfig};
use atrium_api::policy::PermissionGate;
use atrium_api::rate_limit::LoginRateLimiter;
use atrium_api::router::build_app_router;
use atrium_api::state::AppState;
use atrium_api::ws::WsManager;
use atrium_core::types::DbId;
use atrium_db::models::tenant::{CreateTenant, Tenant};
use atrium_db::models::user::{CreateUser, User};
use atrium_db::repositories::{TenantRepo, UserRepo};
use atrium_events::{EventBus, EventRelay};
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Password given to every seeded user.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a generous login rate limit so lockout tests are not throttled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        db_max_connections: 5,
        login_rate_limit_per_min: 100,
        trust_proxy_headers: false,
        session_cleanup_interval_secs: 3600,
        log_format: LogFormat::Text,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        bootstrap_admin: None,
    }
}

/// Application state over `pool` with a fresh bus and socket manager.
pub fn test_state(pool: PgPool, config: ServerConfig) -> AppState {
    let bus = Arc::new(EventBus::default());
    AppState {
        events: EventRelay::new(pool.clone(), bus),
        gate: PermissionGate::new(pool.clone()),
        login_limiter: Arc::new(LoginRateLimiter::per_minute(config.login_rate_limit_per_min)),
        pool,
        config: Arc::new(config),
        ws_manager: Arc::new(WsManager::new()),
        started_at: Instant::now(),
    }
}

/// Build the full application router, using the same middleware stack as
/// `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    build_app_router(test_state(pool, config.clone()), &config)
}

/// Build the router around an existing state, so a test can keep handles to
/// the bus or the socket manager.
pub fn build_app_with_state(state: AppState) -> Router {
    let config = state.config.as_ref().clone();
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_tenant(pool: &PgPool, slug: &str) -> Tenant {
    TenantRepo::create(
        pool,
        &CreateTenant {
            name: format!("Tenant {slug}"),
            slug: slug.to_string(),
            plan: None,
            settings: None,
        },
    )
    .await
    .expect("tenant creation should succeed")
}

/// Insert a user with [`TEST_PASSWORD`]. The email is `{username}@test.com`.
pub async fn seed_user(
    pool: &PgPool,
    tenant_id: Option<DbId>,
    username: &str,
    role_id: DbId,
) -> User {
    let input = CreateUser {
        tenant_id,
        username: username.to_string(),
        email: format!("{username}@test.com"),
        display_name: None,
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role_id,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Log in through the API and return the access token.
pub async fn login(app: &Router, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
    let response = post_json(app.clone(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK, "login for {email} failed");
    let json = body_json(response).await;
    json["data"]["access_token"]
        .as_str()
        .expect("access_token must be a string")
        .to_string()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Send a request with optional bearer token, tenant header, and JSON body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    tenant_id: Option<DbId>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    if let Some(tenant_id) = tenant_id {
        builder = builder.header("x-tenant-id", tenant_id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None, Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), None, Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as UTF-8 text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
