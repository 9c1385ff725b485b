//! Handlers for the `/auth` resource (login, refresh, logout, me).

use atrium_core::audit::{action_types, entity_types};
use atrium_core::permissions::Permission;
use atrium_core::types::DbId;
use atrium_core::users::normalize_email;
use atrium_db::models::session::CreateSession;
use atrium_db::models::user::{User, UserResponse};
use atrium_db::repositories::{SessionRepo, TenantRepo, UserRepo};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit_trail::AuditRecorder;
use crate::auth::jwt::{generate_access_token, hash_refresh_token, RefreshToken};
use crate::auth::password::{verify_decoy, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::principal::Principal;
use crate::middleware::request_meta::RequestMeta;
use crate::rate_limit::LoginRateLimiter;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
pub const LOCK_DURATION_MINS: i64 = 15;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Response of `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    /// Effective permissions in the user's home tenant (all of them for
    /// platform administrators).
    pub permissions: Vec<Permission>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let email = normalize_email(&input.email);

    // 1. Rate limit per client IP + email.
    let key = LoginRateLimiter::key(meta.ip_address.as_deref(), &email);
    if let Err(retry_after) = state.login_limiter.check(&key) {
        tracing::warn!(email = %email, ip = ?meta.ip_address, "Login rate limit exceeded");
        return Err(AppError::RateLimited {
            retry_after_secs: retry_after.as_secs().max(1),
        });
    }

    // 2. Find user by email.
    let Some(user) = UserRepo::find_by_email(&state.pool, &email).await? else {
        verify_decoy(&input.password);
        record_login(&state, &meta, None, None, false, json!({ "email": email, "reason": "unknown_email" })).await;
        return Err(AppError::unauthorized("Invalid email or password"));
    };

    // 3. Account state.
    if !user.is_active {
        record_login(&state, &meta, user.tenant_id, Some(user.id), false, json!({ "reason": "inactive" })).await;
        return Err(AppError::forbidden("Account is deactivated"));
    }

    if user.is_locked_at(Utc::now()) {
        record_login(&state, &meta, user.tenant_id, Some(user.id), false, json!({ "reason": "locked" })).await;
        return Err(AppError::forbidden(
            "Account is temporarily locked. Try again later.",
        ));
    }

    // 4. Verify password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let failures = UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if failures >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
            tracing::warn!(user_id = user.id, failures, "Account locked after failed logins");
        }
        record_login(
            &state,
            &meta,
            user.tenant_id,
            Some(user.id),
            false,
            json!({ "reason": "bad_password", "failed_attempts": failures }),
        )
        .await;
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    // 5. Tenant must be active.
    ensure_tenant_active(&state, &user).await?;

    // 6. Success: reset counters, issue tokens.
    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let response = create_auth_response(&state, &meta, &user, None).await?;

    record_login(&state, &meta, user.tenant_id, Some(user.id), true, json!({})).await;
    tracing::info!(user_id = user.id, tenant_id = ?user.tenant_id, "User logged in");

    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens. The old
/// session is revoked (token rotation).
pub async fn refresh(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::find_live_by_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token"))?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

    if !user.is_active {
        return Err(AppError::forbidden("Account is deactivated"));
    }
    ensure_tenant_active(&state, &user).await?;

    let response = create_auth_response(&state, &meta, &user, Some(session.id)).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/logout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    meta: RequestMeta,
    auth_user: AuthUser,
) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;

    AuditRecorder::new(&state.pool, &meta, auth_user.tenant_id, Some(auth_user.user_id))
        .record(
            action_types::LOGOUT,
            entity_types::USER,
            Some(auth_user.user_id),
            json!({ "revoked_sessions": revoked }),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let user = UserRepo::find_response(&state.pool, principal.user_id())
        .await?
        .ok_or(AppError::not_found("User", principal.user_id()))?;
    let permissions = principal.profile.effective(principal.profile.home_tenant_id);

    Ok(Json(DataResponse {
        data: MeResponse { user, permissions },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_tenant_active(state: &AppState, user: &User) -> AppResult<()> {
    if let Some(tenant_id) = user.tenant_id {
        if !TenantRepo::is_active(&state.pool, tenant_id).await? {
            return Err(AppError::forbidden("Tenant is inactive"));
        }
    }
    Ok(())
}

async fn record_login(
    state: &AppState,
    meta: &RequestMeta,
    tenant_id: Option<DbId>,
    user_id: Option<DbId>,
    success: bool,
    mut details: serde_json::Value,
) {
    if let Some(obj) = details.as_object_mut() {
        obj.insert("success".into(), json!(success));
    }
    AuditRecorder::new(&state.pool, meta, tenant_id, user_id)
        .record(action_types::LOGIN, entity_types::USER, user_id, details)
        .await;
}

/// Issue a token pair and persist its session.
///
/// With `replaces`, the new session is opened only if that one can still be
/// revoked; a lost refresh race is reported as 401.
async fn create_auth_response(
    state: &AppState,
    meta: &RequestMeta,
    user: &User,
    replaces: Option<DbId>,
) -> AppResult<AuthResponse> {
    let profile = UserRepo::find_response(&state.pool, user.id)
        .await?
        .ok_or(AppError::not_found("User", user.id))?;

    let access_token =
        generate_access_token(user.id, user.tenant_id, &profile.role, &state.config.jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let refresh = RefreshToken::generate();

    let session_input = CreateSession {
        user_id: user.id,
        refresh_token_hash: refresh.hash,
        expires_at: state.config.jwt.refresh_expires_at(Utc::now()),
        user_agent: meta.user_agent.clone(),
        ip_address: meta.ip_address.clone(),
    };
    match replaces {
        Some(old_id) => {
            SessionRepo::rotate(&state.pool, old_id, &session_input)
                .await?
                .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token"))?;
        }
        None => {
            SessionRepo::create(&state.pool, &session_input).await?;
        }
    }

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh.plaintext,
        expires_in: state.config.jwt.access_expires_in_secs(),
        user: profile,
    })
}
