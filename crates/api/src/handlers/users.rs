//! Handlers for the `/users` resource.
//!
//! All routes are tenant-scoped. Reads need membership; writes need
//! `users.manage` in the tenant.

use atrium_core::audit::{action_types, entity_types};
use atrium_core::error::CoreError;
use atrium_core::permissions::Permission;
use atrium_core::roles::{role_id_by_name, ROLE_ID_MEMBER, ROLE_ID_SUPER_ADMIN, ROLE_SUPER_ADMIN};
use atrium_core::types::DbId;
use atrium_core::users::{
    anonymized_email, anonymized_username, normalize_email, validate_email,
    validate_password_strength, validate_username,
};
use atrium_db::models::user::{CreateUser, UpdateUser, UserResponse};
use atrium_db::repositories::{SessionRepo, UserRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::audit_trail::AuditRecorder;
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::request_meta::RequestMeta;
use crate::middleware::tenant::TenantScope;
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    /// Role name; defaults to `member`.
    pub role: Option<String>,
}

/// Request body for `PUT /users/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Request body for `POST /users/{id}/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let (limit, offset) = params.page();
    let users = UserRepo::list_for_tenant(
        &state.pool,
        scope.tenant_id,
        params.include_inactive,
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: users }))
}

/// POST /api/v1/users
///
/// Creating a `super_admin` produces a platform-level user with no tenant.
pub async fn create_user(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    scope.require(Permission::ManageUsers)?;

    let email = normalize_email(&input.email);
    validate_email(&email)?;
    validate_username(&input.username)?;
    validate_password_strength(&input.password)?;

    let role_id = match input.role.as_deref() {
        Some(name) => resolve_role(&scope, name)?,
        None => ROLE_ID_MEMBER,
    };
    let tenant_id = (role_id != ROLE_ID_SUPER_ADMIN).then_some(scope.tenant_id);

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            tenant_id,
            username: input.username,
            email,
            display_name: input.display_name,
            password_hash,
            role_id,
        },
    )
    .await?;

    let response = UserRepo::find_response(&state.pool, user.id)
        .await?
        .ok_or(AppError::not_found("User", user.id))?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_CREATE,
            entity_types::USER,
            Some(user.id),
            json!({ "username": response.username, "role": response.role }),
        )
        .await;

    tracing::info!(
        tenant_id = scope.tenant_id,
        user_id = scope.user_id(),
        new_user_id = user.id,
        role = %response.role,
        "User created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_in_tenant(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    Ok(Json(DataResponse { data: user }))
}

/// PUT /api/v1/users/{id}
///
/// Deactivating a user (`is_active: false`) also revokes their sessions.
/// Promoting a user to `super_admin` detaches them from the tenant.
pub async fn update_user(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    scope.require(Permission::ManageUsers)?;

    let existing = UserRepo::find_in_tenant(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    guard_super_admin_target(&scope, &existing)?;

    if id == scope.user_id() && input.is_active == Some(false) {
        return Err(AppError::BadRequest("You cannot deactivate your own account".into()));
    }

    let email = match input.email.as_deref() {
        Some(e) => {
            let email = normalize_email(e);
            validate_email(&email)?;
            Some(email)
        }
        None => None,
    };
    if let Some(username) = &input.username {
        validate_username(username)?;
    }
    let role_id = match input.role.as_deref() {
        Some(name) => Some(resolve_role(&scope, name)?),
        None => None,
    };

    let update = UpdateUser {
        username: input.username,
        email,
        display_name: input.display_name,
        role_id,
        is_active: input.is_active,
    };
    UserRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::not_found("User", id))?;

    if existing.is_active && update.is_active == Some(false) {
        SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    }

    let response = UserRepo::find_response(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_UPDATE,
            entity_types::USER,
            Some(id),
            json!({
                "username": update.username,
                "email": update.email,
                "role": input.role,
                "is_active": update.is_active,
            }),
        )
        .await;

    Ok(Json(DataResponse { data: response }))
}

/// DELETE /api/v1/users/{id}
///
/// Soft delete: the account is deactivated, its identifying fields are
/// anonymized, and its sessions and grants are removed.
pub async fn delete_user(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope.require(Permission::ManageUsers)?;

    if id == scope.user_id() {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }

    let existing = UserRepo::find_in_tenant(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    guard_super_admin_target(&scope, &existing)?;

    let deleted = UserRepo::soft_delete(
        &state.pool,
        id,
        &anonymized_email(id),
        &anonymized_username(id),
    )
    .await?;
    if !deleted {
        return Err(AppError::not_found("User", id));
    }

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(action_types::ENTITY_DELETE, entity_types::USER, Some(id), json!({}))
        .await;

    tracing::info!(tenant_id = scope.tenant_id, user_id = scope.user_id(), deleted_user_id = id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/users/{id}/reset-password
///
/// Sets a new password, clears any lockout, and revokes existing sessions.
pub async fn reset_password(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    scope.require(Permission::ManageUsers)?;

    let existing = UserRepo::find_in_tenant(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    guard_super_admin_target(&scope, &existing)?;

    validate_password_strength(&input.new_password)?;
    let password_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if !UserRepo::update_password(&state.pool, id, &password_hash).await? {
        return Err(AppError::BadRequest("Cannot reset the password of an inactive user".into()));
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(action_types::PASSWORD_RESET, entity_types::USER, Some(id), json!({}))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a role name to its id. Only super admins may hand out `super_admin`.
fn resolve_role(scope: &TenantScope, name: &str) -> AppResult<DbId> {
    let role_id = role_id_by_name(name)
        .ok_or_else(|| CoreError::Validation(format!("Unknown role '{name}'")))?;
    if role_id == ROLE_ID_SUPER_ADMIN && !scope.is_super_admin() {
        return Err(AppError::forbidden("Only super admins may assign the super_admin role"));
    }
    Ok(role_id)
}

fn guard_super_admin_target(scope: &TenantScope, target: &UserResponse) -> AppResult<()> {
    if target.role == ROLE_SUPER_ADMIN && !scope.is_super_admin() {
        return Err(AppError::forbidden("Only super admins may modify a super admin"));
    }
    Ok(())
}
