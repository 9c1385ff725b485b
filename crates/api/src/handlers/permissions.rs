//! Handlers for the permission catalogue and direct grants.

use atrium_core::audit::{action_types, entity_types};
use atrium_core::error::CoreError;
use atrium_core::events::{names, TYPE_NOTIFICATION};
use atrium_core::permissions::Permission;
use atrium_core::types::DbId;
use atrium_db::models::permission::{CreateGrant, PermissionDef, PermissionGrant};
use atrium_db::repositories::{PermissionRepo, UserRepo};
use atrium_events::PlatformEvent;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::audit_trail::AuditRecorder;
use crate::error::{AppError, AppResult};
use crate::middleware::principal::Principal;
use crate::middleware::request_meta::RequestMeta;
use crate::middleware::tenant::TenantScope;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response of `GET /users/{id}/permissions`.
#[derive(Debug, Serialize)]
pub struct UserPermissions {
    pub user_id: DbId,
    pub tenant_id: DbId,
    pub role: String,
    /// Everything the user may do in `tenant_id`, role and grants combined.
    pub effective: Vec<Permission>,
    pub grants: Vec<PermissionGrant>,
}

/// GET /api/v1/permissions
pub async fn list_catalog(
    State(state): State<AppState>,
    _principal: Principal,
) -> AppResult<Json<DataResponse<Vec<PermissionDef>>>> {
    let catalog = PermissionRepo::list_catalog(&state.pool).await?;
    Ok(Json(DataResponse { data: catalog }))
}

/// GET /api/v1/users/{id}/permissions
pub async fn user_permissions(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserPermissions>>> {
    UserRepo::find_in_tenant(&state.pool, scope.tenant_id, user_id)
        .await?
        .ok_or(AppError::not_found("User", user_id))?;

    let profile = PermissionRepo::load_profile(&state.pool, user_id)
        .await?
        .ok_or(AppError::not_found("User", user_id))?;
    let grants = PermissionRepo::list_grants_for_user(&state.pool, user_id).await?;

    Ok(Json(DataResponse {
        data: UserPermissions {
            user_id,
            tenant_id: scope.tenant_id,
            effective: profile.effective(Some(scope.tenant_id)),
            role: profile.role,
            grants,
        },
    }))
}

/// POST /api/v1/permissions/grants
///
/// A grant without `tenant_id` applies everywhere and only super admins may
/// issue one. A tenant grant needs `permissions.grant` in that tenant and a
/// target who belongs to it.
pub async fn grant_permission(
    State(state): State<AppState>,
    meta: RequestMeta,
    principal: Principal,
    Json(input): Json<CreateGrant>,
) -> AppResult<(StatusCode, Json<DataResponse<PermissionGrant>>)> {
    let permission: Permission = input.permission.parse()?;
    authorize_grant_scope(&principal, permission, input.tenant_id)?;

    match input.tenant_id {
        Some(tenant_id) => {
            let members =
                UserRepo::filter_tenant_members(&state.pool, tenant_id, &[input.user_id]).await?;
            if members.is_empty() {
                return Err(CoreError::Validation(format!(
                    "User {} is not an active member of tenant {tenant_id}",
                    input.user_id
                ))
                .into());
            }
        }
        None => {
            let target = UserRepo::find_by_id(&state.pool, input.user_id)
                .await?
                .filter(|u| u.is_active)
                .ok_or(AppError::not_found("User", input.user_id))?;
            tracing::debug!(target_user_id = target.id, "Issuing platform-wide grant");
        }
    }

    let grant = PermissionRepo::grant(
        &state.pool,
        input.user_id,
        permission.as_str(),
        input.tenant_id,
        principal.user_id(),
    )
    .await?
    .ok_or_else(|| {
        AppError::InternalError(format!("Permission '{permission}' missing from catalogue"))
    })?;

    AuditRecorder::new(&state.pool, &meta, input.tenant_id, Some(principal.user_id()))
        .record(
            action_types::PERMISSION_GRANT,
            entity_types::PERMISSION_GRANT,
            Some(grant.id),
            json!({
                "target_user_id": grant.user_id,
                "permission": grant.permission,
                "tenant_id": grant.tenant_id,
            }),
        )
        .await;

    let mut event = PlatformEvent::new(names::PERMISSION_GRANTED)
        .with_type(TYPE_NOTIFICATION)
        .with_source(entity_types::PERMISSION_GRANT, grant.id)
        .with_actor(principal.user_id())
        .with_payload(json!({ "permission": grant.permission, "tenant_id": grant.tenant_id }))
        .notify([grant.user_id]);
    if let Some(tenant_id) = grant.tenant_id {
        event = event.with_tenant(tenant_id);
    }
    state.events.publish_logged(event).await;

    tracing::info!(
        user_id = principal.user_id(),
        target_user_id = grant.user_id,
        permission = %grant.permission,
        tenant_id = ?grant.tenant_id,
        "Permission granted",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: grant })))
}

/// DELETE /api/v1/permissions/grants/{id}
pub async fn revoke_permission(
    State(state): State<AppState>,
    meta: RequestMeta,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let grant = PermissionRepo::find_grant(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("PermissionGrant", id))?;

    if let Some(tenant_id) = grant.tenant_id {
        if !principal.profile.is_member_of(tenant_id) {
            return Err(AppError::not_found("PermissionGrant", id));
        }
    }
    let permission: Permission = grant.permission.parse()?;
    authorize_grant_scope(&principal, permission, grant.tenant_id)?;

    if !PermissionRepo::revoke(&state.pool, id).await? {
        return Err(AppError::not_found("PermissionGrant", id));
    }

    AuditRecorder::new(&state.pool, &meta, grant.tenant_id, Some(principal.user_id()))
        .record(
            action_types::PERMISSION_REVOKE,
            entity_types::PERMISSION_GRANT,
            Some(id),
            json!({
                "target_user_id": grant.user_id,
                "permission": grant.permission,
                "tenant_id": grant.tenant_id,
            }),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Shared rules for granting and revoking `permission` in `tenant_id`.
fn authorize_grant_scope(
    principal: &Principal,
    permission: Permission,
    tenant_id: Option<DbId>,
) -> AppResult<()> {
    match tenant_id {
        None if !principal.is_super_admin() => {
            return Err(AppError::forbidden(
                "Only super admins may manage platform-wide grants",
            ));
        }
        None => {}
        Some(tenant_id) => principal.require(Permission::GrantPermissions, Some(tenant_id))?,
    }
    if permission == Permission::ManageTenants && !principal.is_super_admin() {
        return Err(AppError::forbidden(
            "Only super admins may grant tenants.manage",
        ));
    }
    Ok(())
}
