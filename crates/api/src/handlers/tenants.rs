//! Handlers for the `/tenants` resource.
//!
//! Tenants are platform-level objects, so these handlers take a
//! [`Principal`] and check permissions against the tenant in the path
//! rather than resolving a [`TenantScope`](crate::middleware::tenant::TenantScope).

use atrium_core::audit::{action_types, entity_types};
use atrium_core::events::{names, TYPE_SYSTEM};
use atrium_core::permissions::Permission;
use atrium_core::roles::ROLE_ID_TENANT_ADMIN;
use atrium_core::tenants::{validate_plan, validate_settings, validate_slug, validate_tenant_name};
use atrium_core::types::DbId;
use atrium_core::users::{normalize_email, validate_email, validate_password_strength, validate_username};
use atrium_db::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use atrium_db::models::user::{CreateUser, UserResponse};
use atrium_db::repositories::{TenantRepo, UserRepo};
use atrium_events::PlatformEvent;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit_trail::AuditRecorder;
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::principal::Principal;
use crate::middleware::request_meta::RequestMeta;
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// The tenant's first administrator, created alongside it.
#[derive(Debug, Deserialize)]
pub struct TenantAdminInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Request body for `POST /tenants`.
#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    #[serde(flatten)]
    pub tenant: CreateTenant,
    pub admin: Option<TenantAdminInput>,
}

#[derive(Debug, Serialize)]
pub struct CreatedTenant {
    pub tenant: Tenant,
    pub admin: Option<UserResponse>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/tenants
///
/// Platform operators see every tenant; everyone else sees only their own.
pub async fn list_tenants(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<Json<DataResponse<Vec<Tenant>>>> {
    if principal.profile.allows(Permission::ManageTenants, None) {
        let (limit, offset) = params.page();
        let tenants = TenantRepo::list(&state.pool, params.include_inactive, limit, offset).await?;
        return Ok(Json(DataResponse { data: tenants }));
    }

    let own = match principal.profile.home_tenant_id {
        Some(id) => TenantRepo::find_by_id(&state.pool, id).await?,
        None => None,
    };
    Ok(Json(DataResponse {
        data: own.into_iter().collect(),
    }))
}

/// POST /api/v1/tenants
///
/// Create a tenant, optionally together with its first `tenant_admin`.
pub async fn create_tenant(
    State(state): State<AppState>,
    meta: RequestMeta,
    principal: Principal,
    Json(input): Json<CreateTenantRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedTenant>>)> {
    principal.require(Permission::ManageTenants, None)?;

    let mut tenant_input = input.tenant;
    tenant_input.slug = tenant_input.slug.trim().to_lowercase();
    validate_tenant_name(&tenant_input.name)?;
    validate_slug(&tenant_input.slug)?;
    if let Some(plan) = &tenant_input.plan {
        validate_plan(plan)?;
    }
    if let Some(settings) = &tenant_input.settings {
        validate_settings(settings)?;
    }

    let admin = match input.admin {
        Some(admin) => {
            let email = normalize_email(&admin.email);
            validate_email(&email)?;
            validate_username(&admin.username)?;
            validate_password_strength(&admin.password)?;
            let password_hash = hash_password(&admin.password)
                .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
            Some(CreateUser {
                tenant_id: None,
                username: admin.username,
                email,
                display_name: admin.display_name,
                password_hash,
                role_id: ROLE_ID_TENANT_ADMIN,
            })
        }
        None => None,
    };

    let (tenant, admin_user) =
        TenantRepo::create_with_admin(&state.pool, &tenant_input, admin).await?;

    let admin = match admin_user {
        Some(user) => UserRepo::find_response(&state.pool, user.id).await?,
        None => None,
    };

    AuditRecorder::new(&state.pool, &meta, Some(tenant.id), Some(principal.user_id()))
        .record(
            action_types::ENTITY_CREATE,
            entity_types::TENANT,
            Some(tenant.id),
            json!({ "slug": tenant.slug, "plan": tenant.plan, "admin_user_id": admin.as_ref().map(|a| a.id) }),
        )
        .await;

    state
        .events
        .publish_logged(
            PlatformEvent::new(names::TENANT_CREATED)
                .with_type(TYPE_SYSTEM)
                .with_tenant(tenant.id)
                .with_source(entity_types::TENANT, tenant.id)
                .with_actor(principal.user_id())
                .with_payload(json!({ "name": tenant.name, "slug": tenant.slug })),
        )
        .await;

    tracing::info!(tenant_id = tenant.id, slug = %tenant.slug, user_id = principal.user_id(), "Tenant created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedTenant { tenant, admin },
        }),
    ))
}

/// GET /api/v1/tenants/{id}
///
/// Non-members get 404, the same as for a tenant that does not exist.
pub async fn get_tenant(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Tenant>>> {
    if !principal.profile.is_member_of(id) {
        return Err(AppError::not_found("Tenant", id));
    }
    let tenant = TenantRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Tenant", id))?;
    Ok(Json(DataResponse { data: tenant }))
}

/// PUT /api/v1/tenants/{id}
pub async fn update_tenant(
    State(state): State<AppState>,
    meta: RequestMeta,
    principal: Principal,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTenant>,
) -> AppResult<Json<DataResponse<Tenant>>> {
    if !principal.profile.is_member_of(id) {
        return Err(AppError::not_found("Tenant", id));
    }
    principal.require(Permission::ConfigureTenant, Some(id))?;

    if let Some(name) = &input.name {
        validate_tenant_name(name)?;
    }
    if let Some(plan) = &input.plan {
        validate_plan(plan)?;
    }
    if let Some(settings) = &input.settings {
        validate_settings(settings)?;
    }

    let tenant = TenantRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Tenant", id))?;

    AuditRecorder::new(&state.pool, &meta, Some(id), Some(principal.user_id()))
        .record(
            action_types::TENANT_CONFIGURE,
            entity_types::TENANT,
            Some(id),
            json!({ "name": input.name, "plan": input.plan, "settings": input.settings }),
        )
        .await;

    Ok(Json(DataResponse { data: tenant }))
}

/// DELETE /api/v1/tenants/{id}
///
/// Deactivates the tenant. Data is kept; members can no longer log in.
pub async fn delete_tenant(
    State(state): State<AppState>,
    meta: RequestMeta,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    principal.require(Permission::ManageTenants, None)?;

    TenantRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Tenant", id))?;

    if TenantRepo::deactivate(&state.pool, id).await? {
        AuditRecorder::new(&state.pool, &meta, Some(id), Some(principal.user_id()))
            .record(action_types::ENTITY_DELETE, entity_types::TENANT, Some(id), json!({}))
            .await;

        state
            .events
            .publish_logged(
                PlatformEvent::new(names::TENANT_DEACTIVATED)
                    .with_type(TYPE_SYSTEM)
                    .with_tenant(id)
                    .with_source(entity_types::TENANT, id)
                    .with_actor(principal.user_id()),
            )
            .await;

        tracing::info!(tenant_id = id, user_id = principal.user_id(), "Tenant deactivated");
    }

    Ok(StatusCode::NO_CONTENT)
}
