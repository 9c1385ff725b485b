//! Handlers for the `/customers` resource.

use atrium_core::audit::{action_types, entity_types};
use atrium_core::crm::{validate_customer_status, MAX_NAME_LENGTH, MAX_NOTES_LENGTH};
use atrium_core::fields::{optional_text, require_text};
use atrium_core::permissions::Permission;
use atrium_core::types::DbId;
use atrium_db::models::customer::{CreateCustomer, Customer, UpdateCustomer};
use atrium_db::repositories::CustomerRepo;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::{ensure_member, normalize_optional_email};
use crate::audit_trail::AuditRecorder;
use crate::error::{AppError, AppResult};
use crate::middleware::request_meta::RequestMeta;
use crate::middleware::tenant::TenantScope;
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/customers
pub async fn list_customers(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Customer>>>> {
    let (limit, offset) = params.page();
    let customers = CustomerRepo::list(
        &state.pool,
        scope.tenant_id,
        params.status.as_deref(),
        params.search_pattern().as_deref(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: customers }))
}

/// POST /api/v1/customers
pub async fn create_customer(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Json(mut input): Json<CreateCustomer>,
) -> AppResult<(StatusCode, Json<DataResponse<Customer>>)> {
    scope.require(Permission::WriteCrm)?;

    require_text("Name", &input.name, MAX_NAME_LENGTH)?;
    optional_text("Notes", input.notes.as_deref(), MAX_NOTES_LENGTH)?;
    if let Some(status) = &input.status {
        validate_customer_status(status)?;
    }
    input.email = normalize_optional_email(input.email.as_deref())?;
    ensure_member(&state.pool, scope.tenant_id, input.owner_user_id, "owner_user_id").await?;

    let customer = CustomerRepo::create(&state.pool, scope.tenant_id, scope.user_id(), &input).await?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_CREATE,
            entity_types::CUSTOMER,
            Some(customer.id),
            json!({ "name": customer.name, "status": customer.status }),
        )
        .await;

    tracing::info!(
        tenant_id = scope.tenant_id,
        user_id = scope.user_id(),
        customer_id = customer.id,
        "Customer created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: customer })))
}

/// GET /api/v1/customers/{id}
pub async fn get_customer(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Customer>>> {
    let customer = CustomerRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Customer", id))?;
    Ok(Json(DataResponse { data: customer }))
}

/// PUT /api/v1/customers/{id}
pub async fn update_customer(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateCustomer>,
) -> AppResult<Json<DataResponse<Customer>>> {
    scope.require(Permission::WriteCrm)?;

    if let Some(name) = &input.name {
        require_text("Name", name, MAX_NAME_LENGTH)?;
    }
    optional_text("Notes", input.notes.as_deref(), MAX_NOTES_LENGTH)?;
    if let Some(status) = &input.status {
        validate_customer_status(status)?;
    }
    input.email = normalize_optional_email(input.email.as_deref())?;
    ensure_member(&state.pool, scope.tenant_id, input.owner_user_id, "owner_user_id").await?;

    let customer = CustomerRepo::update(&state.pool, scope.tenant_id, id, &input)
        .await?
        .ok_or(AppError::not_found("Customer", id))?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_UPDATE,
            entity_types::CUSTOMER,
            Some(id),
            json!({ "name": input.name, "status": input.status, "owner_user_id": input.owner_user_id }),
        )
        .await;

    Ok(Json(DataResponse { data: customer }))
}

/// DELETE /api/v1/customers/{id}
pub async fn delete_customer(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope.require(Permission::WriteCrm)?;

    if !CustomerRepo::soft_delete(&state.pool, scope.tenant_id, id).await? {
        return Err(AppError::not_found("Customer", id));
    }

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(action_types::ENTITY_DELETE, entity_types::CUSTOMER, Some(id), json!({}))
        .await;

    Ok(StatusCode::NO_CONTENT)
}
