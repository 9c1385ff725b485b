//! Handlers for the `/employees` resource.

use atrium_core::audit::{action_types, entity_types};
use atrium_core::fields::optional_text;
use atrium_core::hr::{
    validate_employee_name, validate_employment_change, validate_employment_status,
    MAX_DEPARTMENT_LENGTH, MAX_TITLE_LENGTH,
};
use atrium_core::permissions::Permission;
use atrium_core::types::DbId;
use atrium_core::users::{normalize_email, validate_email};
use atrium_db::models::employee::{CreateEmployee, Employee, UpdateEmployee};
use atrium_db::repositories::EmployeeRepo;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::{ensure_member, normalize_optional_email};
use crate::audit_trail::AuditRecorder;
use crate::error::{AppError, AppResult};
use crate::middleware::request_meta::RequestMeta;
use crate::middleware::tenant::TenantScope;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /employees`.
#[derive(Debug, Default, Deserialize)]
pub struct EmployeeListParams {
    pub department: Option<String>,
    pub employment_status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/employees
pub async fn list_employees(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(params): Query<EmployeeListParams>,
) -> AppResult<Json<DataResponse<Vec<Employee>>>> {
    let limit = atrium_core::search::clamp_limit(
        params.limit,
        atrium_core::search::DEFAULT_LIST_LIMIT,
        atrium_core::search::MAX_LIST_LIMIT,
    );
    let offset = atrium_core::search::clamp_offset(params.offset);
    let search = params.search.as_deref().and_then(atrium_core::search::like_pattern);

    let employees = EmployeeRepo::list(
        &state.pool,
        scope.tenant_id,
        params.department.as_deref(),
        params.employment_status.as_deref(),
        search.as_deref(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: employees }))
}

/// POST /api/v1/employees
///
/// Email is unique per tenant; a duplicate yields 409.
pub async fn create_employee(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Json(mut input): Json<CreateEmployee>,
) -> AppResult<(StatusCode, Json<DataResponse<Employee>>)> {
    scope.require(Permission::WriteHr)?;

    validate_employee_name(&input.first_name, &input.last_name)?;
    input.email = normalize_email(&input.email);
    validate_email(&input.email)?;
    optional_text("Job title", input.job_title.as_deref(), MAX_TITLE_LENGTH)?;
    optional_text("Department", input.department.as_deref(), MAX_DEPARTMENT_LENGTH)?;
    if let Some(status) = &input.employment_status {
        validate_employment_status(status)?;
    }
    ensure_member(&state.pool, scope.tenant_id, input.user_id, "user_id").await?;

    let employee = EmployeeRepo::create(&state.pool, scope.tenant_id, scope.user_id(), &input).await?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_CREATE,
            entity_types::EMPLOYEE,
            Some(employee.id),
            json!({
                "department": employee.department,
                "employment_status": employee.employment_status,
                "user_id": employee.user_id,
            }),
        )
        .await;

    tracing::info!(
        tenant_id = scope.tenant_id,
        user_id = scope.user_id(),
        employee_id = employee.id,
        "Employee created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: employee })))
}

/// GET /api/v1/employees/{id}
pub async fn get_employee(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Employee>>> {
    let employee = EmployeeRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Employee", id))?;
    Ok(Json(DataResponse { data: employee }))
}

/// PUT /api/v1/employees/{id}
pub async fn update_employee(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateEmployee>,
) -> AppResult<Json<DataResponse<Employee>>> {
    scope.require(Permission::WriteHr)?;

    let existing = EmployeeRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Employee", id))?;

    validate_employee_name(
        input.first_name.as_deref().unwrap_or(&existing.first_name),
        input.last_name.as_deref().unwrap_or(&existing.last_name),
    )?;
    input.email = normalize_optional_email(input.email.as_deref())?;
    optional_text("Job title", input.job_title.as_deref(), MAX_TITLE_LENGTH)?;
    optional_text("Department", input.department.as_deref(), MAX_DEPARTMENT_LENGTH)?;
    if let Some(status) = &input.employment_status {
        validate_employment_change(&existing.employment_status, status)?;
    }
    ensure_member(&state.pool, scope.tenant_id, input.user_id, "user_id").await?;

    let employee = EmployeeRepo::update(&state.pool, scope.tenant_id, id, &input)
        .await?
        .ok_or(AppError::not_found("Employee", id))?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_UPDATE,
            entity_types::EMPLOYEE,
            Some(id),
            json!({
                "from_status": existing.employment_status,
                "employment_status": input.employment_status,
                "department": input.department,
                "job_title": input.job_title,
            }),
        )
        .await;

    Ok(Json(DataResponse { data: employee }))
}

/// DELETE /api/v1/employees/{id}
pub async fn delete_employee(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope.require(Permission::WriteHr)?;

    if !EmployeeRepo::soft_delete(&state.pool, scope.tenant_id, id).await? {
        return Err(AppError::not_found("Employee", id));
    }

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(action_types::ENTITY_DELETE, entity_types::EMPLOYEE, Some(id), json!({}))
        .await;

    Ok(StatusCode::NO_CONTENT)
}
