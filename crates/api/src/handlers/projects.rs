//! Handlers for the `/projects` resource.

use atrium_core::audit::{action_types, entity_types};
use atrium_core::fields::{optional_text, require_text};
use atrium_core::permissions::Permission;
use atrium_core::projects::{
    validate_date_range, validate_project_status, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
use atrium_core::types::DbId;
use atrium_db::models::project::{CreateProject, Project, ProjectSummary, UpdateProject};
use atrium_db::repositories::ProjectRepo;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::ensure_member;
use crate::audit_trail::AuditRecorder;
use crate::error::{AppError, AppResult};
use crate::middleware::request_meta::RequestMeta;
use crate::middleware::tenant::TenantScope;
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects
pub async fn list_projects(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let (limit, offset) = params.page();
    let projects = ProjectRepo::list(
        &state.pool,
        scope.tenant_id,
        params.status.as_deref(),
        params.search_pattern().as_deref(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: projects }))
}

/// POST /api/v1/projects
pub async fn create_project(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    scope.require(Permission::WriteProjects)?;

    require_text("Name", &input.name, MAX_TITLE_LENGTH)?;
    optional_text("Description", input.description.as_deref(), MAX_DESCRIPTION_LENGTH)?;
    if let Some(status) = &input.status {
        validate_project_status(status)?;
    }
    validate_date_range(input.start_date, input.due_date)?;
    ensure_member(&state.pool, scope.tenant_id, input.owner_user_id, "owner_user_id").await?;

    let project = ProjectRepo::create(&state.pool, scope.tenant_id, scope.user_id(), &input).await?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_CREATE,
            entity_types::PROJECT,
            Some(project.id),
            json!({ "name": project.name, "status": project.status }),
        )
        .await;

    tracing::info!(
        tenant_id = scope.tenant_id,
        user_id = scope.user_id(),
        project_id = project.id,
        "Project created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    Ok(Json(DataResponse { data: project }))
}

/// GET /api/v1/projects/{id}/summary
///
/// The project with task counts per status, completion percentage, and the
/// number of open tasks past their due date.
pub async fn project_summary(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectSummary>>> {
    let project = ProjectRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    let (tasks, overdue_tasks) = ProjectRepo::task_counts(&state.pool, scope.tenant_id, id).await?;

    Ok(Json(DataResponse {
        data: ProjectSummary {
            project,
            total_tasks: tasks.total(),
            completion_percent: tasks.completion_percent(),
            tasks,
            overdue_tasks,
        },
    }))
}

/// PUT /api/v1/projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    scope.require(Permission::WriteProjects)?;

    let existing = ProjectRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Project", id))?;

    if let Some(name) = &input.name {
        require_text("Name", name, MAX_TITLE_LENGTH)?;
    }
    optional_text("Description", input.description.as_deref(), MAX_DESCRIPTION_LENGTH)?;
    if let Some(status) = &input.status {
        validate_project_status(status)?;
    }
    validate_date_range(
        input.start_date.or(existing.start_date),
        input.due_date.or(existing.due_date),
    )?;
    ensure_member(&state.pool, scope.tenant_id, input.owner_user_id, "owner_user_id").await?;

    let project = ProjectRepo::update(&state.pool, scope.tenant_id, id, &input)
        .await?
        .ok_or(AppError::not_found("Project", id))?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_UPDATE,
            entity_types::PROJECT,
            Some(id),
            json!({ "from_status": existing.status, "status": input.status, "name": input.name }),
        )
        .await;

    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
///
/// Soft-deletes the project together with its tasks.
pub async fn delete_project(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope.require(Permission::WriteProjects)?;

    if !ProjectRepo::soft_delete(&state.pool, scope.tenant_id, id).await? {
        return Err(AppError::not_found("Project", id));
    }

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(action_types::ENTITY_DELETE, entity_types::PROJECT, Some(id), json!({}))
        .await;

    Ok(StatusCode::NO_CONTENT)
}
