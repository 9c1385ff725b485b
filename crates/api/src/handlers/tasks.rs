//! Handlers for the `/tasks` resource.
//!
//! Tasks always belong to a project of the caller's tenant. Assigning a task
//! to someone other than the caller notifies the assignee.

use atrium_core::audit::{action_types, entity_types};
use atrium_core::events::{names, TYPE_NOTIFICATION};
use atrium_core::fields::{optional_text, require_text};
use atrium_core::permissions::Permission;
use atrium_core::projects::{
    completion_change, validate_task_priority, validate_task_status, CompletionChange,
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
use atrium_core::types::DbId;
use atrium_db::models::task::{CreateTask, Task, UpdateTask};
use atrium_db::repositories::{ProjectRepo, TaskRepo};
use atrium_events::PlatformEvent;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::ensure_member;
use crate::audit_trail::AuditRecorder;
use crate::error::{AppError, AppResult};
use crate::middleware::request_meta::RequestMeta;
use crate::middleware::tenant::TenantScope;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListParams {
    pub project_id: Option<DbId>,
    pub status: Option<String>,
    pub assignee_user_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(params): Query<TaskListParams>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let limit = atrium_core::search::clamp_limit(
        params.limit,
        atrium_core::search::DEFAULT_LIST_LIMIT,
        atrium_core::search::MAX_LIST_LIMIT,
    );
    let offset = atrium_core::search::clamp_offset(params.offset);

    let tasks = TaskRepo::list(
        &state.pool,
        scope.tenant_id,
        params.project_id,
        params.status.as_deref(),
        params.assignee_user_id,
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// POST /api/v1/tasks
pub async fn create_task(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Json(input): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<DataResponse<Task>>)> {
    scope.require(Permission::WriteProjects)?;

    require_text("Title", &input.title, MAX_TITLE_LENGTH)?;
    optional_text("Description", input.description.as_deref(), MAX_DESCRIPTION_LENGTH)?;
    if let Some(status) = &input.status {
        validate_task_status(status)?;
    }
    if let Some(priority) = &input.priority {
        validate_task_priority(priority)?;
    }
    ProjectRepo::find_by_id(&state.pool, scope.tenant_id, input.project_id)
        .await?
        .ok_or(AppError::not_found("Project", input.project_id))?;
    ensure_member(&state.pool, scope.tenant_id, input.assignee_user_id, "assignee_user_id").await?;

    let task = TaskRepo::create(&state.pool, scope.tenant_id, scope.user_id(), &input).await?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_CREATE,
            entity_types::TASK,
            Some(task.id),
            json!({
                "project_id": task.project_id,
                "title": task.title,
                "assignee_user_id": task.assignee_user_id,
            }),
        )
        .await;

    if let Some(assignee) = task.assignee_user_id {
        notify_assignee(&state, &scope, &task, assignee).await;
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = TaskRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Task", id))?;
    Ok(Json(DataResponse { data: task }))
}

/// PUT /api/v1/tasks/{id}
///
/// Entering `done` stamps `completed_at`; leaving it clears the stamp.
pub async fn update_task(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTask>,
) -> AppResult<Json<DataResponse<Task>>> {
    scope.require(Permission::WriteProjects)?;

    let existing = TaskRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Task", id))?;

    if let Some(title) = &input.title {
        require_text("Title", title, MAX_TITLE_LENGTH)?;
    }
    optional_text("Description", input.description.as_deref(), MAX_DESCRIPTION_LENGTH)?;
    if let Some(status) = &input.status {
        validate_task_status(status)?;
    }
    if let Some(priority) = &input.priority {
        validate_task_priority(priority)?;
    }
    ensure_member(&state.pool, scope.tenant_id, input.assignee_user_id, "assignee_user_id").await?;

    let next_status = input.status.as_deref().unwrap_or(&existing.status);
    let completed_at = match completion_change(&existing.status, next_status, Utc::now()) {
        CompletionChange::Keep => existing.completed_at,
        CompletionChange::Set(ts) => Some(ts),
        CompletionChange::Clear => None,
    };

    let task = TaskRepo::update(&state.pool, scope.tenant_id, id, &input, completed_at)
        .await?
        .ok_or(AppError::not_found("Task", id))?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_UPDATE,
            entity_types::TASK,
            Some(id),
            json!({
                "from_status": existing.status,
                "status": input.status,
                "priority": input.priority,
                "assignee_user_id": input.assignee_user_id,
            }),
        )
        .await;

    if let Some(assignee) = input.assignee_user_id {
        if existing.assignee_user_id != Some(assignee) {
            notify_assignee(&state, &scope, &task, assignee).await;
        }
    }

    Ok(Json(DataResponse { data: task }))
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope.require(Permission::WriteProjects)?;

    if !TaskRepo::soft_delete(&state.pool, scope.tenant_id, id).await? {
        return Err(AppError::not_found("Task", id));
    }

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(action_types::ENTITY_DELETE, entity_types::TASK, Some(id), json!({}))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Publish `task.assigned` unless the caller assigned the task to themselves.
async fn notify_assignee(state: &AppState, scope: &TenantScope, task: &Task, assignee: DbId) {
    if assignee == scope.user_id() {
        return;
    }
    state
        .events
        .publish_logged(
            PlatformEvent::new(names::TASK_ASSIGNED)
                .with_type(TYPE_NOTIFICATION)
                .with_tenant(scope.tenant_id)
                .with_source(entity_types::TASK, task.id)
                .with_actor(scope.user_id())
                .with_payload(json!({
                    "task_id": task.id,
                    "project_id": task.project_id,
                    "title": task.title,
                }))
                .notify([assignee]),
        )
        .await;
}
