//! Handlers for publishing and browsing platform events.

use std::collections::BTreeSet;

use atrium_core::audit::{action_types, entity_types};
use atrium_core::error::CoreError;
use atrium_core::events::{
    is_system_event, validate_event_name, validate_event_type, validate_object, TYPE_DOMAIN,
    TYPE_SYSTEM,
};
use atrium_core::permissions::Permission;
use atrium_core::types::DbId;
use atrium_db::models::event::Event;
use atrium_db::repositories::{EventRepo, UserRepo};
use atrium_events::{PublishOptions, PublishedEvent};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::audit_trail::AuditRecorder;
use crate::error::{AppError, AppResult};
use crate::middleware::request_meta::RequestMeta;
use crate::middleware::tenant::TenantScope;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /events`.
#[derive(Debug, Deserialize)]
pub struct PublishEventRequest {
    pub name: String,
    /// Defaults to `domain`, or `system` for `system.*` names.
    pub event_type: Option<String>,
    #[serde(default = "empty_object")]
    pub payload: serde_json::Value,
    #[serde(default = "empty_object")]
    pub meta: serde_json::Value,
    pub source_entity_type: Option<String>,
    pub source_entity_id: Option<DbId>,
    pub correlation_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub notify_user_ids: Vec<DbId>,
}

fn empty_object() -> serde_json::Value {
    json!({})
}

/// Query parameters for `GET /events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventListParams {
    /// Only events whose name starts with this prefix, e.g. `task.`.
    pub prefix: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /api/v1/events
///
/// Persist an event in the caller's tenant and fan it out. Every id in
/// `notify_user_ids` must be an active member of the tenant. `system.*`
/// names are reserved for super admins.
pub async fn publish_event(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Json(input): Json<PublishEventRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PublishedEvent>>)> {
    scope.require(Permission::PublishEvents)?;

    validate_event_name(&input.name)?;
    let system = is_system_event(&input.name);
    if system && !scope.is_super_admin() {
        return Err(AppError::forbidden("Only super admins may publish system events"));
    }
    let event_type = input
        .event_type
        .as_deref()
        .unwrap_or(if system { TYPE_SYSTEM } else { TYPE_DOMAIN });
    validate_event_type(event_type)?;
    validate_object("payload", &input.payload)?;
    validate_object("meta", &input.meta)?;

    let source = match (input.source_entity_type, input.source_entity_id) {
        (Some(entity_type), Some(entity_id)) => Some((entity_type, entity_id)),
        (None, None) => None,
        _ => {
            return Err(CoreError::Validation(
                "source_entity_type and source_entity_id must be given together".to_string(),
            )
            .into())
        }
    };

    let targets: Vec<DbId> = input
        .notify_user_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !targets.is_empty() {
        let members = UserRepo::filter_tenant_members(&state.pool, scope.tenant_id, &targets).await?;
        let outsiders: Vec<DbId> = targets.iter().copied().filter(|id| !members.contains(id)).collect();
        if !outsiders.is_empty() {
            return Err(CoreError::Validation(format!(
                "notify_user_ids contains users outside this tenant: {outsiders:?}"
            ))
            .into());
        }
    }

    let published = state
        .events
        .publish_event(
            &input.name,
            event_type,
            input.payload,
            input.meta,
            PublishOptions {
                tenant_id: Some(scope.tenant_id),
                actor_user_id: Some(scope.user_id()),
                source,
                correlation_id: input.correlation_id,
                notify_user_ids: targets,
            },
        )
        .await?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::EVENT_PUBLISH,
            entity_types::EVENT,
            Some(published.id),
            json!({
                "name": published.event.name,
                "event_type": published.event.event_type,
                "notify_count": published.event.notify_user_ids.len(),
            }),
        )
        .await;

    tracing::info!(
        tenant_id = scope.tenant_id,
        user_id = scope.user_id(),
        event_id = published.id,
        name = %published.event.name,
        "Event published via API",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: published })))
}

/// GET /api/v1/events
pub async fn list_events(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(params): Query<EventListParams>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let limit = atrium_core::search::clamp_limit(
        params.limit,
        atrium_core::search::DEFAULT_LIST_LIMIT,
        atrium_core::search::MAX_LIST_LIMIT,
    );
    let offset = atrium_core::search::clamp_offset(params.offset);

    let events = EventRepo::list_for_tenant(
        &state.pool,
        scope.tenant_id,
        params.prefix.as_deref().filter(|p| !p.is_empty()),
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: events }))
}

/// GET /api/v1/events/{id}
pub async fn get_event(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Event>>> {
    let event = EventRepo::find_in_tenant(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Event", id))?;
    Ok(Json(DataResponse { data: event }))
}
