//! Handlers for the `/content` resource.
//!
//! Items are created as drafts. Publishing stamps `published_at` once and
//! announces the item with a `content.published` event.

use atrium_core::audit::{action_types, entity_types};
use atrium_core::content::{
    published_at_after, slugify, validate_content_slug, validate_content_type,
    validate_transition, MAX_BODY_LENGTH, MAX_TITLE_LENGTH, STATUS_PUBLISHED, TYPE_ARTICLE,
};
use atrium_core::error::CoreError;
use atrium_core::events::{names, TYPE_DOMAIN};
use atrium_core::fields::{optional_text, require_text};
use atrium_core::permissions::Permission;
use atrium_core::types::DbId;
use atrium_db::models::content::{ContentItem, CreateContentItem, UpdateContentItem};
use atrium_db::repositories::ContentRepo;
use atrium_events::PlatformEvent;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::audit_trail::AuditRecorder;
use crate::error::{AppError, AppResult};
use crate::middleware::request_meta::RequestMeta;
use crate::middleware::tenant::TenantScope;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /content`.
#[derive(Debug, Default, Deserialize)]
pub struct ContentListParams {
    pub content_type: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/content
pub async fn list_content(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(params): Query<ContentListParams>,
) -> AppResult<Json<DataResponse<Vec<ContentItem>>>> {
    let limit = atrium_core::search::clamp_limit(
        params.limit,
        atrium_core::search::DEFAULT_LIST_LIMIT,
        atrium_core::search::MAX_LIST_LIMIT,
    );
    let offset = atrium_core::search::clamp_offset(params.offset);
    let search = params.search.as_deref().and_then(atrium_core::search::like_pattern);

    let items = ContentRepo::list(
        &state.pool,
        scope.tenant_id,
        params.content_type.as_deref(),
        params.status.as_deref(),
        search.as_deref(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: items }))
}

/// POST /api/v1/content
pub async fn create_content(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Json(input): Json<CreateContentItem>,
) -> AppResult<(StatusCode, Json<DataResponse<ContentItem>>)> {
    scope.require(Permission::WriteContent)?;

    require_text("Title", &input.title, MAX_TITLE_LENGTH)?;
    let body = input.body.unwrap_or_default();
    optional_text("Body", Some(&body), MAX_BODY_LENGTH)?;
    let content_type = input.content_type.as_deref().unwrap_or(TYPE_ARTICLE);
    validate_content_type(content_type)?;

    let slug = match input.slug {
        Some(slug) => slug.trim().to_string(),
        None => slugify(&input.title),
    };
    if slug.is_empty() {
        return Err(CoreError::Validation(
            "A slug could not be derived from the title; provide one explicitly".to_string(),
        )
        .into());
    }
    validate_content_slug(&slug)?;
    if ContentRepo::find_by_slug(&state.pool, scope.tenant_id, &slug).await?.is_some() {
        return Err(CoreError::Conflict(format!("Slug '{slug}' is already in use")).into());
    }

    let item = ContentRepo::create(
        &state.pool,
        scope.tenant_id,
        scope.user_id(),
        &input.title,
        &slug,
        content_type,
        &body,
    )
    .await?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_CREATE,
            entity_types::CONTENT_ITEM,
            Some(item.id),
            json!({ "title": item.title, "slug": item.slug, "content_type": item.content_type }),
        )
        .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

/// GET /api/v1/content/{id}
pub async fn get_content(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ContentItem>>> {
    let item = ContentRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("ContentItem", id))?;
    Ok(Json(DataResponse { data: item }))
}

/// PUT /api/v1/content/{id}
pub async fn update_content(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateContentItem>,
) -> AppResult<Json<DataResponse<ContentItem>>> {
    scope.require(Permission::WriteContent)?;

    let existing = ContentRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("ContentItem", id))?;

    if let Some(title) = &input.title {
        require_text("Title", title, MAX_TITLE_LENGTH)?;
    }
    optional_text("Body", input.body.as_deref(), MAX_BODY_LENGTH)?;
    if let Some(content_type) = &input.content_type {
        validate_content_type(content_type)?;
    }
    if let Some(slug) = &input.slug {
        validate_content_slug(slug)?;
    }

    let next_status = input.status.as_deref().unwrap_or(&existing.status);
    validate_transition(&existing.status, next_status)?;
    let published_at =
        published_at_after(&existing.status, next_status, existing.published_at, Utc::now());

    let item = ContentRepo::update(&state.pool, scope.tenant_id, id, &input, published_at)
        .await?
        .ok_or(AppError::not_found("ContentItem", id))?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_UPDATE,
            entity_types::CONTENT_ITEM,
            Some(id),
            json!({ "from_status": existing.status, "status": item.status, "slug": input.slug }),
        )
        .await;

    if item.status == STATUS_PUBLISHED && existing.status != STATUS_PUBLISHED {
        state
            .events
            .publish_logged(
                PlatformEvent::new(names::CONTENT_PUBLISHED)
                    .with_type(TYPE_DOMAIN)
                    .with_tenant(scope.tenant_id)
                    .with_source(entity_types::CONTENT_ITEM, item.id)
                    .with_actor(scope.user_id())
                    .with_payload(json!({
                        "content_id": item.id,
                        "slug": item.slug,
                        "title": item.title,
                    }))
                    .notify(item.author_user_id.filter(|a| *a != scope.user_id())),
            )
            .await;
        tracing::info!(tenant_id = scope.tenant_id, content_id = item.id, "Content published");
    }

    Ok(Json(DataResponse { data: item }))
}

/// DELETE /api/v1/content/{id}
pub async fn delete_content(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope.require(Permission::WriteContent)?;

    if !ContentRepo::soft_delete(&state.pool, scope.tenant_id, id).await? {
        return Err(AppError::not_found("ContentItem", id));
    }

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(action_types::ENTITY_DELETE, entity_types::CONTENT_ITEM, Some(id), json!({}))
        .await;

    Ok(StatusCode::NO_CONTENT)
}
