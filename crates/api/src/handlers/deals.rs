//! Handlers for the `/deals` resource and the pipeline summary.

use atrium_core::audit::{action_types, entity_types};
use atrium_core::crm::{
    default_probability, summarize_pipeline, validate_currency, validate_deal_stage,
    validate_deal_value, validate_probability, validate_stage_change, PipelineSummary,
    MAX_NAME_LENGTH, MAX_NOTES_LENGTH, STAGE_CLOSED_WON, STAGE_PROSPECTING,
};
use atrium_core::error::CoreError;
use atrium_core::events::{names, TYPE_DOMAIN};
use atrium_core::fields::{optional_text, require_text};
use atrium_core::permissions::Permission;
use atrium_core::types::DbId;
use atrium_db::models::deal::{CreateDeal, Deal, UpdateDeal};
use atrium_db::repositories::deal_repo::NewDeal;
use atrium_db::repositories::{CustomerRepo, DealRepo};
use atrium_db::DbPool;
use atrium_events::PlatformEvent;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::ensure_member;
use crate::audit_trail::AuditRecorder;
use crate::error::{AppError, AppResult};
use crate::middleware::request_meta::RequestMeta;
use crate::middleware::tenant::TenantScope;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_CURRENCY: &str = "USD";

/// Query parameters for `GET /deals`.
#[derive(Debug, Default, Deserialize)]
pub struct DealListParams {
    pub stage: Option<String>,
    pub customer_id: Option<DbId>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/deals
pub async fn list_deals(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(params): Query<DealListParams>,
) -> AppResult<Json<DataResponse<Vec<Deal>>>> {
    let limit = atrium_core::search::clamp_limit(
        params.limit,
        atrium_core::search::DEFAULT_LIST_LIMIT,
        atrium_core::search::MAX_LIST_LIMIT,
    );
    let offset = atrium_core::search::clamp_offset(params.offset);
    let search = params.search.as_deref().and_then(atrium_core::search::like_pattern);

    let deals = DealRepo::list(
        &state.pool,
        scope.tenant_id,
        params.stage.as_deref(),
        params.customer_id,
        search.as_deref(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: deals }))
}

/// GET /api/v1/deals/pipeline
///
/// Count, value, and probability-weighted value per stage.
pub async fn pipeline(
    State(state): State<AppState>,
    scope: TenantScope,
) -> AppResult<Json<DataResponse<PipelineSummary>>> {
    let totals = DealRepo::stage_totals(&state.pool, scope.tenant_id).await?;
    Ok(Json(DataResponse {
        data: summarize_pipeline(&totals),
    }))
}

/// POST /api/v1/deals
pub async fn create_deal(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Json(input): Json<CreateDeal>,
) -> AppResult<(StatusCode, Json<DataResponse<Deal>>)> {
    scope.require(Permission::WriteCrm)?;

    require_text("Title", &input.title, MAX_NAME_LENGTH)?;
    optional_text("Notes", input.notes.as_deref(), MAX_NOTES_LENGTH)?;

    let stage = input.stage.as_deref().unwrap_or(STAGE_PROSPECTING);
    validate_deal_stage(stage)?;
    let currency = input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
    validate_currency(currency)?;
    let probability = input.probability.unwrap_or_else(|| default_probability(stage));
    validate_probability(probability)?;
    if let Some(value) = input.value_cents {
        validate_deal_value(value)?;
    }

    ensure_customer(&state.pool, scope.tenant_id, input.customer_id).await?;
    ensure_member(&state.pool, scope.tenant_id, input.owner_user_id, "owner_user_id").await?;

    let new_deal = NewDeal::from_input(&input, stage, currency, probability);
    let deal = DealRepo::create(&state.pool, scope.tenant_id, scope.user_id(), &new_deal).await?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_CREATE,
            entity_types::DEAL,
            Some(deal.id),
            json!({ "title": deal.title, "stage": deal.stage, "value_cents": deal.value_cents }),
        )
        .await;

    if deal.stage == STAGE_CLOSED_WON {
        publish_deal_closed(&state, &scope, &deal).await;
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: deal })))
}

/// GET /api/v1/deals/{id}
pub async fn get_deal(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Deal>>> {
    let deal = DealRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Deal", id))?;
    Ok(Json(DataResponse { data: deal }))
}

/// PUT /api/v1/deals/{id}
///
/// Closed deals cannot change stage. Moving to a new stage without an
/// explicit probability resets it to the stage default.
pub async fn update_deal(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateDeal>,
) -> AppResult<Json<DataResponse<Deal>>> {
    scope.require(Permission::WriteCrm)?;

    let existing = DealRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Deal", id))?;

    if let Some(title) = &input.title {
        require_text("Title", title, MAX_NAME_LENGTH)?;
    }
    optional_text("Notes", input.notes.as_deref(), MAX_NOTES_LENGTH)?;
    if let Some(stage) = &input.stage {
        validate_stage_change(&existing.stage, stage)?;
        if stage != &existing.stage && input.probability.is_none() {
            input.probability = Some(default_probability(stage));
        }
    }
    if let Some(probability) = input.probability {
        validate_probability(probability)?;
    }
    if let Some(value) = input.value_cents {
        validate_deal_value(value)?;
    }
    if let Some(currency) = &input.currency {
        validate_currency(currency)?;
    }
    ensure_customer(&state.pool, scope.tenant_id, input.customer_id).await?;
    ensure_member(&state.pool, scope.tenant_id, input.owner_user_id, "owner_user_id").await?;

    let Some(deal) = DealRepo::update(&state.pool, scope.tenant_id, id, &input).await? else {
        // Closed (or deleted) since it was read.
        let current = DealRepo::find_by_id(&state.pool, scope.tenant_id, id)
            .await?
            .ok_or(AppError::not_found("Deal", id))?;
        if let Some(stage) = &input.stage {
            validate_stage_change(&current.stage, stage)?;
        }
        return Err(CoreError::Conflict(format!("Deal {id} changed during the update")).into());
    };

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_UPDATE,
            entity_types::DEAL,
            Some(id),
            json!({
                "from_stage": existing.stage,
                "stage": deal.stage,
                "value_cents": input.value_cents,
                "probability": input.probability,
            }),
        )
        .await;

    if deal.stage == STAGE_CLOSED_WON && existing.stage != STAGE_CLOSED_WON {
        publish_deal_closed(&state, &scope, &deal).await;
    }

    Ok(Json(DataResponse { data: deal }))
}

/// DELETE /api/v1/deals/{id}
pub async fn delete_deal(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope.require(Permission::WriteCrm)?;

    if !DealRepo::soft_delete(&state.pool, scope.tenant_id, id).await? {
        return Err(AppError::not_found("Deal", id));
    }

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(action_types::ENTITY_DELETE, entity_types::DEAL, Some(id), json!({}))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A referenced customer must exist in the same tenant.
async fn ensure_customer(pool: &DbPool, tenant_id: DbId, customer_id: Option<DbId>) -> AppResult<()> {
    if let Some(customer_id) = customer_id {
        CustomerRepo::find_by_id(pool, tenant_id, customer_id)
            .await?
            .ok_or(AppError::not_found("Customer", customer_id))?;
    }
    Ok(())
}

async fn publish_deal_closed(state: &AppState, scope: &TenantScope, deal: &Deal) {
    state
        .events
        .publish_logged(
            PlatformEvent::new(names::DEAL_CLOSED)
                .with_type(TYPE_DOMAIN)
                .with_tenant(scope.tenant_id)
                .with_source(entity_types::DEAL, deal.id)
                .with_actor(scope.user_id())
                .with_payload(json!({
                    "deal_id": deal.id,
                    "title": deal.title,
                    "value_cents": deal.value_cents,
                    "currency": deal.currency,
                }))
                .notify(deal.owner_user_id),
        )
        .await;
}
