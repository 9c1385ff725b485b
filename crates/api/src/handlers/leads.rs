//! Handlers for the `/leads` resource, including conversion.

use atrium_core::audit::{action_types, entity_types};
use atrium_core::crm::{
    default_probability, validate_currency, validate_deal_value, validate_lead_convertible,
    validate_lead_score, validate_lead_status, validate_lead_transition, LEAD_CONVERTED,
    MAX_NAME_LENGTH, MAX_NOTES_LENGTH, STAGE_QUALIFICATION,
};
use atrium_core::error::CoreError;
use atrium_core::events::{names, TYPE_DOMAIN};
use atrium_core::fields::{optional_text, require_text};
use atrium_core::permissions::Permission;
use atrium_core::types::DbId;
use atrium_db::models::lead::{ConvertLead, CreateLead, Lead, LeadConversion, UpdateLead};
use atrium_db::repositories::deal_repo::NewDeal;
use atrium_db::repositories::LeadRepo;
use atrium_events::PlatformEvent;
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

const DEFAULT_CURRENCY: &str = "USD";

/// GET /api/v1/leads
pub async fn list_leads(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Lead>>>> {
    let (limit, offset) = params.page();
    let leads = LeadRepo::list(
        &state.pool,
        scope.tenant_id,
        params.status.as_deref(),
        params.search_pattern().as_deref(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: leads }))
}

/// POST /api/v1/leads
pub async fn create_lead(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Json(mut input): Json<CreateLead>,
) -> AppResult<(StatusCode, Json<DataResponse<Lead>>)> {
    scope.require(Permission::WriteCrm)?;

    require_text("Name", &input.name, MAX_NAME_LENGTH)?;
    optional_text("Notes", input.notes.as_deref(), MAX_NOTES_LENGTH)?;
    if let Some(status) = &input.status {
        validate_lead_status(status)?;
        if status == LEAD_CONVERTED {
            return Err(CoreError::Validation(
                "Leads are converted through the convert endpoint".to_string(),
            )
            .into());
        }
    }
    if let Some(score) = input.score {
        validate_lead_score(score)?;
    }
    input.email = normalize_optional_email(input.email.as_deref())?;
    ensure_member(&state.pool, scope.tenant_id, input.owner_user_id, "owner_user_id").await?;

    let lead = LeadRepo::create(&state.pool, scope.tenant_id, scope.user_id(), &input).await?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_CREATE,
            entity_types::LEAD,
            Some(lead.id),
            json!({ "name": lead.name, "status": lead.status, "score": lead.score }),
        )
        .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: lead })))
}

/// GET /api/v1/leads/{id}
pub async fn get_lead(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Lead>>> {
    let lead = LeadRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Lead", id))?;
    Ok(Json(DataResponse { data: lead }))
}

/// PUT /api/v1/leads/{id}
pub async fn update_lead(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateLead>,
) -> AppResult<Json<DataResponse<Lead>>> {
    scope.require(Permission::WriteCrm)?;

    let existing = LeadRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Lead", id))?;

    if let Some(name) = &input.name {
        require_text("Name", name, MAX_NAME_LENGTH)?;
    }
    optional_text("Notes", input.notes.as_deref(), MAX_NOTES_LENGTH)?;
    if let Some(status) = &input.status {
        validate_lead_status(status)?;
        validate_lead_transition(&existing.status, status)?;
    }
    if let Some(score) = input.score {
        validate_lead_score(score)?;
    }
    input.email = normalize_optional_email(input.email.as_deref())?;
    ensure_member(&state.pool, scope.tenant_id, input.owner_user_id, "owner_user_id").await?;

    let Some(lead) = LeadRepo::update(&state.pool, scope.tenant_id, id, &input).await? else {
        // Converted (or deleted) since it was read.
        let current = LeadRepo::find_by_id(&state.pool, scope.tenant_id, id)
            .await?
            .ok_or(AppError::not_found("Lead", id))?;
        if let Some(status) = &input.status {
            validate_lead_transition(&current.status, status)?;
        }
        return Err(CoreError::Conflict(format!("Lead {id} changed during the update")).into());
    };

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::ENTITY_UPDATE,
            entity_types::LEAD,
            Some(id),
            json!({ "from_status": existing.status, "status": input.status, "score": input.score }),
        )
        .await;

    Ok(Json(DataResponse { data: lead }))
}

/// DELETE /api/v1/leads/{id}
pub async fn delete_lead(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope.require(Permission::WriteCrm)?;

    if !LeadRepo::soft_delete(&state.pool, scope.tenant_id, id).await? {
        return Err(AppError::not_found("Lead", id));
    }

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(action_types::ENTITY_DELETE, entity_types::LEAD, Some(id), json!({}))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/leads/{id}/convert
///
/// Turns the lead into a customer and, when `deal` is given, opens a deal
/// for that customer. Everything happens in one transaction; a lead that was
/// already converted yields 409.
pub async fn convert_lead(
    State(state): State<AppState>,
    meta: RequestMeta,
    scope: TenantScope,
    Path(id): Path<DbId>,
    Json(input): Json<ConvertLead>,
) -> AppResult<(StatusCode, Json<DataResponse<LeadConversion>>)> {
    scope.require(Permission::WriteCrm)?;

    let existing = LeadRepo::find_by_id(&state.pool, scope.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Lead", id))?;
    validate_lead_convertible(&existing.status)?;

    let currency = input
        .deal
        .as_ref()
        .and_then(|d| d.currency.clone())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let new_deal = match &input.deal {
        Some(deal) => {
            require_text("Deal title", &deal.title, MAX_NAME_LENGTH)?;
            let value_cents = deal.value_cents.unwrap_or(0);
            validate_deal_value(value_cents)?;
            validate_currency(&currency)?;
            Some(NewDeal {
                customer_id: None,
                title: &deal.title,
                stage: STAGE_QUALIFICATION,
                value_cents,
                currency: &currency,
                probability: default_probability(STAGE_QUALIFICATION),
                expected_close_date: deal.expected_close_date,
                notes: None,
                owner_user_id: None,
            })
        }
        None => None,
    };

    let conversion = LeadRepo::convert(&state.pool, scope.tenant_id, id, scope.user_id(), new_deal)
        .await?
        .ok_or_else(|| CoreError::Conflict("Lead has already been converted".to_string()))?;

    AuditRecorder::for_scope(&state.pool, &meta, &scope)
        .record(
            action_types::LEAD_CONVERT,
            entity_types::LEAD,
            Some(id),
            json!({
                "customer_id": conversion.customer.id,
                "deal_id": conversion.deal.as_ref().map(|d| d.id),
            }),
        )
        .await;

    state
        .events
        .publish_logged(
            PlatformEvent::new(names::LEAD_CONVERTED)
                .with_type(TYPE_DOMAIN)
                .with_tenant(scope.tenant_id)
                .with_source(entity_types::LEAD, id)
                .with_actor(scope.user_id())
                .with_payload(json!({
                    "lead_id": id,
                    "customer_id": conversion.customer.id,
                    "deal_id": conversion.deal.as_ref().map(|d| d.id),
                }))
                .notify(conversion.lead.owner_user_id),
        )
        .await;

    tracing::info!(
        tenant_id = scope.tenant_id,
        user_id = scope.user_id(),
        lead_id = id,
        customer_id = conversion.customer.id,
        "Lead converted",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: conversion })))
}
