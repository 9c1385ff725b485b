//! Handlers for the audit log: query, export, and chain verification.

use atrium_core::audit::verify_chain;
use atrium_core::permissions::Permission;
use atrium_db::models::audit::{AuditLog, AuditLogPage, AuditQuery, IntegrityCheckResult};
use atrium_db::repositories::AuditLogRepo;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireSuperAdmin;
use crate::middleware::tenant::TenantScope;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default export window when `from` is omitted.
const DEFAULT_EXPORT_DAYS: i64 = 30;

/// Query parameters for audit log export.
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub format: Option<String>,
}

/// Parse an optional RFC 3339 timestamp, with a fallback.
fn parse_timestamp(
    s: &Option<String>,
    fallback: chrono::DateTime<chrono::Utc>,
) -> AppResult<chrono::DateTime<chrono::Utc>> {
    match s {
        Some(v) => v
            .parse::<chrono::DateTime<chrono::Utc>>()
            .map_err(|_| AppError::BadRequest(format!("Invalid timestamp '{v}'"))),
        None => Ok(fallback),
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// GET /api/v1/audit-logs
///
/// Filtered, paginated view of the tenant's audit log. Needs `audit.read`.
pub async fn query_audit_logs(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<DataResponse<AuditLogPage>>> {
    scope.require(Permission::ReadAudit)?;

    let items = AuditLogRepo::query(&state.pool, scope.tenant_id, &query).await?;
    let total = AuditLogRepo::count(&state.pool, scope.tenant_id, &query).await?;

    Ok(Json(DataResponse {
        data: AuditLogPage { items, total },
    }))
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// GET /api/v1/audit-logs/export?format=csv|json&from=X&to=Y
pub async fn export_audit_logs(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    scope.require(Permission::ReadAudit)?;

    let now = chrono::Utc::now();
    let from = parse_timestamp(&params.from, now - chrono::Duration::days(DEFAULT_EXPORT_DAYS))?;
    let to = parse_timestamp(&params.to, now)?;
    if to < from {
        return Err(AppError::BadRequest("'to' must not be before 'from'".into()));
    }

    let logs = AuditLogRepo::export_range(&state.pool, scope.tenant_id, from, to).await?;

    match params.format.as_deref().unwrap_or("json") {
        "json" => Ok(Json(DataResponse { data: logs }).into_response()),
        "csv" => Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"audit-logs.csv\"",
                ),
            ],
            render_csv(&logs),
        )
            .into_response()),
        other => Err(AppError::BadRequest(format!(
            "Unsupported export format '{other}'; use 'json' or 'csv'"
        ))),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(logs: &[AuditLog]) -> String {
    let mut out = String::from(
        "id,timestamp,user_id,request_id,action_type,entity_type,entity_id,ip_address,user_agent,details\n",
    );
    for log in logs {
        let details = log
            .details_json
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        let row = [
            log.id.to_string(),
            log.timestamp.to_rfc3339(),
            log.user_id.map_or(String::new(), |id| id.to_string()),
            log.request_id.clone().unwrap_or_default(),
            log.action_type.clone(),
            log.entity_type.clone().unwrap_or_default(),
            log.entity_id.map_or(String::new(), |id| id.to_string()),
            log.ip_address.clone().unwrap_or_default(),
            log.user_agent.clone().unwrap_or_default(),
            details,
        ];
        let line: Vec<String> = row.iter().map(|v| csv_field(v)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Integrity check
// ---------------------------------------------------------------------------

/// GET /api/v1/audit-logs/integrity-check
///
/// Walk the whole hash chain (all tenants). Super admin only.
pub async fn check_integrity(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
) -> AppResult<Json<DataResponse<IntegrityCheckResult>>> {
    let chain = AuditLogRepo::load_chain(&state.pool).await?;
    let verification = verify_chain(&chain);

    if !verification.is_valid() {
        tracing::error!(
            first_break = ?verification.first_break,
            verified_entries = verification.verified_entries,
            user_id = admin.user_id(),
            "Audit chain integrity check failed",
        );
    }

    Ok(Json(DataResponse {
        data: IntegrityCheckResult::from(verification),
    }))
}
