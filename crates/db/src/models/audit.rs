//! Audit trail rows. There is no `updated_at`: a trigger rejects every
//! UPDATE and DELETE on `audit_logs`.

use atrium_core::audit::ChainVerification;
use atrium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One recorded action. `integrity_hash` chains it to the entry before it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub timestamp: Timestamp,
    pub tenant_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub request_id: Option<String>,
    pub action_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub integrity_hash: Option<String>,
    pub created_at: Timestamp,
}

/// Values for a new entry. The repository stamps the time and computes
/// the hash while holding the chain lock.
#[derive(Debug, Clone, Default)]
pub struct CreateAuditLog {
    pub tenant_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub request_id: Option<String>,
    pub action_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Filters for `GET /audit-logs`; always applied within one tenant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub user_id: Option<DbId>,
    pub action_type: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub items: Vec<AuditLog>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityCheckResult {
    /// Entries that matched before the walk stopped.
    pub verified_entries: i64,
    pub chain_valid: bool,
    pub first_break: Option<DbId>,
}

impl From<ChainVerification> for IntegrityCheckResult {
    fn from(v: ChainVerification) -> Self {
        Self {
            chain_valid: v.is_valid(),
            verified_entries: v.verified_entries,
            first_break: v.first_break,
        }
    }
}
