//! Writes audit entries for mutating requests.
//!
//! Recording happens after the mutation has committed. A failed append is
//! logged and swallowed so the caller still gets the result of the change.

use atrium_core::audit::redact_sensitive_fields;
use atrium_core::types::DbId;
use atrium_db::models::audit::CreateAuditLog;
use atrium_db::repositories::AuditLogRepo;
use atrium_db::DbPool;

use crate::middleware::request_meta::RequestMeta;
use crate::middleware::tenant::TenantScope;

/// Audit context for one request: who acted, in which tenant, from where.
pub struct AuditRecorder<'a> {
    pool: &'a DbPool,
    meta: &'a RequestMeta,
    tenant_id: Option<DbId>,
    user_id: Option<DbId>,
}

impl<'a> AuditRecorder<'a> {
    pub fn new(
        pool: &'a DbPool,
        meta: &'a RequestMeta,
        tenant_id: Option<DbId>,
        user_id: Option<DbId>,
    ) -> Self {
        Self {
            pool,
            meta,
            tenant_id,
            user_id,
        }
    }

    /// Recorder for a tenant-scoped request.
    pub fn for_scope(pool: &'a DbPool, meta: &'a RequestMeta, scope: &TenantScope) -> Self {
        Self::new(pool, meta, Some(scope.tenant_id), Some(scope.user_id()))
    }

    /// Append one entry. `details` is redacted before it is stored.
    pub async fn record(
        &self,
        action_type: &str,
        entity_type: &str,
        entity_id: Option<DbId>,
        details: serde_json::Value,
    ) {
        let details_json = (!details.is_null()).then(|| redact_sensitive_fields(&details));
        let entry = CreateAuditLog {
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            request_id: self.meta.request_id.clone(),
            action_type: action_type.to_string(),
            entity_type: Some(entity_type.to_string()),
            entity_id,
            details_json,
            ip_address: self.meta.ip_address.clone(),
            user_agent: self.meta.user_agent.clone(),
        };

        if let Err(e) = AuditLogRepo::append(self.pool, &entry).await {
            tracing::error!(
                error = %e,
                action_type,
                entity_type,
                entity_id,
                tenant_id = self.tenant_id,
                "Failed to record audit entry",
            );
        }
    }
}
