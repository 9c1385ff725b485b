//! Tenant resolution for tenant-scoped routes.
//!
//! Regular users always act inside their home tenant. Super admins have no
//! home tenant and pick one per request with the `X-Tenant-Id` header.

use atrium_core::permissions::Permission;
use atrium_core::types::DbId;
use atrium_db::repositories::TenantRepo;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::principal::Principal;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// The caller plus the tenant every query in this request is scoped to.
#[derive(Debug, Clone)]
pub struct TenantScope {
    pub principal: Principal,
    pub tenant_id: DbId,
}

impl TenantScope {
    pub fn user_id(&self) -> DbId {
        self.principal.user_id()
    }

    pub fn is_super_admin(&self) -> bool {
        self.principal.is_super_admin()
    }

    /// Fail with 403 unless the caller holds `permission` in this tenant.
    pub fn require(&self, permission: Permission) -> AppResult<()> {
        self.principal.require(permission, Some(self.tenant_id))
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.principal
            .profile
            .allows(permission, Some(self.tenant_id))
    }
}

fn header_tenant(parts: &Parts) -> AppResult<Option<DbId>> {
    let Some(raw) = parts.headers.get(TENANT_HEADER) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|v| v.trim().parse::<DbId>().ok())
        .map(Some)
        .ok_or_else(|| AppError::BadRequest("X-Tenant-Id must be a numeric tenant id".into()))
}

impl FromRequestParts<AppState> for TenantScope {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        let requested = header_tenant(parts)?;

        let tenant_id = if principal.is_super_admin() {
            let tenant_id = requested.ok_or_else(|| {
                AppError::BadRequest(
                    "X-Tenant-Id header is required for platform administrators".into(),
                )
            })?;
            TenantRepo::find_by_id(&state.pool, tenant_id)
                .await?
                .ok_or(AppError::not_found("Tenant", tenant_id))?;
            tenant_id
        } else {
            let home = principal
                .profile
                .home_tenant_id
                .ok_or_else(|| AppError::forbidden("User does not belong to a tenant"))?;
            if requested.is_some_and(|t| t != home) {
                return Err(AppError::forbidden("Access to this tenant is not allowed"));
            }
            if !TenantRepo::is_active(&state.pool, home).await? {
                return Err(AppError::forbidden("Tenant is inactive"));
            }
            home
        };

        Ok(TenantScope {
            principal,
            tenant_id,
        })
    }
}
