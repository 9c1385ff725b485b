//! Permission catalogue rows and direct grants.

use atrium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `permissions` catalogue.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PermissionDef {
    pub id: DbId,
    pub key: String,
    pub description: String,
}

/// A direct grant joined with its permission key.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PermissionGrant {
    pub id: DbId,
    pub user_id: DbId,
    pub permission: String,
    pub tenant_id: Option<DbId>,
    pub granted_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// Request body for granting a permission.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGrant {
    pub user_id: DbId,
    pub permission: String,
    /// Omit for a grant that applies in every tenant (super admins only).
    pub tenant_id: Option<DbId>,
}
