//! Tenant entity model and DTOs.

use atrium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tenants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tenant {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub plan: String,
    pub settings: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub slug: String,
    /// Defaults to `free` if omitted.
    pub plan: Option<String>,
    pub settings: Option<serde_json::Value>,
}

/// DTO for updating a tenant. All fields are optional.
///
/// `settings` is merged into the stored object key by key rather than
/// replacing it.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub plan: Option<String>,
    pub settings: Option<serde_json::Value>,
}
