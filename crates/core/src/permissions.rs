//! Permission catalogue and grant evaluation.
//!
//! The database stores two kinds of grants: role defaults (`role_permissions`)
//! and direct per-user grants (`permission_grants`). [`AccessProfile`] holds
//! both for one user and answers "may this user do X in tenant T?".
//!
//! Rules, in order:
//!
//! 1. An inactive user is denied everything.
//! 2. `super_admin` is allowed everything.
//! 3. Role defaults only apply inside the user's home tenant.
//! 4. A direct grant without a tenant applies everywhere; a tenant-scoped
//!    grant applies to that tenant only.
//! 5. Any matching grant wins. No match means deny.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::ROLE_SUPER_ADMIN;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Permission keys
// ---------------------------------------------------------------------------

/// Every permission the gate knows about. Keys match the `permissions` seed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "tenants.manage")]
    ManageTenants,
    #[serde(rename = "tenant.configure")]
    ConfigureTenant,
    #[serde(rename = "users.manage")]
    ManageUsers,
    #[serde(rename = "permissions.grant")]
    GrantPermissions,
    #[serde(rename = "audit.read")]
    ReadAudit,
    #[serde(rename = "events.publish")]
    PublishEvents,
    #[serde(rename = "crm.write")]
    WriteCrm,
    #[serde(rename = "projects.write")]
    WriteProjects,
    #[serde(rename = "hr.write")]
    WriteHr,
    #[serde(rename = "content.write")]
    WriteContent,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::ManageTenants,
        Permission::ConfigureTenant,
        Permission::ManageUsers,
        Permission::GrantPermissions,
        Permission::ReadAudit,
        Permission::PublishEvents,
        Permission::WriteCrm,
        Permission::WriteProjects,
        Permission::WriteHr,
        Permission::WriteContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageTenants => "tenants.manage",
            Permission::ConfigureTenant => "tenant.configure",
            Permission::ManageUsers => "users.manage",
            Permission::GrantPermissions => "permissions.grant",
            Permission::ReadAudit => "audit.read",
            Permission::PublishEvents => "events.publish",
            Permission::WriteCrm => "crm.write",
            Permission::WriteProjects => "projects.write",
            Permission::WriteHr => "hr.write",
            Permission::WriteContent => "content.write",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown permission '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Grants and profile
// ---------------------------------------------------------------------------

/// A direct grant row, reduced to what evaluation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectGrant {
    pub permission: String,
    /// `None` means the grant is platform-wide.
    pub tenant_id: Option<DbId>,
}

/// Everything needed to evaluate permissions for a single user.
#[derive(Debug, Clone)]
pub struct AccessProfile {
    pub user_id: DbId,
    pub is_active: bool,
    pub role: String,
    /// The tenant the user belongs to (`None` for platform-level users).
    pub home_tenant_id: Option<DbId>,
    /// Permission keys granted by the user's role.
    pub role_permissions: Vec<String>,
    pub grants: Vec<DirectGrant>,
}

impl AccessProfile {
    pub fn is_super_admin(&self) -> bool {
        self.is_active && self.role == ROLE_SUPER_ADMIN
    }

    /// Evaluate `permission` against `tenant_id` (`None` = platform scope).
    pub fn allows(&self, permission: Permission, tenant_id: Option<DbId>) -> bool {
        if !self.is_active {
            return false;
        }
        if self.role == ROLE_SUPER_ADMIN {
            return true;
        }

        let key = permission.as_str();

        let role_match = tenant_id.is_some()
            && tenant_id == self.home_tenant_id
            && self.role_permissions.iter().any(|p| p == key);
        if role_match {
            return true;
        }

        self.grants.iter().any(|g| {
            g.permission == key
                && match g.tenant_id {
                    None => true,
                    Some(scope) => Some(scope) == tenant_id,
                }
        })
    }

    /// The permissions this user effectively holds in `tenant_id`.
    pub fn effective(&self, tenant_id: Option<DbId>) -> Vec<Permission> {
        Permission::ALL
            .iter()
            .copied()
            .filter(|p| self.allows(*p, tenant_id))
            .collect()
    }

    /// Whether the user may see data belonging to `tenant_id` at all.
    pub fn is_member_of(&self, tenant_id: DbId) -> bool {
        self.is_super_admin() || (self.is_active && self.home_tenant_id == Some(tenant_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
