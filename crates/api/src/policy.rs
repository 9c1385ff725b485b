//! Permission gate consulted before every mutating operation.
//!
//! Every check reloads the user's access profile from the database; results
//! are never cached. Evaluation itself is [`AccessProfile::allows`].

use atrium_core::permissions::{AccessProfile, Permission};
use atrium_core::types::DbId;
use atrium_db::repositories::PermissionRepo;
use atrium_db::DbPool;

use crate::error::{AppError, AppResult};

/// Boolean permission predicates over the role and grant tables.
///
/// An unknown user is indistinguishable from one that lacks the permission.
#[derive(Clone)]
pub struct PermissionGate {
    pool: DbPool,
}

impl PermissionGate {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Current access profile, `None` for an unknown user.
    pub async fn profile(&self, user_id: DbId) -> Result<Option<AccessProfile>, sqlx::Error> {
        PermissionRepo::load_profile(&self.pool, user_id).await
    }

    pub async fn is_super_admin(&self, user_id: DbId) -> Result<bool, sqlx::Error> {
        Ok(self
            .profile(user_id)
            .await?
            .is_some_and(|p| p.is_super_admin()))
    }

    pub async fn can_manage_users(&self, user_id: DbId, tenant_id: DbId) -> Result<bool, sqlx::Error> {
        self.check(user_id, Permission::ManageUsers, Some(tenant_id)).await
    }

    pub async fn can_manage_tenants(&self, user_id: DbId) -> Result<bool, sqlx::Error> {
        self.check(user_id, Permission::ManageTenants, None).await
    }

    /// Whether `user_id` holds `permission` in `tenant_id` (`None` = platform scope).
    pub async fn check(
        &self,
        user_id: DbId,
        permission: Permission,
        tenant_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        Ok(self
            .profile(user_id)
            .await?
            .is_some_and(|p| p.allows(permission, tenant_id)))
    }

    /// Like [`check`](Self::check) but fails with 403.
    pub async fn require(
        &self,
        user_id: DbId,
        permission: Permission,
        tenant_id: Option<DbId>,
    ) -> AppResult<()> {
        if self.check(user_id, permission, tenant_id).await? {
            Ok(())
        } else {
            Err(denied(permission))
        }
    }
}

/// Check an already-loaded profile.
pub fn ensure(profile: &AccessProfile, permission: Permission, tenant_id: Option<DbId>) -> AppResult<()> {
    if profile.allows(permission, tenant_id) {
        Ok(())
    } else {
        Err(denied(permission))
    }
}

fn denied(permission: Permission) -> AppError {
    AppError::forbidden(format!("Missing permission '{permission}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use atrium_core::error::CoreError;
    use atrium_core::roles::ROLE_MEMBER;

    #[test]
    fn ensure_reports_the_missing_key() {
        let profile = AccessProfile {
            user_id: 3,
            is_active: true,
            role: ROLE_MEMBER.into(),
            home_tenant_id: Some(1),
            role_permissions: vec!["projects.write".into()],
            grants: vec![],
        };
        assert!(ensure(&profile, Permission::WriteProjects, Some(1)).is_ok());
        let err = ensure(&profile, Permission::GrantPermissions, Some(1)).unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::Forbidden(msg)) if msg.contains("permissions.grant"));
    }
}
