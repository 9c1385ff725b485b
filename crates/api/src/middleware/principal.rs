//! The authenticated caller together with their current permissions.

use atrium_core::permissions::{AccessProfile, Permission};
use atrium_core::types::DbId;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::policy;
use crate::state::AppState;

/// An authenticated, still-active user and their access profile.
///
/// The profile is loaded from the database on every request, so a
/// deactivated account or a revoked grant takes effect immediately even
/// while an old access token is still valid.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: AuthUser,
    pub profile: AccessProfile,
}

impl Principal {
    pub fn user_id(&self) -> DbId {
        self.user.user_id
    }

    pub fn is_super_admin(&self) -> bool {
        self.profile.is_super_admin()
    }

    /// Fail with 403 unless the profile allows `permission` in `tenant_id`.
    pub fn require(&self, permission: Permission, tenant_id: Option<DbId>) -> AppResult<()> {
        policy::ensure(&self.profile, permission, tenant_id)
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let profile = state
            .gate
            .profile(user.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

        if !profile.is_active {
            return Err(AppError::unauthorized("Account is inactive"));
        }

        Ok(Principal { user, profile })
    }
}
