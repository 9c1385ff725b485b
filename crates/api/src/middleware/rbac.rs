//! Role-gated extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::principal::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Requires an active `super_admin`. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireSuperAdmin(admin): RequireSuperAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireSuperAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        if !principal.is_super_admin() {
            return Err(AppError::forbidden("Platform administrator role required"));
        }
        Ok(RequireSuperAdmin(principal))
    }
}
