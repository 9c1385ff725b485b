//! Request handlers, one submodule per resource.
//!
//! Mutating handlers follow the same order: resolve the caller's tenant
//! scope, check the permission, validate input, run the repository call,
//! record the audit entry, then respond.

pub mod admin;
pub mod analytics;
pub mod audit;
pub mod auth;
pub mod content;
pub mod customers;
pub mod deals;
pub mod employees;
pub mod events;
pub mod leads;
pub mod notifications;
pub mod permissions;
pub mod projects;
pub mod tasks;
pub mod tenants;
pub mod users;

use atrium_core::error::CoreError;
use atrium_core::types::DbId;
use atrium_db::repositories::UserRepo;
use atrium_db::DbPool;

use crate::error::AppResult;

/// Reject a user reference that is not an active member of `tenant_id`.
///
/// `None` passes; `field` names the offending input in the error.
pub(crate) async fn ensure_member(
    pool: &DbPool,
    tenant_id: DbId,
    user_id: Option<DbId>,
    field: &str,
) -> AppResult<()> {
    let Some(user_id) = user_id else {
        return Ok(());
    };
    let members = UserRepo::filter_tenant_members(pool, tenant_id, &[user_id]).await?;
    if members.contains(&user_id) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field}: user {user_id} is not an active member of this tenant"
        ))
        .into())
    }
}

/// Validate an optional email field, returning it normalized.
pub(crate) fn normalize_optional_email(email: Option<&str>) -> AppResult<Option<String>> {
    match email.map(str::trim).filter(|e| !e.is_empty()) {
        Some(e) => {
            let normalized = atrium_core::users::normalize_email(e);
            atrium_core::users::validate_email(&normalized)?;
            Ok(Some(normalized))
        }
        None => Ok(None),
    }
}
