//! First-run creation of a platform administrator.

use atrium_core::roles::ROLE_ID_SUPER_ADMIN;
use atrium_core::users::{normalize_email, validate_email, validate_password_strength};
use atrium_db::models::user::CreateUser;
use atrium_db::repositories::UserRepo;
use atrium_db::DbPool;

use crate::auth::password::hash_password;
use crate::config::BootstrapAdmin;

/// Create the configured super admin if no super admin exists yet.
///
/// Returns `Ok(true)` when an account was created. Invalid credentials are
/// reported as an error so startup fails loudly instead of leaving the
/// platform without an administrator.
pub async fn ensure_super_admin(pool: &DbPool, admin: &BootstrapAdmin) -> Result<bool, String> {
    if UserRepo::super_admin_exists(pool)
        .await
        .map_err(|e| format!("Failed to check for super admin: {e}"))?
    {
        tracing::debug!("Super admin already present, skipping bootstrap");
        return Ok(false);
    }

    let email = normalize_email(&admin.email);
    validate_email(&email).map_err(|e| e.to_string())?;
    validate_password_strength(&admin.password).map_err(|e| e.to_string())?;

    let password_hash =
        hash_password(&admin.password).map_err(|e| format!("Failed to hash password: {e}"))?;

    let username = email
        .split('@')
        .next()
        .filter(|s| s.len() >= 3)
        .unwrap_or("platform-admin")
        .to_string();

    let user = UserRepo::create(
        pool,
        &CreateUser {
            tenant_id: None,
            username,
            email,
            display_name: Some("Platform Administrator".into()),
            password_hash,
            role_id: ROLE_ID_SUPER_ADMIN,
        },
    )
    .await
    .map_err(|e| format!("Failed to create super admin: {e}"))?;

    tracing::info!(user_id = user.id, email = %user.email, "Bootstrapped super admin");
    Ok(true)
}
