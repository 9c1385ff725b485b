//! Users. Platform administrators have no home tenant; everyone else
//! belongs to exactly one.

use atrium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A `users` row, password hash included. Never serialized; handlers
/// return [`UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub tenant_id: Option<DbId>,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub role_id: DbId,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn is_platform_user(&self) -> bool {
        self.tenant_id.is_none()
    }

    /// Whether a login lockout is still running at `now`.
    pub fn is_locked_at(&self, now: Timestamp) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

/// A user joined with the name of their role.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub tenant_id: Option<DbId>,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub role_id: DbId,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Insert values; `password_hash` is already an Argon2 PHC string.
#[derive(Debug)]
pub struct CreateUser {
    pub tenant_id: Option<DbId>,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub role_id: DbId,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role_id: Option<DbId>,
    pub is_active: Option<bool>,
}
