//! User field validation and deletion anonymisation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::types::DbId;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum password length enforced on user creation and password reset.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Domain used for anonymised addresses. `.invalid` is reserved by RFC 2606.
pub const ANONYMIZED_EMAIL_DOMAIN: &str = "anonymized.invalid";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid username regex"));

/// Lowercase and trim an email so uniqueness checks are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if email.len() > MAX_EMAIL_LENGTH || !EMAIL_RE.is_match(email) {
        return Err(CoreError::Validation(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), CoreError> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(CoreError::Validation(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(CoreError::Validation(
            "Username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }
    Ok(())
}

/// Validate that a password meets minimum strength requirements.
pub fn validate_password_strength(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// Replacement address written when a user is deleted.
///
/// Embeds the user id so the row stays unique under `uq_users_email`, plus a
/// random token so the original address cannot be guessed from it.
pub fn anonymized_email(user_id: DbId) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("deleted-{user_id}-{}@{ANONYMIZED_EMAIL_DOMAIN}", &token[..12])
}

/// Replacement username written when a user is deleted.
pub fn anonymized_username(user_id: DbId) -> String {
    format!("deleted-user-{user_id}")
}

pub fn is_anonymized_email(email: &str) -> bool {
    email.starts_with("deleted-") && email.ends_with(&format!("@{ANONYMIZED_EMAIL_DOMAIN}"))
}
