//! Tenant naming rules and subscription plans.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

pub const MIN_SLUG_LENGTH: usize = 3;
pub const MAX_SLUG_LENGTH: usize = 63;
pub const MAX_TENANT_NAME_LENGTH: usize = 200;

/// Slugs that would collide with platform routes or hostnames.
pub const RESERVED_SLUGS: &[&str] = &["admin", "api", "app", "www", "system", "static"];

pub const PLAN_FREE: &str = "free";
pub const PLAN_STARTER: &str = "starter";
pub const PLAN_BUSINESS: &str = "business";
pub const PLAN_ENTERPRISE: &str = "enterprise";

pub const VALID_PLANS: &[&str] = &[PLAN_FREE, PLAN_STARTER, PLAN_BUSINESS, PLAN_ENTERPRISE];

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

/// Validate a tenant slug: lowercase alphanumerics separated by single hyphens.
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.len() < MIN_SLUG_LENGTH || slug.len() > MAX_SLUG_LENGTH {
        return Err(CoreError::Validation(format!(
            "Slug must be between {MIN_SLUG_LENGTH} and {MAX_SLUG_LENGTH} characters"
        )));
    }
    if !SLUG_RE.is_match(slug) {
        return Err(CoreError::Validation(
            "Slug may only contain lowercase letters, digits, and single hyphens".to_string(),
        ));
    }
    if RESERVED_SLUGS.contains(&slug) {
        return Err(CoreError::Validation(format!("Slug '{slug}' is reserved")));
    }
    Ok(())
}

pub fn validate_tenant_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Tenant name must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TENANT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Tenant name must not exceed {MAX_TENANT_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_plan(plan: &str) -> Result<(), CoreError> {
    if VALID_PLANS.contains(&plan) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid plan '{plan}'. Must be one of: {}",
            VALID_PLANS.join(", ")
        )))
    }
}

/// Tenant settings must be a JSON object so they can be merged key by key.
pub fn validate_settings(settings: &serde_json::Value) -> Result<(), CoreError> {
    if settings.is_object() {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Tenant settings must be a JSON object".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hyphenated_lowercase_slug() {
        assert!(validate_slug("acme-corp-2").is_ok());
    }

    #[test]
    fn rejects_uppercase_and_double_hyphen() {
        assert!(validate_slug("Acme").is_err());
        assert!(validate_slug("acme--corp").is_err());
        assert!(validate_slug("-acme").is_err());
    }

    #[test]
    fn rejects_short_and_reserved_slugs() {
        assert!(validate_slug("ab").is_err());
        let err = validate_slug("admin").unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn tenant_name_must_not_be_blank() {
        assert!(validate_tenant_name("   ").is_err());
        assert!(validate_tenant_name("Acme GmbH").is_ok());
    }

    #[test]
    fn plan_must_be_known() {
        assert!(validate_plan(PLAN_BUSINESS).is_ok());
        assert!(validate_plan("platinum").is_err());
    }

    #[test]
    fn settings_must_be_object() {
        assert!(validate_settings(&serde_json::json!({"locale": "de"})).is_ok());
        assert!(validate_settings(&serde_json::json!([1, 2])).is_err());
    }
}
