//! Generic field checks reused by the per-domain validation modules.

use crate::error::CoreError;

/// Require a non-blank string of at most `max` characters.
pub fn require_text(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    optional_text(field, Some(value), max)
}

/// Length check for an optional free-text field.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<(), CoreError> {
    match value {
        Some(v) if v.chars().count() > max => Err(CoreError::Validation(format!(
            "{field} must not exceed {max} characters"
        ))),
        _ => Ok(()),
    }
}

/// Require `value` to be one of `allowed`.
pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), CoreError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid {field} '{value}'. Must be one of: {}",
            allowed.join(", ")
        )))
    }
}

/// Require an integer percentage in `0..=100`.
pub fn percentage(field: &str, value: i32) -> Result<(), CoreError> {
    if (0..=100).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be between 0 and 100, got {value}"
        )))
    }
}
