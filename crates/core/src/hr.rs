//! Employee records.

use crate::error::CoreError;
use crate::fields;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_TITLE_LENGTH: usize = 150;
pub const MAX_DEPARTMENT_LENGTH: usize = 100;

pub const EMPLOYMENT_ACTIVE: &str = "active";
pub const EMPLOYMENT_ON_LEAVE: &str = "on_leave";
pub const EMPLOYMENT_TERMINATED: &str = "terminated";

pub const EMPLOYMENT_STATUSES: &[&str] =
    &[EMPLOYMENT_ACTIVE, EMPLOYMENT_ON_LEAVE, EMPLOYMENT_TERMINATED];

pub fn validate_employment_status(status: &str) -> Result<(), CoreError> {
    fields::one_of("employment status", status, EMPLOYMENT_STATUSES)
}

pub fn validate_employee_name(first_name: &str, last_name: &str) -> Result<(), CoreError> {
    fields::require_text("First name", first_name, MAX_NAME_LENGTH)?;
    fields::require_text("Last name", last_name, MAX_NAME_LENGTH)
}

/// Terminated employees stay terminated; rehiring creates a new record.
pub fn validate_employment_change(current: &str, next: &str) -> Result<(), CoreError> {
    validate_employment_status(next)?;
    if current == EMPLOYMENT_TERMINATED && next != EMPLOYMENT_TERMINATED {
        return Err(CoreError::Validation(
            "A terminated employee cannot be reactivated".to_string(),
        ));
    }
    Ok(())
}
