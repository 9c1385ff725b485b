//! Event naming rules and the names emitted by the platform itself.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::fields;

pub const MAX_EVENT_NAME_LENGTH: usize = 100;

/// Events whose name starts with this prefix also notify every active
/// super admin.
pub const SYSTEM_PREFIX: &str = "system.";

pub const TYPE_DOMAIN: &str = "domain";
pub const TYPE_SYSTEM: &str = "system";
pub const TYPE_NOTIFICATION: &str = "notification";

pub const EVENT_TYPES: &[&str] = &[TYPE_DOMAIN, TYPE_SYSTEM, TYPE_NOTIFICATION];

/// Names of events published by the handlers.
pub mod names {
    pub const TASK_ASSIGNED: &str = "task.assigned";
    pub const LEAD_CONVERTED: &str = "lead.converted";
    pub const DEAL_CLOSED: &str = "deal.closed";
    pub const CONTENT_PUBLISHED: &str = "content.published";
    pub const PERMISSION_GRANTED: &str = "permission.granted";
    pub const TENANT_CREATED: &str = "system.tenant_created";
    pub const TENANT_DEACTIVATED: &str = "system.tenant_deactivated";
}

static EVENT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)+$").expect("valid event name regex")
});

/// Names are dot-separated lowercase segments with at least two segments,
/// e.g. `task.assigned`.
pub fn validate_event_name(name: &str) -> Result<(), CoreError> {
    if name.len() > MAX_EVENT_NAME_LENGTH || !EVENT_NAME_RE.is_match(name) {
        return Err(CoreError::Validation(format!(
            "Event name '{name}' must be dot-separated lowercase segments, e.g. 'task.assigned'"
        )));
    }
    Ok(())
}

pub fn validate_event_type(event_type: &str) -> Result<(), CoreError> {
    fields::one_of("event type", event_type, EVENT_TYPES)
}

pub fn is_system_event(name: &str) -> bool {
    name.starts_with(SYSTEM_PREFIX)
}

/// Payload and meta must be JSON objects.
pub fn validate_object(field: &str, value: &serde_json::Value) -> Result<(), CoreError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("{field} must be a JSON object")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_shape() {
        assert!(validate_event_name(names::TASK_ASSIGNED).is_ok());
        assert!(validate_event_name("system.maintenance_window").is_ok());
        assert!(validate_event_name("task").is_err());
        assert!(validate_event_name("Task.Assigned").is_err());
        assert!(validate_event_name("task..assigned").is_err());
    }

    #[test]
    fn system_prefix() {
        assert!(is_system_event(names::TENANT_CREATED));
        assert!(!is_system_event("systemic.event"));
        assert!(!is_system_event(names::LEAD_CONVERTED));
    }

    #[test]
    fn payload_must_be_object() {
        assert!(validate_object("payload", &serde_json::json!({"a": 1})).is_ok());
        assert!(validate_object("payload", &serde_json::json!([1, 2])).is_err());
    }
}
