//! Persisted platform events.

use atrium_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `event_bus` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub tenant_id: Option<DbId>,
    pub name: String,
    pub event_type: String,
    pub source_entity_type: Option<String>,
    pub source_entity_id: Option<DbId>,
    pub actor_user_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub meta: serde_json::Value,
    pub correlation_id: Option<uuid::Uuid>,
    pub created_at: Timestamp,
}

/// Values for a new `event_bus` row.
#[derive(Debug, Clone)]
pub struct CreateEvent<'a> {
    pub tenant_id: Option<DbId>,
    pub name: &'a str,
    pub event_type: &'a str,
    pub source_entity_type: Option<&'a str>,
    pub source_entity_id: Option<DbId>,
    pub actor_user_id: Option<DbId>,
    pub payload: &'a serde_json::Value,
    pub meta: &'a serde_json::Value,
    pub correlation_id: Option<uuid::Uuid>,
}
