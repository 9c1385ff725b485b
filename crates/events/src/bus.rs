//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`PublishedEvent`]s. It is
//! shared via `Arc<EventBus>` across the application.

use atrium_core::events::{is_system_event, TYPE_DOMAIN};
use atrium_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred on the platform.
///
/// Constructed via [`PlatformEvent::new`] and enriched with the builder
/// methods below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"task.assigned"`.
    pub name: String,

    /// Coarse category: `domain`, `system`, or `notification`.
    pub event_type: String,

    /// Tenant the event belongs to; `None` for platform-level events.
    pub tenant_id: Option<DbId>,

    pub source_entity_type: Option<String>,
    pub source_entity_id: Option<DbId>,

    /// Id of the user that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    /// Caller-supplied metadata (request id, client info, ...).
    pub meta: serde_json::Value,

    /// Links events that belong to the same logical operation.
    pub correlation_id: Option<uuid::Uuid>,

    /// Users that should receive a notification for this event.
    pub notify_user_ids: Vec<DbId>,

    pub timestamp: Timestamp,
}

impl PlatformEvent {
    /// Create a `domain` event with only the required name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            event_type: TYPE_DOMAIN.to_string(),
            tenant_id: None,
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            meta: serde_json::Value::Object(Default::default()),
            correlation_id: None,
            notify_user_ids: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn with_tenant(mut self, tenant_id: DbId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Attach a source entity to the event.
    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_correlation(mut self, correlation_id: uuid::Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Add users to notify. Duplicates are dropped.
    pub fn notify(mut self, user_ids: impl IntoIterator<Item = DbId>) -> Self {
        for id in user_ids {
            if !self.notify_user_ids.contains(&id) {
                self.notify_user_ids.push(id);
            }
        }
        self
    }

    /// `system.*` events are also delivered to every active super admin.
    pub fn is_system(&self) -> bool {
        is_system_event(&self.name)
    }
}

/// An event after it has been written to `event_bus`.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedEvent {
    /// Database id of the `event_bus` row.
    pub id: DbId,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub event: PlatformEvent,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published event.
pub struct EventBus {
    sender: broadcast::Sender<PublishedEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that will see it; with no
    /// subscribers the event is dropped.
    pub fn publish(&self, event: PublishedEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers, reported by the system status endpoint.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn published(id: DbId, event: PlatformEvent) -> PublishedEvent {
        PublishedEvent {
            id,
            created_at: Utc::now(),
            event,
        }
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = PlatformEvent::new("task.assigned")
            .with_tenant(3)
            .with_source("task", 42)
            .with_actor(7)
            .with_payload(serde_json::json!({"key": "value"}));

        assert_eq!(bus.publish(published(1, event)), 1);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.id, 1);
        assert_eq!(received.event.name, "task.assigned");
        assert_eq!(received.event.tenant_id, Some(3));
        assert_eq!(received.event.source_entity_id, Some(42));
        assert_eq!(received.event.actor_user_id, Some(7));
        assert_eq!(received.event.payload["key"], "value");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(published(5, PlatformEvent::new("multi.test")));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.id, 5);
        assert_eq!(e2.id, 5);
    }

    #[test]
    fn publish_with_no_subscribers_returns_zero() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(published(1, PlatformEvent::new("orphan.event"))), 0);
    }

    #[test]
    fn notify_deduplicates_targets() {
        let event = PlatformEvent::new("task.assigned").notify([4, 5]).notify([5, 6]);
        assert_eq!(event.notify_user_ids, vec![4, 5, 6]);
    }

    #[test]
    fn default_event_is_domain_with_empty_objects() {
        let event = PlatformEvent::new("bare.event");
        assert_eq!(event.event_type, "domain");
        assert!(event.payload.is_object());
        assert!(event.meta.is_object());
        assert!(event.tenant_id.is_none());
        assert!(!event.is_system());
        assert!(PlatformEvent::new("system.maintenance").is_system());
    }

    #[test]
    fn published_event_serializes_flat() {
        let json = serde_json::to_value(published(9, PlatformEvent::new("lead.converted")))
            .expect("serializable");
        assert_eq!(json["id"], 9);
        assert_eq!(json["name"], "lead.converted");
    }
}
