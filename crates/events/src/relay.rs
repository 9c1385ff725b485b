//! Persist-then-broadcast event publishing.
//!
//! [`EventRelay::publish`] writes the `event_bus` row first and only then
//! broadcasts, so every subscriber sees an event that already has a
//! database id. A failed insert is returned to the caller and nothing is
//! broadcast.

use std::sync::Arc;

use atrium_core::types::DbId;
use atrium_db::models::event::CreateEvent;
use atrium_db::repositories::EventRepo;
use atrium_db::DbPool;

use crate::bus::{EventBus, PlatformEvent, PublishedEvent};

/// Routing and correlation options for [`EventRelay::publish_event`].
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub tenant_id: Option<DbId>,
    pub actor_user_id: Option<DbId>,
    pub source: Option<(String, DbId)>,
    pub correlation_id: Option<uuid::Uuid>,
    pub notify_user_ids: Vec<DbId>,
}

#[derive(Clone)]
pub struct EventRelay {
    pool: DbPool,
    bus: Arc<EventBus>,
}

impl EventRelay {
    pub fn new(pool: DbPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Persist `event` and fan it out to bus subscribers.
    pub async fn publish(&self, event: PlatformEvent) -> Result<PublishedEvent, sqlx::Error> {
        let row = EventRepo::insert(
            &self.pool,
            &CreateEvent {
                tenant_id: event.tenant_id,
                name: &event.name,
                event_type: &event.event_type,
                source_entity_type: event.source_entity_type.as_deref(),
                source_entity_id: event.source_entity_id,
                actor_user_id: event.actor_user_id,
                payload: &event.payload,
                meta: &event.meta,
                correlation_id: event.correlation_id,
            },
        )
        .await?;

        let published = PublishedEvent {
            id: row.id,
            created_at: row.created_at,
            event,
        };
        let receivers = self.bus.publish(published.clone());
        tracing::debug!(
            event_id = published.id,
            name = %published.event.name,
            receivers,
            "Event published"
        );
        Ok(published)
    }

    /// Convenience form taking the pieces of an event separately.
    pub async fn publish_event(
        &self,
        name: &str,
        event_type: &str,
        payload: serde_json::Value,
        meta: serde_json::Value,
        options: PublishOptions,
    ) -> Result<PublishedEvent, sqlx::Error> {
        let mut event = PlatformEvent::new(name)
            .with_type(event_type)
            .with_payload(payload)
            .with_meta(meta)
            .notify(options.notify_user_ids);
        if let Some(tenant_id) = options.tenant_id {
            event = event.with_tenant(tenant_id);
        }
        if let Some(actor) = options.actor_user_id {
            event = event.with_actor(actor);
        }
        if let Some((entity_type, entity_id)) = options.source {
            event = event.with_source(entity_type, entity_id);
        }
        if let Some(correlation_id) = options.correlation_id {
            event = event.with_correlation(correlation_id);
        }
        self.publish(event).await
    }

    /// Publish without failing the caller; errors are logged.
    ///
    /// Used after a mutation has already committed.
    pub async fn publish_logged(&self, event: PlatformEvent) -> Option<PublishedEvent> {
        let name = event.name.clone();
        match self.publish(event).await {
            Ok(published) => Some(published),
            Err(e) => {
                tracing::error!(error = %e, name = %name, "Failed to publish event");
                None
            }
        }
    }
}
