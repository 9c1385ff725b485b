//! Event-to-notification routing engine.

use std::collections::BTreeSet;
use std::sync::Arc;

use atrium_core::channels::FRAME_NOTIFICATION;
use atrium_core::types::{DbId, Timestamp};
use atrium_db::repositories::{NotificationRepo, UserRepo};
use atrium_db::DbPool;
use atrium_events::PublishedEvent;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::ws::WsManager;

/// Routes persisted platform events to user notifications.
///
/// Targets are the event's explicit `notify_user_ids` plus, for `system.*`
/// events, every active super admin. There is no retry: a failed insert or
/// push is logged and the next target is tried.
pub struct NotificationRouter {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>) -> Self {
        Self { pool, ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// Exits when `cancel` fires or the bus is dropped.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<PublishedEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification router stopping");
                    break;
                }
                received = receiver.recv() => received,
            };

            match received {
                Ok(published) => {
                    if let Err(e) = self.route_event(&published).await {
                        tracing::error!(
                            error = %e,
                            event_id = published.id,
                            event_name = %published.event.name,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event. Returns the number of notifications created.
    pub async fn route_event(&self, published: &PublishedEvent) -> Result<usize, sqlx::Error> {
        let targets = self.determine_targets(published).await?;
        let mut created = 0;

        for user_id in targets {
            match self.route_to_user(user_id, published).await {
                Ok(true) => created += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        user_id,
                        event_id = published.id,
                        "Failed to notify user"
                    );
                }
            }
        }

        if created > 0 {
            tracing::debug!(event_id = published.id, created, "Event routed");
        }
        Ok(created)
    }

    async fn determine_targets(&self, published: &PublishedEvent) -> Result<BTreeSet<DbId>, sqlx::Error> {
        let mut targets: BTreeSet<DbId> = published.event.notify_user_ids.iter().copied().collect();
        if published.event.is_system() {
            targets.extend(UserRepo::list_active_super_admin_ids(&self.pool).await?);
        }
        Ok(targets)
    }

    /// Store the notification and push it live. Returns `false` when the user
    /// already had a notification for this event.
    ///
    /// A live push first claims the row, so a socket replaying its backlog at
    /// the same moment never receives it twice.
    async fn route_to_user(&self, user_id: DbId, published: &PublishedEvent) -> Result<bool, sqlx::Error> {
        let Some(notification_id) = NotificationRepo::create(&self.pool, published.id, user_id).await? else {
            return Ok(false);
        };
        if !self.ws_manager.is_online(user_id).await {
            return Ok(true);
        }
        if NotificationRepo::mark_delivered(&self.pool, &[notification_id]).await? == 0 {
            // A backlog replay got there first.
            return Ok(true);
        }

        let frame = notification_frame(FrameFields {
            notification_id,
            event_id: published.id,
            event_name: &published.event.name,
            event_type: &published.event.event_type,
            tenant_id: published.event.tenant_id,
            payload: &published.event.payload,
            created_at: published.created_at,
        });

        if self.ws_manager.send_to_user(user_id, frame).await == 0 {
            NotificationRepo::release(&self.pool, &[notification_id]).await?;
        }

        Ok(true)
    }

    /// Write the notifications `user_id` missed while offline to `sink`,
    /// oldest first.
    ///
    /// Called on a fresh socket before its live channel is drained, so the
    /// client sees the backlog ahead of anything routed meanwhile. Rows that
    /// could not be written are handed back for the next connection.
    pub async fn replay_backlog<S>(&self, user_id: DbId, sink: &mut S) -> Result<usize, sqlx::Error>
    where
        S: Sink<Message> + Unpin,
    {
        let claimed = NotificationRepo::claim_undelivered(&self.pool, user_id, BACKLOG_LIMIT).await?;

        let mut written = 0;
        for n in &claimed {
            let frame = notification_frame(FrameFields {
                notification_id: n.id,
                event_id: n.event_id,
                event_name: &n.event_name,
                event_type: &n.event_type,
                tenant_id: n.tenant_id,
                payload: &n.payload,
                created_at: n.created_at,
            });
            if sink.send(frame).await.is_err() {
                break;
            }
            written += 1;
        }

        let unwritten: Vec<DbId> = claimed[written..].iter().map(|n| n.id).collect();
        NotificationRepo::release(&self.pool, &unwritten).await?;
        Ok(written)
    }
}

/// Upper bound on notifications replayed when a socket connects.
const BACKLOG_LIMIT: i64 = 100;

struct FrameFields<'a> {
    notification_id: DbId,
    event_id: DbId,
    event_name: &'a str,
    event_type: &'a str,
    tenant_id: Option<DbId>,
    payload: &'a serde_json::Value,
    created_at: Timestamp,
}

fn notification_frame(f: FrameFields<'_>) -> Message {
    let frame = serde_json::json!({
        "type": FRAME_NOTIFICATION,
        "notification_id": f.notification_id,
        "event_id": f.event_id,
        "event_name": f.event_name,
        "event_type": f.event_type,
        "tenant_id": f.tenant_id,
        "payload": f.payload,
        "created_at": f.created_at,
    });
    Message::Text(frame.to_string().into())
}
