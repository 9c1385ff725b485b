use std::collections::{BTreeSet, HashMap};

use atrium_core::types::{DbId, Timestamp};
use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

/// Outbound half of a socket's message channel.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// One live socket.
pub struct WsConnection {
    pub user_id: DbId,
    /// Home tenant of the user; `None` for platform administrators.
    pub tenant_id: Option<DbId>,
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<String, WsConnection>,
    /// Connection ids per user. A user may have one socket per browser tab.
    by_user: HashMap<DbId, BTreeSet<String>>,
}

impl Registry {
    fn detach(&mut self, conn_id: &str) -> Option<WsConnection> {
        let conn = self.connections.remove(conn_id)?;
        if let Some(ids) = self.by_user.get_mut(&conn.user_id) {
            ids.remove(conn_id);
            if ids.is_empty() {
                self.by_user.remove(&conn.user_id);
            }
        }
        Some(conn)
    }
}

/// Registry of authenticated sockets, shared through `AppState`.
///
/// Notification delivery looks connections up by user, so the registry keeps
/// a per-user index next to the id map. Both live under one lock.
pub struct WsManager {
    registry: RwLock<Registry>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Register a socket and hand back the receiver its writer task drains.
    ///
    /// Re-using a connection id replaces the earlier registration.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: DbId,
        tenant_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (sender, rx) = mpsc::unbounded_channel();
        let mut registry = self.registry.write().await;
        registry.detach(&conn_id);
        registry
            .by_user
            .entry(user_id)
            .or_default()
            .insert(conn_id.clone());
        registry.connections.insert(
            conn_id,
            WsConnection {
                user_id,
                tenant_id,
                sender,
                connected_at: chrono::Utc::now(),
            },
        );
        rx
    }

    pub async fn remove(&self, conn_id: &str) {
        self.registry.write().await.detach(conn_id);
    }

    /// Connection ids held by `user_id`, in sorted order.
    pub async fn get_by_user(&self, user_id: DbId) -> Vec<String> {
        self.registry
            .read()
            .await
            .by_user
            .get(&user_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn is_online(&self, user_id: DbId) -> bool {
        self.registry.read().await.by_user.contains_key(&user_id)
    }

    /// Queue `message` on every socket of `user_id`.
    ///
    /// Returns how many sockets accepted it; a socket whose writer task has
    /// gone away is not counted.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> usize {
        let registry = self.registry.read().await;
        let Some(ids) = registry.by_user.get(&user_id) else {
            return 0;
        };
        ids.iter()
            .filter_map(|id| registry.connections.get(id))
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Queue `message` on every socket whose user belongs to `tenant_id`.
    pub async fn broadcast_to_tenant(&self, tenant_id: DbId, message: Message) -> usize {
        self.registry
            .read()
            .await
            .connections
            .values()
            .filter(|conn| conn.tenant_id == Some(tenant_id))
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.connections.len()
    }

    /// Number of distinct users with at least one socket.
    pub async fn online_user_count(&self) -> usize {
        self.registry.read().await.by_user.len()
    }

    /// Ask every socket to close and forget them all.
    pub async fn shutdown_all(&self) {
        let mut registry = self.registry.write().await;
        let count = registry.connections.len();
        for conn in registry.connections.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        *registry = Registry::default();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    pub async fn ping_all(&self) {
        let registry = self.registry.read().await;
        for conn in registry.connections.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
