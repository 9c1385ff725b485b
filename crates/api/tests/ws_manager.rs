//! Unit tests for `WsManager`.
//!
//! These exercise the connection registry directly, without any HTTP
//! upgrade: per-user delivery, tenant broadcast, and shutdown.

use axum::extract::ws::Message;
use atrium_api::ws::WsManager;

fn text(body: &str) -> Message {
    Message::Text(body.to_string().into())
}

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn add_and_remove_track_count() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string(), 7, Some(1)).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Per-user delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_user_reaches_every_tab() {
    let manager = WsManager::new();
    let mut tab_a = manager.add("a".to_string(), 7, Some(1)).await;
    let mut tab_b = manager.add("b".to_string(), 7, Some(1)).await;
    let mut other = manager.add("c".to_string(), 8, Some(1)).await;

    let sent = manager.send_to_user(7, text("hello")).await;

    assert_eq!(sent, 2);
    assert!(matches!(tab_a.recv().await, Some(Message::Text(t)) if t.as_str() == "hello"));
    assert!(matches!(tab_b.recv().await, Some(Message::Text(_))));
    assert!(other.try_recv().is_err());

    assert_eq!(manager.get_by_user(7).await, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(manager.online_user_count().await, 2);
}

#[tokio::test]
async fn removing_last_tab_takes_user_offline() {
    let manager = WsManager::new();
    let _a = manager.add("a".to_string(), 7, Some(1)).await;
    let _b = manager.add("b".to_string(), 7, Some(1)).await;

    manager.remove("a").await;
    assert_eq!(manager.get_by_user(7).await, vec!["b".to_string()]);

    manager.remove("b").await;
    assert!(manager.get_by_user(7).await.is_empty());
    assert_eq!(manager.online_user_count().await, 0);
}

#[tokio::test]
async fn reused_connection_id_moves_to_new_user() {
    let manager = WsManager::new();
    let _old = manager.add("a".to_string(), 7, Some(1)).await;
    let mut new = manager.add("a".to_string(), 8, Some(1)).await;

    assert_eq!(manager.connection_count().await, 1);
    assert_eq!(manager.send_to_user(7, text("stale")).await, 0);
    assert_eq!(manager.send_to_user(8, text("fresh")).await, 1);
    assert!(new.recv().await.is_some());
}

#[tokio::test]
async fn send_to_offline_user_returns_zero() {
    let manager = WsManager::new();
    let _rx = manager.add("a".to_string(), 7, Some(1)).await;

    assert_eq!(manager.send_to_user(99, text("hello")).await, 0);
}

#[tokio::test]
async fn dropped_receivers_are_not_counted() {
    let manager = WsManager::new();
    let rx = manager.add("a".to_string(), 7, Some(1)).await;
    drop(rx);

    assert_eq!(manager.send_to_user(7, text("hello")).await, 0);
}

// ---------------------------------------------------------------------------
// Tenant broadcast
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_stays_within_tenant() {
    let manager = WsManager::new();
    let mut acme = manager.add("a".to_string(), 1, Some(10)).await;
    let mut globex = manager.add("b".to_string(), 2, Some(20)).await;
    let mut platform = manager.add("c".to_string(), 3, None).await;

    let sent = manager.broadcast_to_tenant(10, text("maintenance")).await;

    assert_eq!(sent, 1);
    assert!(acme.recv().await.is_some());
    assert!(globex.try_recv().is_err());
    assert!(platform.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_all_sends_ping_frames() {
    let manager = WsManager::new();
    let mut rx = manager.add("a".to_string(), 1, Some(10)).await;

    manager.ping_all().await;

    assert!(matches!(rx.recv().await, Some(Message::Ping(_))));
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx1 = manager.add("a".to_string(), 1, Some(10)).await;
    let mut rx2 = manager.add("b".to_string(), 2, None).await;

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert!(matches!(rx1.recv().await, Some(Message::Close(None))));
    assert!(matches!(rx2.recv().await, Some(Message::Close(None))));
}
