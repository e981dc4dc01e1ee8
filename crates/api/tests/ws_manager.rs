//! Unit tests for `WsManager`.
//!
//! These exercise the connection manager directly, without HTTP upgrades:
//! add/remove semantics, ticket watches, and shutdown.

use axum::extract::ws::Message;
use songtailor_api::ws::WsManager;

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();

    let _rx1 = manager.add("conn-1".to_string(), 1, false).await;
    let _rx2 = manager.add("conn-2".to_string(), 2, true).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-1").await;
    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 1);
    assert_eq!(manager.identity("conn-2").await, Some((2, true)));
    assert_eq!(manager.identity("conn-1").await, None);
}

#[tokio::test]
async fn send_to_watchers_reaches_only_watching_connections() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string(), 1, false).await;
    let mut rx2 = manager.add("conn-2".to_string(), 2, false).await;
    assert!(manager.watch("conn-1", 10).await);
    assert!(manager.watch("conn-2", 20).await);

    let sent = manager
        .send_to_watchers(10, Message::Text("update".into()))
        .await;
    assert_eq!(sent, 1);

    assert!(matches!(rx1.try_recv(), Ok(Message::Text(t)) if t.as_str() == "update"));
    assert!(rx2.try_recv().is_err());
}

#[tokio::test]
async fn watch_replaces_previous_and_unwatch_clears() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string(), 1, false).await;
    manager.watch("conn-1", 10).await;
    manager.watch("conn-1", 11).await;
    assert_eq!(manager.watcher_count(10).await, 0);
    assert_eq!(manager.watcher_count(11).await, 1);

    manager.unwatch("conn-1").await;
    assert_eq!(manager.watcher_count(11).await, 0);
    assert!(!manager.watch("gone", 11).await);
}

#[tokio::test]
async fn closed_receivers_are_not_counted() {
    let manager = WsManager::new();

    let rx = manager.add("conn-1".to_string(), 1, false).await;
    manager.watch("conn-1", 10).await;
    drop(rx);

    let sent = manager
        .send_to_watchers(10, Message::Text("update".into()))
        .await;
    assert_eq!(sent, 0);
}

#[tokio::test]
async fn ping_all_and_shutdown_all() {
    let manager = WsManager::new();

    let mut rx = manager.add("conn-1".to_string(), 1, false).await;
    manager.ping_all().await;
    assert!(matches!(rx.try_recv(), Ok(Message::Ping(_))));

    manager.shutdown_all().await;
    assert!(matches!(rx.try_recv(), Ok(Message::Close(None))));
    assert_eq!(manager.connection_count().await, 0);
}
