//! Live-event, sync and connectivity tests

use std::sync::{Arc, atomic::Ordering};

use roster::{
    Identity,
    engine::{EVENT_TYPE_MESSAGE, EVENT_TYPE_RECEIPT, NetworkEventListener},
};

use crate::helpers::*;

struct NoopNetworkListener;

impl NetworkEventListener for NoopNetworkListener {
    fn on_network_connection_update(&self, _connected: bool) {}
}

#[tokio::test]
async fn test_initial_sync_installs_crypto_handlers_once() {
    let roster = test_roster();
    roster.coordinator.activate(config("@alice:x")).await.unwrap();
    let mock = roster.engine.session("@alice:x");
    let alice = Identity::new("@alice:x");

    mock.data_handler.emit_initial_sync();
    mock.data_handler.emit_initial_sync();

    let crypto = mock.mock_crypto().unwrap();
    assert_eq!(roster.engine.key_handlers_built(), 1);
    assert_eq!(crypto.key_request_listeners.load(Ordering::SeqCst), 1);
    assert_eq!(crypto.backup.listener_count(), 1);
    assert!(roster.coordinator.has_key_request_handler(&alice));
    assert!(roster.coordinator.backups().is_registered(&alice));
}

#[tokio::test]
async fn test_initial_sync_without_crypto_is_skipped() {
    let roster = test_roster();
    roster
        .coordinator
        .activate(config_without_device("@bob:x"))
        .await
        .unwrap();

    roster.engine.session("@bob:x").data_handler.emit_initial_sync();

    let bob = Identity::new("@bob:x");
    assert_eq!(roster.engine.key_handlers_built(), 0);
    assert!(!roster.coordinator.has_key_request_handler(&bob));
    assert!(!roster.coordinator.backups().is_registered(&bob));
}

#[tokio::test]
async fn test_message_and_receipt_events_request_unread_refresh() {
    let roster = test_roster();
    roster.coordinator.activate(config("@alice:x")).await.unwrap();
    let handler = &roster.engine.session("@alice:x").data_handler;

    handler.emit_live_event("m.room.member");
    assert!(!roster.coordinator.take_unread_refresh());

    handler.emit_live_event(EVENT_TYPE_MESSAGE);
    assert!(roster.coordinator.take_unread_refresh());
    assert!(!roster.coordinator.take_unread_refresh());

    handler.emit_live_event(EVENT_TYPE_RECEIPT);
    assert!(roster.coordinator.take_unread_refresh());
}

#[tokio::test]
async fn test_ignored_users_update_requires_cache_clear() {
    let roster = test_roster();
    roster.coordinator.activate(config("@alice:x")).await.unwrap();
    assert!(!roster.coordinator.clear_cache_required());

    roster
        .engine
        .session("@alice:x")
        .data_handler
        .emit_ignored_users_update();

    assert!(roster.coordinator.clear_cache_required());
}

#[tokio::test]
async fn test_processed_chunk_ends_syncing() {
    let roster = test_roster();
    roster.coordinator.activate(config("@alice:x")).await.unwrap();
    roster.coordinator.activate(config("@bob:x")).await.unwrap();
    let alice = Identity::new("@alice:x");
    let bob = Identity::new("@bob:x");

    assert!(roster.coordinator.mark_syncing(&alice));
    assert!(!roster.coordinator.mark_syncing(&alice));
    roster.coordinator.mark_syncing(&bob);

    roster
        .engine
        .session("@alice:x")
        .data_handler
        .emit_chunk_processed();

    assert!(!roster.coordinator.is_syncing(&alice));
    assert_eq!(roster.coordinator.syncing_sessions(), vec![bob]);
}

#[tokio::test]
async fn test_refresh_push_rules_reaches_every_handler() {
    let roster = test_roster();
    roster.coordinator.activate(config("@alice:x")).await.unwrap();
    roster.coordinator.activate(config("@bob:x")).await.unwrap();
    roster.engine.session("@bob:x").release_handler();

    roster.coordinator.refresh_push_rules();

    let alice = roster.engine.session("@alice:x");
    let bob = roster.engine.session("@bob:x");
    assert_eq!(alice.data_handler.push_rule_refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(bob.data_handler.push_rule_refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connectivity_without_sessions() {
    let roster = test_roster();
    let listener: Arc<dyn NetworkEventListener> = Arc::new(NoopNetworkListener);

    assert!(roster.coordinator.is_connected().await.unwrap());
    assert!(!roster
        .coordinator
        .add_network_event_listener(listener)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_connectivity_follows_default_session() {
    let roster = test_roster();
    roster.coordinator.activate(config("@alice:x")).await.unwrap();
    roster.coordinator.activate(config("@bob:x")).await.unwrap();
    let alice = roster.engine.session("@alice:x");
    let listener: Arc<dyn NetworkEventListener> = Arc::new(NoopNetworkListener);

    alice.connectivity.connected.store(false, Ordering::SeqCst);
    assert!(!roster.coordinator.is_connected().await.unwrap());

    assert!(roster
        .coordinator
        .add_network_event_listener(listener.clone())
        .await
        .unwrap());
    assert_eq!(alice.connectivity.listener_count(), 1);
    assert_eq!(roster.engine.session("@bob:x").connectivity.listener_count(), 0);

    roster
        .coordinator
        .remove_network_event_listener(&listener)
        .await
        .unwrap();
    assert_eq!(alice.connectivity.listener_count(), 0);
}
