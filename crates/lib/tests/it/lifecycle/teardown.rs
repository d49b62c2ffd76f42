//! Deactivate and clear tests

use roster::{Identity, session::SessionState};

use crate::helpers::*;

#[tokio::test]
async fn test_deactivate_removes_every_trace() {
    let roster = test_roster();
    let alice = roster.coordinator.activate(config("@alice:x")).await.unwrap();
    let mock = roster.engine.session("@alice:x");
    mock.data_handler.emit_initial_sync();
    roster.coordinator.mark_syncing(alice.identity());

    roster
        .coordinator
        .deactivate(&alice, "password", true)
        .await
        .unwrap();

    assert_eq!(alice.state(), SessionState::Deactivated);
    assert!(roster.registry.is_empty());
    assert!(roster.stored_identities().await.is_empty());
    assert_eq!(mock.data_handler.listener_count(), 0);
    assert_eq!(mock.mock_crypto().unwrap().backup.listener_count(), 0);
    assert!(!roster.coordinator.backups().is_registered(alice.identity()));
    assert!(!roster.coordinator.has_key_request_handler(alice.identity()));
    assert!(!roster.coordinator.is_syncing(alice.identity()));
}

#[tokio::test]
async fn test_failed_deactivate_changes_nothing() {
    let roster = test_roster();
    let alice = roster.coordinator.activate(config("@alice:x")).await.unwrap();
    let mock = roster.engine.session("@alice:x");
    mock.data_handler.emit_initial_sync();
    roster.engine.fail("@alice:x", Op::Deactivate);

    let err = roster
        .coordinator
        .deactivate(&alice, "password", false)
        .await
        .unwrap_err();

    assert!(err.is_teardown_failure());
    assert!(alice.is_alive());
    assert!(
        roster
            .registry
            .by_identity(&Identity::new("@alice:x"))
            .is_some()
    );
    assert!(alice.has_listener());
    assert_eq!(mock.data_handler.listener_count(), 1);
    assert!(roster.coordinator.backups().is_registered(alice.identity()));
    assert_eq!(roster.stored_identities().await, vec!["@alice:x"]);

    // The session is left intact, so a retry goes through.
    roster.engine.heal("@alice:x", Op::Deactivate);
    roster
        .coordinator
        .deactivate(&alice, "password", false)
        .await
        .unwrap();
    assert!(roster.registry.is_empty());
}

#[tokio::test]
async fn test_clear_local_keeps_credentials() {
    let roster = test_roster();
    let alice = roster.coordinator.activate(config("@alice:x")).await.unwrap();
    let mock = roster.engine.session("@alice:x");

    roster.coordinator.clear(&alice, false).await.unwrap();

    assert_eq!(alice.state(), SessionState::Cleared);
    assert!(roster.registry.is_empty());
    assert_eq!(roster.stored_identities().await, vec!["@alice:x"]);
    assert_eq!(mock.data_handler.listener_count(), 0);
    assert_eq!(
        roster.engine.log(),
        vec!["clear:start:@alice:x", "clear:end:@alice:x"]
    );
}

#[tokio::test]
async fn test_clear_with_credentials_logs_out() {
    let roster = test_roster();
    let alice = roster.coordinator.activate(config("@alice:x")).await.unwrap();

    roster.coordinator.clear(&alice, true).await.unwrap();

    assert!(roster.registry.is_empty());
    assert!(roster.stored_identities().await.is_empty());
    assert_eq!(
        roster.engine.log(),
        vec!["logout:start:@alice:x", "logout:end:@alice:x"]
    );
}

#[tokio::test]
async fn test_clear_released_session_is_rejected() {
    let roster = test_roster();
    let alice = roster.coordinator.activate(config("@alice:x")).await.unwrap();
    roster.coordinator.clear(&alice, false).await.unwrap();

    let err = roster.coordinator.clear(&alice, true).await.unwrap_err();

    assert!(err.is_already_released());
    assert_eq!(roster.engine.log().len(), 2, "no engine call for a released session");
    assert_eq!(roster.stored_identities().await, vec!["@alice:x"]);

    let err = roster
        .coordinator
        .deactivate(&alice, "password", false)
        .await
        .unwrap_err();
    assert!(err.is_already_released());
}

#[tokio::test]
async fn test_failed_clear_keeps_session_registered() {
    let roster = test_roster();
    let alice = roster.coordinator.activate(config("@alice:x")).await.unwrap();
    roster.engine.fail("@alice:x", Op::ClearLocal);

    let err = roster.coordinator.clear(&alice, false).await.unwrap_err();

    assert!(err.is_teardown_failure());
    assert!(alice.is_alive());
    assert!(alice.has_listener());
    assert_eq!(roster.registered_identities(), vec!["@alice:x"]);
    assert_eq!(roster.stored_identities().await, vec!["@alice:x"]);

    // Still wired: the initial sync registers the backup listener.
    let engine_session = roster.engine.session("@alice:x");
    assert_eq!(engine_session.data_handler.listener_count(), 1);
    engine_session.data_handler.emit_initial_sync();
    assert!(roster.coordinator.backups().is_registered(alice.identity()));

    roster.engine.heal("@alice:x", Op::ClearLocal);
    roster.coordinator.clear(&alice, false).await.unwrap();
    assert!(roster.registry.is_empty());
}

#[tokio::test]
async fn test_concurrent_clears_release_once() {
    let roster = test_roster();
    let alice = roster.coordinator.activate(config("@alice:x")).await.unwrap();

    let (first, second) = tokio::join!(
        roster.coordinator.clear(&alice, false),
        roster.coordinator.clear(&alice, false)
    );

    assert_eq!(
        [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
        1
    );
    let released = first.err().or(second.err()).unwrap();
    assert!(released.is_already_released());
    assert_eq!(roster.engine.log().len(), 2);
}
