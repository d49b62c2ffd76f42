//! Registration, removal and lookup tests

use std::sync::Arc;

use roster::{Identity, engine::EventStore};

use crate::helpers::*;

#[tokio::test]
async fn test_add_registers_and_persists() {
    let roster = test_roster();
    let session = roster.coordinator.create_session(config("@alice:x")).unwrap();

    roster.registry.add(session.clone()).await.unwrap();

    assert_eq!(roster.registered_identities(), vec!["@alice:x"]);
    assert_eq!(roster.stored_identities().await, vec!["@alice:x"]);
    assert!(roster.registry.contains(&Identity::new("@alice:x")));
}

#[tokio::test]
async fn test_duplicate_identity_is_rejected() {
    let roster = test_roster();
    let first = roster.coordinator.create_session(config("@alice:x")).unwrap();
    let second = roster.coordinator.create_session(config("@alice:x")).unwrap();

    roster.registry.add(first).await.unwrap();
    let err = roster.registry.add(second).await.unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(err.module(), "registry");
    assert_eq!(roster.registry.len(), 1);
}

#[tokio::test]
async fn test_concurrent_adds_keep_identities_unique() {
    let roster = test_roster();
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let session = roster.coordinator.create_session(config("@alice:x")).unwrap();
        let registry = roster.registry.clone();
        tasks.push(tokio::spawn(async move { registry.add(session).await }));
    }

    let mut added = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            added += 1;
        }
    }

    assert_eq!(added, 1);
    assert_eq!(roster.registered_identities(), vec!["@alice:x"]);
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let roster = test_roster();
    let alice = roster.coordinator.activate(config("@alice:x")).await.unwrap();
    let bob = roster.coordinator.activate(config("@bob:x")).await.unwrap();

    assert!(roster.registry.remove(&alice));
    assert!(!roster.registry.remove(&alice));
    assert_eq!(roster.registered_identities(), vec!["@bob:x"]);
    assert!(roster.registry.by_identity(bob.identity()).is_some());
}

#[tokio::test]
async fn test_all_is_a_snapshot() {
    let roster = test_roster();
    let alice = roster.coordinator.activate(config("@alice:x")).await.unwrap();

    let snapshot = roster.registry.all();
    roster.registry.remove(&alice);

    assert_eq!(snapshot.len(), 1);
    assert!(roster.registry.is_empty());
}

#[tokio::test]
async fn test_by_identity_is_strict() {
    let roster = test_roster();
    roster.coordinator.activate(config("@alice:x")).await.unwrap();

    assert!(roster.registry.by_identity(&Identity::new("@carol:x")).is_none());

    let err = roster.registry.require(&Identity::new("@carol:x")).unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_by_identity_or_default_falls_back() {
    let roster = test_roster();
    roster.coordinator.activate(config("@alice:x")).await.unwrap();
    roster.coordinator.activate(config("@bob:x")).await.unwrap();

    let exact = roster
        .registry
        .by_identity_or_default(&Identity::new("@bob:x"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exact.identity().as_str(), "@bob:x");

    let fallback = roster
        .registry
        .by_identity_or_default(&Identity::new("@carol:x"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fallback.identity().as_str(), "@alice:x");

    let empty = roster
        .registry
        .by_identity_or_default(&Identity::new(""))
        .await
        .unwrap();
    assert!(empty.is_none());
}

#[tokio::test]
async fn test_has_valid_sessions() {
    let roster = test_roster();
    assert!(!roster.registry.has_valid_sessions());

    roster.coordinator.activate(config("@alice:x")).await.unwrap();
    roster.coordinator.activate(config("@bob:x")).await.unwrap();
    assert!(roster.registry.has_valid_sessions());

    roster.engine.session("@bob:x").release_handler();
    assert!(!roster.registry.has_valid_sessions());
}

#[tokio::test]
async fn test_failed_logout_keeps_session_valid() {
    let roster = test_roster();
    let alice = roster.coordinator.activate(config("@alice:x")).await.unwrap();
    roster.engine.fail("@alice:x", Op::Logout);

    // The failed logout leaves the session exactly as it was.
    let err = roster.coordinator.clear(&alice, true).await.unwrap_err();
    assert!(err.is_teardown_failure());
    assert!(alice.is_alive());
    assert!(alice.has_listener());
    assert!(roster.registry.has_valid_sessions());
    assert_eq!(roster.registered_identities(), vec!["@alice:x"]);
    assert_eq!(roster.stored_identities().await, vec!["@alice:x"]);
    assert_eq!(
        roster.engine.session("@alice:x").data_handler.listener_count(),
        1
    );

    roster.engine.heal("@alice:x", Op::Logout);
    roster.coordinator.clear(&alice, true).await.unwrap();
    assert!(!roster.registry.has_valid_sessions());
    assert!(roster.stored_identities().await.is_empty());
}

#[tokio::test]
async fn test_tmp_stores_are_shared_between_handles() {
    let roster = test_roster();
    let store: Arc<dyn EventStore> = Arc::new(MockStore);
    let other: Arc<dyn EventStore> = Arc::new(MockStore);

    let index = roster.registry.tmp_stores().add(Arc::clone(&store));
    assert_eq!(roster.registry.tmp_stores().add(Arc::clone(&store)), index);
    let second = roster.coordinator.registry().tmp_stores().add(other);

    assert_ne!(index, second);
    assert_eq!(roster.registry.tmp_stores().len(), 2);
    assert!(roster.registry.tmp_stores().get(index).is_some());

    roster.registry.tmp_stores().clear();
    assert!(roster.coordinator.registry().tmp_stores().is_empty());
}
