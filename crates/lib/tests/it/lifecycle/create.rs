//! Session construction tests

use std::sync::{Arc, atomic::Ordering};

use roster::{
    ConnectionConfig, RosterSettings, SessionLifecycleCoordinator, SessionRegistry,
    credentials::InMemoryCredentials, session::SessionState, ui::ActiveContext,
};

use crate::helpers::*;

#[tokio::test]
async fn test_create_session_does_not_register() {
    let roster = test_roster();

    let session = roster.coordinator.create_session(config("@alice:x")).unwrap();

    assert_eq!(session.identity().as_str(), "@alice:x");
    assert_eq!(session.state(), SessionState::Alive);
    assert!(roster.registry.is_empty());
    assert!(roster.stored_identities().await.is_empty());
}

#[tokio::test]
async fn test_create_session_wires_listeners() {
    let roster = test_roster();
    let session = roster.coordinator.create_session(config("@alice:x")).unwrap();
    let mock = roster.engine.session("@alice:x");

    assert!(session.has_listener());
    assert_eq!(mock.data_handler.listener_count(), 1);
    assert!(mock.data_handler.has_network_listener());
}

#[tokio::test]
async fn test_device_id_enables_crypto() {
    let roster = test_roster();

    let with_device = roster.coordinator.create_session(config("@alice:x")).unwrap();
    let without = roster
        .coordinator
        .create_session(config_without_device("@bob:x"))
        .unwrap();

    assert!(with_device.crypto().is_some());
    assert!(without.crypto().is_none());
}

#[tokio::test]
async fn test_data_save_mode_follows_settings() {
    let credentials = Arc::new(InMemoryCredentials::new());
    let engine = Arc::new(MockEngine::default());
    let settings = RosterSettings {
        data_save_mode: true,
        ..RosterSettings::default()
    };
    let coordinator = SessionLifecycleCoordinator::new(
        SessionRegistry::new(credentials),
        engine.clone(),
        ActiveContext::new(),
        settings,
    );

    coordinator.create_session(config("@alice:x")).unwrap();

    assert!(engine.session("@alice:x").data_save_mode.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_config_without_credentials_is_rejected() {
    let roster = test_roster();

    let err = roster
        .coordinator
        .create_session(ConnectionConfig::new(homeserver()))
        .unwrap_err();

    assert_eq!(err.module(), "lifecycle");
    assert_eq!(roster.engine.opened(), 0);
}

#[tokio::test]
async fn test_engine_open_failure_is_reported() {
    let roster = test_roster();
    roster.engine.fail_open("@alice:x");

    let err = roster
        .coordinator
        .create_session(config("@alice:x"))
        .unwrap_err();

    assert_eq!(err.module(), "lifecycle");
    assert!(err.to_string().contains("cannot open @alice:x"));
}

#[tokio::test]
async fn test_activate_registers_and_persists() {
    let roster = test_roster();

    let session = roster.coordinator.activate(config("@alice:x")).await.unwrap();

    assert_eq!(roster.registry.by_identity(session.identity()), Some(session));
    assert_eq!(roster.stored_identities().await, vec!["@alice:x"]);
}

#[tokio::test]
async fn test_activate_duplicate_fails() {
    let roster = test_roster();
    roster.coordinator.activate(config("@alice:x")).await.unwrap();

    let err = roster
        .coordinator
        .activate(config("@alice:x"))
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(roster.registry.len(), 1);
}
