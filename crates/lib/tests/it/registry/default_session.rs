//! Default session selection and rebuild tests

use std::sync::Arc;

use roster::{
    ConnectionConfig, Credentials, SessionRegistry, credentials::InMemoryCredentials,
};

use crate::helpers::*;

#[tokio::test]
async fn test_rebuilds_from_store_in_store_order() {
    let roster = test_roster_with(vec![config("@alice:x"), config("@bob:x")]);
    assert!(roster.registry.is_empty());

    let default = roster.registry.default_session().await.unwrap().unwrap();

    assert_eq!(default.identity().as_str(), "@alice:x");
    assert_eq!(roster.registry.len(), 2);
    assert_eq!(roster.registered_identities(), vec!["@alice:x", "@bob:x"]);
}

#[tokio::test]
async fn test_default_is_stable() {
    let roster = test_roster_with(vec![config("@alice:x"), config("@bob:x")]);

    let first = roster.registry.default_session().await.unwrap().unwrap();
    let second = roster.registry.default_session().await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(roster.engine.opened(), 2, "second call must not rebuild");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_rebuild() {
    let roster = test_roster_with(vec![config("@alice:x"), config("@bob:x")]);

    let (a, b, c, d) = tokio::join!(
        roster.registry.default_session(),
        roster.registry.default_session(),
        roster.registry.default_session(),
        roster.registry.default_session()
    );

    for default in [a, b, c, d] {
        assert_eq!(default.unwrap().unwrap().identity().as_str(), "@alice:x");
    }
    assert_eq!(roster.engine.open_calls(), 2);
    assert_eq!(roster.registry.len(), 2);
}

#[tokio::test]
async fn test_rebuild_dedups_by_identity() {
    let duplicate = ConnectionConfig::new(homeserver())
        .with_credentials(Credentials::new("@alice:x", "second-token"));
    let roster = test_roster_with(vec![config("@alice:x"), duplicate, config("@bob:x")]);

    roster.registry.default_session().await.unwrap();

    assert_eq!(roster.registered_identities(), vec!["@alice:x", "@bob:x"]);
    let alice = roster.registry.all().remove(0);
    let token = alice
        .config_snapshot()
        .credentials
        .map(|c| c.access_token.to_string());
    assert_eq!(token.as_deref(), Some("token-@alice:x"));
}

#[tokio::test]
async fn test_rebuild_skips_unusable_configs() {
    let no_credentials = ConnectionConfig::new(homeserver());
    let empty_identity =
        ConnectionConfig::new(homeserver()).with_credentials(Credentials::new("", "token"));
    let roster = test_roster_with(vec![no_credentials, empty_identity, config("@bob:x")]);

    let default = roster.registry.default_session().await.unwrap().unwrap();

    assert_eq!(default.identity().as_str(), "@bob:x");
    assert_eq!(roster.registry.len(), 1);
}

#[tokio::test]
async fn test_rebuild_skips_sessions_the_engine_cannot_open() {
    let roster = test_roster_with(vec![config("@alice:x"), config("@bob:x")]);
    roster.engine.fail_open("@alice:x");

    let default = roster.registry.default_session().await.unwrap().unwrap();

    assert_eq!(default.identity().as_str(), "@bob:x");
    assert_eq!(roster.registered_identities(), vec!["@bob:x"]);
}

#[tokio::test]
async fn test_empty_store_has_no_default() {
    let roster = test_roster();
    assert!(roster.registry.default_session().await.unwrap().is_none());
    assert!(roster.registry.is_empty());
}

#[tokio::test]
async fn test_registered_session_wins_over_store() {
    let roster = test_roster_with(vec![config("@alice:x")]);
    roster.coordinator.activate(config("@bob:x")).await.unwrap();

    let default = roster.registry.default_session().await.unwrap().unwrap();

    assert_eq!(default.identity().as_str(), "@bob:x");
    assert_eq!(roster.registry.len(), 1);
}

#[tokio::test]
async fn test_without_factory_nothing_is_rebuilt() {
    let credentials = Arc::new(InMemoryCredentials::with_configs(vec![config("@alice:x")]));
    let registry = SessionRegistry::new(credentials);

    assert!(registry.default_session().await.unwrap().is_none());
    assert!(registry.is_empty());
}
