//! Building sessions and tearing them down.
//!
//! The [`SessionLifecycleCoordinator`] turns stored configurations into
//! [`Session`]s wired to the engine (live-event listener, network error
//! listener, crypto handlers after the first sync), and runs the teardown
//! pipelines: deactivate, clear, clear-all and reload.
//!
//! Teardown is a linear sequence of steps. The engine operation runs as one
//! step and a failure there stops the pipeline, leaving the session in the
//! registry so the caller can retry.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, Weak, atomic::Ordering},
};

use handle_trait::Handle;
use tracing::{debug, error, info, warn};

use crate::{
    Result,
    backup::KeyBackupListenerRegistry,
    connection::{ConnectionConfig, Credentials, share},
    credentials::CredentialStore,
    engine::{NetworkEventListener, RoomKeyRequestListener, SessionEngine},
    identity::Identity,
    registry::{SessionFactory, SessionRegistry, build_sessions},
    session::{Session, SessionState},
    settings::RosterSettings,
    trust::CertTrustNegotiator,
    ui::ActiveContext,
};

pub mod errors;
mod listener;

pub use errors::{LifecycleError, TeardownStep};
use listener::{LiveEventFlags, NetworkErrors, SessionEvents};

pub(crate) struct CoordinatorInner {
    this: Weak<CoordinatorInner>,
    registry: SessionRegistry,
    engine: Arc<dyn SessionEngine>,
    negotiator: CertTrustNegotiator,
    backups: KeyBackupListenerRegistry,
    settings: RosterSettings,
    syncing: Mutex<HashSet<Identity>>,
    key_request_handlers: Mutex<HashMap<Identity, Arc<dyn RoomKeyRequestListener>>>,
    live: LiveEventFlags,
    runtime: Option<tokio::runtime::Handle>,
}

impl CoordinatorInner {
    fn credentials(&self) -> &Arc<dyn CredentialStore> {
        self.registry.credentials()
    }

    /// Answer key requests and watch key-backup state once the account's
    /// crypto engine has synced.
    fn install_crypto_handlers(&self, session: &Session) {
        let identity = session.identity();
        let Some(crypto) = session.crypto() else {
            let err = LifecycleError::MissingCryptoEngine {
                identity: identity.clone(),
            };
            warn!(identity = %identity, error = %err, "Skipping key request and backup listeners");
            return;
        };

        let handler = self.engine.key_request_handler(identity, &crypto);
        crypto.add_room_key_request_listener(Arc::clone(&handler));
        self.key_request_handlers
            .lock()
            .unwrap()
            .insert(identity.clone(), handler);

        self.backups.register(identity, &crypto.backup());
        debug!(identity = %identity, "Installed crypto handlers");
    }

    /// Detach everything the coordinator attached to `session`.
    fn detach(&self, session: &Session) {
        let identity = session.identity();
        session.detach_listener();
        let backup = session.crypto().map(|crypto| crypto.backup());
        self.backups.unregister(identity, backup.as_ref());
        self.key_request_handlers.lock().unwrap().remove(identity);
    }

    /// Drop `session` from the syncing set and the registry.
    fn forget(&self, session: &Session) {
        self.syncing.lock().unwrap().remove(session.identity());
        self.registry.remove(session);
    }
}

impl SessionFactory for CoordinatorInner {
    fn create_session(&self, config: ConnectionConfig) -> Result<Session> {
        let identity = match config.identity() {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                return Err(LifecycleError::MissingCredentials {
                    homeserver: config.homeserver.to_string(),
                }
                .into());
            }
        };
        let has_device = config
            .credentials
            .as_ref()
            .is_some_and(Credentials::has_device);

        let config = share(config);
        let engine = self
            .engine
            .open_session(&config, &self.settings.open_options())
            .map_err(|source| LifecycleError::Open {
                identity: identity.clone(),
                source,
            })?;
        let session = Session::new(identity.clone(), Arc::clone(&config), engine);

        if let Some(handler) = session.data_handler() {
            handler.set_network_error_listener(Arc::new(NetworkErrors {
                session: session.downgrade(),
                identity: identity.clone(),
                config,
                coordinator: self.this.clone(),
            }));
        }
        if has_device {
            session.engine().enable_crypto_when_starting();
        }
        session.attach_listener(Arc::new(SessionEvents::new(
            session.downgrade(),
            identity.clone(),
            self.this.clone(),
        )));
        session
            .engine()
            .set_data_save_mode(self.settings.data_save_mode);

        debug!(identity = %identity, crypto = has_device, "Created session");
        Ok(session)
    }
}

/// Outcome of [`SessionLifecycleCoordinator::clear_all`], one entry per
/// session in the order they were cleared.
#[derive(Debug, Default)]
pub struct ClearAllReport {
    pub results: Vec<(Identity, Result<()>)>,
}

impl ClearAllReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Identities whose session was cleared.
    pub fn cleared(&self) -> impl Iterator<Item = &Identity> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(id, _)| id)
    }

    /// Sessions that failed to clear, with their error.
    pub fn failures(&self) -> impl Iterator<Item = (&Identity, &crate::Error)> {
        self.results
            .iter()
            .filter_map(|(id, r)| r.as_ref().err().map(|e| (id, e)))
    }

    pub fn all_cleared(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }
}

/// Outcome of [`SessionLifecycleCoordinator::reload`].
#[derive(Debug)]
pub struct ReloadReport {
    /// The previous sessions, all released.
    pub cleared: ClearAllReport,
    /// The sessions now registered.
    pub sessions: Vec<Session>,
    /// Whether the caller asked for the interactive surface to restart.
    pub restart_requested: bool,
}

/// Builds, wires and tears down sessions.
///
/// Constructed once next to its [`SessionRegistry`]; construction binds the
/// coordinator as the registry's session factory.
#[derive(Clone, Handle)]
pub struct SessionLifecycleCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl SessionLifecycleCoordinator {
    /// Create a coordinator for `registry`.
    ///
    /// Must be called from within a tokio runtime for certificate
    /// negotiations triggered by engine callbacks to run; outside one they
    /// are logged and dropped.
    pub fn new(
        registry: SessionRegistry,
        engine: Arc<dyn SessionEngine>,
        ui: ActiveContext,
        settings: RosterSettings,
    ) -> Self {
        let negotiator = CertTrustNegotiator::new(ui.handle(), Arc::clone(registry.credentials()));
        let inner = Arc::new_cyclic(|this| CoordinatorInner {
            this: this.clone(),
            registry,
            engine,
            negotiator,
            backups: KeyBackupListenerRegistry::new(ui),
            settings,
            syncing: Mutex::new(HashSet::new()),
            key_request_handlers: Mutex::new(HashMap::new()),
            live: LiveEventFlags::default(),
            runtime: tokio::runtime::Handle::try_current().ok(),
        });

        let factory: Weak<CoordinatorInner> = Arc::downgrade(&inner);
        if !inner.registry.bind_factory(factory) {
            warn!("Registry already has a session factory");
        }
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<CoordinatorInner>) -> Self {
        Self { inner }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn negotiator(&self) -> &CertTrustNegotiator {
        &self.inner.negotiator
    }

    pub fn backups(&self) -> &KeyBackupListenerRegistry {
        &self.inner.backups
    }

    pub fn settings(&self) -> &RosterSettings {
        &self.inner.settings
    }

    /// Build a session for `config` without registering it.
    ///
    /// Encryption is enabled when the credentials carry a device id. The
    /// key request handler and backup listener are installed on the first
    /// completed initial sync.
    pub fn create_session(&self, config: ConnectionConfig) -> Result<Session> {
        self.inner.create_session(config)
    }

    /// Build a session for `config` and register it.
    pub async fn activate(&self, config: ConnectionConfig) -> Result<Session> {
        let session = self.create_session(config)?;
        self.inner.registry.add(session.handle()).await?;
        info!(identity = %session.identity(), "Activated session");
        Ok(session)
    }

    /// Deactivate the account on the server, then drop every local trace of
    /// it: stored credentials, listeners, backup listener, registry entry.
    ///
    /// If the server call fails nothing local changes and the session stays
    /// registered with its listeners attached.
    pub async fn deactivate(
        &self,
        session: &Session,
        password: &str,
        erase_user_data: bool,
    ) -> Result<()> {
        let identity = session.identity().clone();
        if !session.begin_release() {
            error!(identity = %identity, "Deactivate on a released session");
            return Err(LifecycleError::AlreadyReleased { identity }.into());
        }
        debug!(identity = %identity, erase_user_data, "Deactivating session");

        if let Err(source) = session
            .engine()
            .deactivate_account(password, erase_user_data)
            .await
        {
            session.set_state(SessionState::Alive);
            let err = LifecycleError::Teardown {
                identity,
                step: TeardownStep::Deactivate,
                source,
            };
            error!(error = %err, "Deactivation failed");
            return Err(err.into());
        }

        // The account is gone server-side, so local teardown completes even
        // if the credential store write fails.
        let removed = self
            .inner
            .credentials()
            .remove(&session.config_snapshot())
            .await;
        self.inner.detach(session);
        self.inner.forget(session);
        session.set_state(SessionState::Deactivated);
        info!(identity = %identity, "Deactivated session");
        removed
    }

    /// Log out (`clear_credentials`) or release local data for `session`.
    ///
    /// The engine operation runs first. If it fails nothing local changes:
    /// the session stays registered and alive with its listeners attached
    /// and its credentials stored, so the call can be retried. Once it
    /// succeeds the local teardown always completes; a failure removing the
    /// stored credentials is still returned.
    pub async fn clear(&self, session: &Session, clear_credentials: bool) -> Result<()> {
        let identity = session.identity().clone();
        if !session.begin_release() {
            error!(identity = %identity, "Session is already released");
            return Err(LifecycleError::AlreadyReleased { identity }.into());
        }
        debug!(identity = %identity, clear_credentials, "Clearing session");

        let (step, outcome) = if clear_credentials {
            (TeardownStep::Logout, session.engine().logout().await)
        } else {
            (TeardownStep::ClearLocal, session.engine().clear_local().await)
        };
        if let Err(source) = outcome {
            session.set_state(SessionState::Alive);
            let err = LifecycleError::Teardown {
                identity,
                step,
                source,
            };
            error!(error = %err, "Clearing session failed");
            return Err(err.into());
        }

        let removed = if clear_credentials {
            self.inner
                .credentials()
                .remove(&session.config_snapshot())
                .await
        } else {
            Ok(())
        };
        self.inner.detach(session);
        self.inner.forget(session);
        session.set_state(SessionState::Cleared);
        info!(identity = %identity, clear_credentials, "Cleared session");
        removed
    }

    /// Clear every registered session, one at a time.
    pub async fn clear_all(&self, clear_credentials: bool) -> ClearAllReport {
        self.clear_all_with(clear_credentials, |_, _| {}).await
    }

    /// Clear every registered session, one at a time, calling `on_each`
    /// after each one finishes and before the next starts.
    ///
    /// A failure does not stop the sequence. The returned report is
    /// complete only after the last `on_each` call.
    pub async fn clear_all_with<F>(&self, clear_credentials: bool, mut on_each: F) -> ClearAllReport
    where
        F: FnMut(&Identity, &Result<()>),
    {
        let sessions = self.inner.registry.all();
        let mut report = ClearAllReport::default();
        for session in sessions {
            let result = self.clear(&session, clear_credentials).await;
            on_each(session.identity(), &result);
            report.results.push((session.identity().clone(), result));
        }
        debug!(count = report.len(), "Cleared all sessions");
        report
    }

    /// Release every session without touching stored credentials, then
    /// rebuild the session list from the credential store.
    ///
    /// Sessions are released one at a time. The first failure stops the
    /// reload: the failed session and the ones not reached yet stay
    /// registered, nothing is rebuilt, and the error is returned.
    pub async fn reload(&self, launch_restart: bool) -> Result<ReloadReport> {
        info!(launch_restart, "Reloading sessions");
        let mut cleared = ClearAllReport::default();
        for session in self.inner.registry.all() {
            if let Err(e) = self.clear(&session, false).await {
                warn!(identity = %session.identity(), error = %e, "Reload stopped, session not released");
                return Err(e);
            }
            cleared.results.push((session.identity().clone(), Ok(())));
        }

        let configs = self.inner.credentials().list().await?;
        let sessions = build_sessions(self.inner.as_ref(), configs);
        self.inner.registry.publish(sessions.clone());
        self.inner
            .live
            .clear_cache_required
            .store(false, Ordering::Relaxed);

        info!(count = sessions.len(), "Reloaded sessions");
        Ok(ReloadReport {
            cleared,
            sessions,
            restart_requested: launch_restart,
        })
    }

    /// Ask every session with a data handler to refresh its push rules.
    pub fn refresh_push_rules(&self) {
        for session in self.inner.registry.all() {
            if let Some(handler) = session.data_handler() {
                handler.refresh_push_rules();
            }
        }
    }

    /// Whether the default session reports network connectivity. True when
    /// there is no default session.
    pub async fn is_connected(&self) -> Result<bool> {
        Ok(match self.inner.registry.default_session().await? {
            Some(session) => session.engine().connectivity().is_connected(),
            None => true,
        })
    }

    /// Add a network event listener to the default session. Returns false
    /// when there is no default session.
    pub async fn add_network_event_listener(
        &self,
        listener: Arc<dyn NetworkEventListener>,
    ) -> Result<bool> {
        let Some(session) = self.inner.registry.default_session().await? else {
            return Ok(false);
        };
        session.engine().connectivity().add_event_listener(listener);
        Ok(true)
    }

    pub async fn remove_network_event_listener(
        &self,
        listener: &Arc<dyn NetworkEventListener>,
    ) -> Result<bool> {
        let Some(session) = self.inner.registry.default_session().await? else {
            return Ok(false);
        };
        session
            .engine()
            .connectivity()
            .remove_event_listener(listener);
        Ok(true)
    }

    /// Record that `identity` started syncing. Returns false if it already was.
    pub fn mark_syncing(&self, identity: &Identity) -> bool {
        self.inner.syncing.lock().unwrap().insert(identity.clone())
    }

    pub fn is_syncing(&self, identity: &Identity) -> bool {
        self.inner.syncing.lock().unwrap().contains(identity)
    }

    /// Identities currently syncing.
    pub fn syncing_sessions(&self) -> Vec<Identity> {
        self.inner.syncing.lock().unwrap().iter().cloned().collect()
    }

    /// Whether an ignored-users update asked for the cache to be cleared.
    /// Reset by [`reload`](Self::reload).
    pub fn clear_cache_required(&self) -> bool {
        self.inner.live.clear_cache_required.load(Ordering::Relaxed)
    }

    /// Whether a message or receipt arrived since the last call.
    pub fn take_unread_refresh(&self) -> bool {
        self.inner.live.refresh_unread.swap(false, Ordering::Relaxed)
    }

    pub fn has_key_request_handler(&self, identity: &Identity) -> bool {
        self.inner
            .key_request_handlers
            .lock()
            .unwrap()
            .contains_key(identity)
    }
}
