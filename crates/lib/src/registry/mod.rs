//! The authoritative list of active sessions.
//!
//! A [`SessionRegistry`] is constructed once at process start and handed to
//! everything that needs sessions. Index 0 of its list is the default
//! session. When the list is empty, asking for the default session rebuilds
//! it from the [`CredentialStore`] through a bound [`SessionFactory`].

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, OnceLock, Weak},
};

use handle_trait::Handle;
use tracing::{debug, error, info, warn};

use crate::{
    Result,
    connection::ConnectionConfig,
    credentials::CredentialStore,
    identity::Identity,
    session::Session,
};

pub mod errors;
mod tmp_stores;

pub use errors::RegistryError;
pub use tmp_stores::TmpStores;

/// Builds sessions from stored configurations.
///
/// Implemented by the lifecycle coordinator; the registry only keeps a weak
/// reference to it.
pub trait SessionFactory: Send + Sync {
    /// Build a session for `config` without registering it.
    fn create_session(&self, config: ConnectionConfig) -> Result<Session>;
}

struct RegistryInner {
    sessions: Mutex<Vec<Session>>,
    credentials: Arc<dyn CredentialStore>,
    factory: OnceLock<Weak<dyn SessionFactory>>,
    /// Held while the list is rebuilt from the credential store.
    rebuild: tokio::sync::Mutex<()>,
    tmp_stores: TmpStores,
}

/// Thread-safe ordered list of sessions, unique by identity.
///
/// Every read returns a snapshot taken under the registry lock; no caller
/// ever iterates the live list.
#[derive(Clone, Handle)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: Mutex::new(Vec::new()),
                credentials,
                factory: OnceLock::new(),
                rebuild: tokio::sync::Mutex::new(()),
                tmp_stores: TmpStores::new(),
            }),
        }
    }

    /// Bind the factory used to rebuild the default session.
    ///
    /// Only the first binding takes effect; returns false afterwards.
    pub fn bind_factory(&self, factory: Weak<dyn SessionFactory>) -> bool {
        self.inner.factory.set(factory).is_ok()
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.credentials
    }

    pub fn tmp_stores(&self) -> &TmpStores {
        &self.inner.tmp_stores
    }

    /// Register `session` and persist its configuration.
    ///
    /// Fails with [`RegistryError::DuplicateIdentity`] if a session for the
    /// same identity is already registered; nothing is persisted then.
    pub async fn add(&self, session: Session) -> Result<()> {
        if self.contains(session.identity()) {
            return Err(RegistryError::DuplicateIdentity {
                identity: session.identity().clone(),
            }
            .into());
        }

        self.inner.credentials.add(&session.config_snapshot()).await?;

        let mut sessions = self.inner.sessions.lock().unwrap();
        if sessions.contains(&session) {
            return Err(RegistryError::DuplicateIdentity {
                identity: session.identity().clone(),
            }
            .into());
        }
        debug!(identity = %session.identity(), position = sessions.len(), "Registered session");
        sessions.push(session);
        Ok(())
    }

    /// Remove the session with the same identity. Returns false if there was
    /// none.
    pub fn remove(&self, session: &Session) -> bool {
        let mut sessions = self.inner.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s != session);
        let removed = sessions.len() != before;
        if removed {
            debug!(identity = %session.identity(), "Removed session");
        }
        removed
    }

    /// Snapshot of every registered session, in order.
    pub fn all(&self) -> Vec<Session> {
        self.inner.sessions.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.sessions.lock().unwrap().is_empty()
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.inner
            .sessions
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.identity() == identity)
    }

    /// The session registered for `identity`.
    pub fn by_identity(&self, identity: &Identity) -> Option<Session> {
        self.all().into_iter().find(|s| s.identity() == identity)
    }

    /// Like [`by_identity`](Self::by_identity), but reports a missing session
    /// as [`RegistryError::NotFound`].
    pub fn require(&self, identity: &Identity) -> Result<Session> {
        self.by_identity(identity).ok_or_else(|| {
            RegistryError::NotFound {
                identity: identity.clone(),
            }
            .into()
        })
    }

    /// Lookup with the legacy fallback: an unknown, non-empty identity
    /// returns the default session instead of nothing.
    pub async fn by_identity_or_default(&self, identity: &Identity) -> Result<Option<Session>> {
        if let Some(session) = self.by_identity(identity) {
            return Ok(Some(session));
        }
        if identity.is_empty() {
            return Ok(None);
        }
        debug!(identity = %identity, "Unknown identity, falling back to default session");
        self.default_session().await
    }

    /// The default session (index 0).
    ///
    /// With an empty registry this rebuilds the list from the credential
    /// store: one session per stored identity, first occurrence wins, in
    /// store order. Configurations without credentials or with an empty
    /// identity are skipped. Concurrent callers wait for a single rebuild.
    pub async fn default_session(&self) -> Result<Option<Session>> {
        if let Some(first) = self.first() {
            return Ok(Some(first));
        }

        let _rebuilding = self.inner.rebuild.lock().await;
        if let Some(first) = self.first() {
            return Ok(Some(first));
        }

        let configs = self.inner.credentials.list().await?;
        if configs.is_empty() {
            return Ok(None);
        }
        let Some(factory) = self.inner.factory.get().and_then(Weak::upgrade) else {
            warn!("No session factory bound, cannot rebuild sessions");
            return Ok(None);
        };

        let built = build_sessions(factory.as_ref(), configs);

        let mut sessions = self.inner.sessions.lock().unwrap();
        if sessions.is_empty() {
            info!(count = built.len(), "Rebuilt sessions from credential store");
            *sessions = built;
        } else {
            debug!("Sessions were registered concurrently, discarding rebuilt list");
        }
        Ok(sessions.first().map(Session::handle))
    }

    fn first(&self) -> Option<Session> {
        self.inner.sessions.lock().unwrap().first().map(Session::handle)
    }

    /// Whether at least one session is registered and every registered
    /// session is alive with a data handler.
    pub fn has_valid_sessions(&self) -> bool {
        let sessions = self.all();
        if sessions.is_empty() {
            warn!("No registered session");
            return false;
        }
        let valid = sessions
            .iter()
            .all(|s| s.is_alive() && s.data_handler().is_some());
        if !valid {
            warn!("A registered session is released or has no data handler");
        }
        valid
    }

    /// Replace the whole list, e.g. after a reload.
    pub(crate) fn publish(&self, sessions: Vec<Session>) {
        *self.inner.sessions.lock().unwrap() = sessions;
    }
}

/// Build one session per stored identity, first occurrence wins, in store
/// order. Configurations without a usable identity, and configurations the
/// factory fails on, are skipped.
pub(crate) fn build_sessions(
    factory: &dyn SessionFactory,
    configs: Vec<ConnectionConfig>,
) -> Vec<Session> {
    let mut seen = HashSet::new();
    let mut built = Vec::new();
    for config in configs {
        let Some(identity) = config.identity().cloned() else {
            continue;
        };
        if identity.is_empty() || !seen.insert(identity.clone()) {
            continue;
        }
        match factory.create_session(config) {
            Ok(session) => built.push(session),
            Err(e) => error!(identity = %identity, error = %e, "Failed to build session"),
        }
    }
    built
}
