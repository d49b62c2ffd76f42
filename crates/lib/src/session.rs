//! Runtime handle for one authenticated account.

use std::{
    fmt,
    sync::{Arc, Mutex, RwLock, Weak},
};

use handle_trait::Handle;

use crate::{
    connection::{ConnectionConfig, SharedConfig},
    engine::{CryptoEngine, DataHandler, EngineSession, SessionListener},
    identity::Identity,
};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Alive,
    /// A teardown is in progress.
    Releasing,
    /// The account was deactivated on the server.
    Deactivated,
    /// The session was logged out or its local data released.
    Cleared,
}

struct SessionInner {
    identity: Identity,
    config: SharedConfig,
    engine: Arc<dyn EngineSession>,
    state: RwLock<SessionState>,
    listener: Mutex<Option<Arc<dyn SessionListener>>>,
}

/// One account's session, bound to exactly one [`ConnectionConfig`].
///
/// Cloning yields another handle to the same session. Two handles compare
/// equal when they belong to the same identity.
#[derive(Clone, Handle)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Wrap an engine session for the account identified by `identity`.
    pub fn new(identity: Identity, config: SharedConfig, engine: Arc<dyn EngineSession>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                identity,
                config,
                engine,
                state: RwLock::new(SessionState::Alive),
                listener: Mutex::new(None),
            }),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    /// The shared configuration; trust decisions mutate it in place.
    pub fn config(&self) -> &SharedConfig {
        &self.inner.config
    }

    /// A snapshot of the configuration.
    pub fn config_snapshot(&self) -> ConnectionConfig {
        self.inner.config.read().unwrap().clone()
    }

    pub fn engine(&self) -> &Arc<dyn EngineSession> {
        &self.inner.engine
    }

    pub fn data_handler(&self) -> Option<Arc<dyn DataHandler>> {
        self.inner.engine.data_handler()
    }

    pub fn crypto(&self) -> Option<Arc<dyn CryptoEngine>> {
        self.inner.engine.crypto()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.read().unwrap()
    }

    pub fn is_alive(&self) -> bool {
        self.state() == SessionState::Alive
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        *self.inner.state.write().unwrap() = state;
    }

    /// Move an alive session to [`SessionState::Releasing`]. Returns false,
    /// changing nothing, if it was not alive.
    pub(crate) fn begin_release(&self) -> bool {
        let mut state = self.inner.state.write().unwrap();
        if *state != SessionState::Alive {
            return false;
        }
        *state = SessionState::Releasing;
        true
    }

    pub fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Register the session's live-event listener on its data handler.
    ///
    /// Replaces (and detaches) any listener attached earlier.
    pub(crate) fn attach_listener(&self, listener: Arc<dyn SessionListener>) {
        self.detach_listener();
        if let Some(handler) = self.data_handler() {
            handler.add_listener(Arc::clone(&listener));
        }
        *self.inner.listener.lock().unwrap() = Some(listener);
    }

    /// Detach the live-event listener. Only the first call after
    /// [`attach_listener`](Self::attach_listener) does anything.
    pub(crate) fn detach_listener(&self) -> bool {
        let Some(listener) = self.inner.listener.lock().unwrap().take() else {
            return false;
        };
        if let Some(handler) = self.data_handler() {
            handler.remove_listener(&listener);
        }
        true
    }

    pub fn has_listener(&self) -> bool {
        self.inner.listener.lock().unwrap().is_some()
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.inner.identity == other.inner.identity
    }
}

impl Eq for Session {}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.inner.identity)
            .field("state", &self.state())
            .field("listener", &self.has_listener())
            .finish()
    }
}

/// Non-owning reference to a [`Session`], held by engine callbacks.
#[derive(Clone)]
pub struct WeakSession {
    inner: Weak<SessionInner>,
}

impl WeakSession {
    pub fn upgrade(&self) -> Option<Session> {
        self.inner.upgrade().map(|inner| Session { inner })
    }
}
