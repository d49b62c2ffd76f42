//! Deduplication of concurrent trust prompts.

use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex},
};

use handle_trait::Handle;
use tracing::debug;

use crate::{connection::ConnectionConfig, fingerprint::Fingerprint, identity::Identity};

/// Key used to deduplicate concurrent trust prompts.
///
/// Accounts with credentials are keyed by identity, so one account never has
/// two prompts open even for different certificates. Before login the key is
/// the homeserver URL plus the fingerprint hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DialogKey {
    Identity(Identity),
    Host { homeserver: String, fingerprint_hex: String },
}

impl DialogKey {
    /// The key for a prompt about `fingerprint` on `config`.
    pub fn for_config(config: &ConnectionConfig, fingerprint: &Fingerprint) -> Self {
        match config.identity() {
            Some(id) => DialogKey::Identity(id.clone()),
            None => DialogKey::Host {
                homeserver: config.homeserver.to_string(),
                fingerprint_hex: fingerprint.to_hex(),
            },
        }
    }
}

impl fmt::Display for DialogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogKey::Identity(id) => write!(f, "{id}"),
            DialogKey::Host {
                homeserver,
                fingerprint_hex,
            } => write!(f, "{homeserver}{fingerprint_hex}"),
        }
    }
}

/// Set of dialog keys with a prompt currently awaiting a decision.
///
/// Opening is an atomic check-and-set: [`try_open`](Self::try_open) hands out
/// at most one [`OpenDialog`] per key. The key stays open until that guard is
/// dropped.
#[derive(Debug, Clone, Default, Handle)]
pub struct NegotiationDeduplicator {
    open: Arc<Mutex<HashSet<DialogKey>>>,
}

impl NegotiationDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` open. Returns `None` if a prompt for it is already open.
    pub fn try_open(&self, key: DialogKey) -> Option<OpenDialog> {
        let inserted = self.open.lock().unwrap().insert(key.clone());
        if !inserted {
            return None;
        }
        Some(OpenDialog {
            key,
            open: Arc::clone(&self.open),
        })
    }

    pub fn is_open(&self, key: &DialogKey) -> bool {
        self.open.lock().unwrap().contains(key)
    }

    /// Number of prompts currently open.
    pub fn len(&self) -> usize {
        self.open.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.lock().unwrap().is_empty()
    }
}

/// An open prompt slot. Dropping it releases the key.
#[derive(Debug)]
pub struct OpenDialog {
    key: DialogKey,
    open: Arc<Mutex<HashSet<DialogKey>>>,
}

impl OpenDialog {
    pub fn key(&self) -> &DialogKey {
        &self.key
    }
}

impl Drop for OpenDialog {
    fn drop(&mut self) {
        // A poisoned set still gets the key removed.
        let mut open = match self.open.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        open.remove(&self.key);
        debug!(dialog = %self.key, "Released trust dialog");
    }
}
