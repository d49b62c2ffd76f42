//! Per-identity record of ignored certificate fingerprints.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use handle_trait::Handle;

use crate::{fingerprint::Fingerprint, identity::Identity};

/// Fingerprints the user chose to ignore ("remain offline"), per identity.
///
/// Ignoring is not trusting: ignored fingerprints are never added to a
/// configuration's allowed set and are not persisted. Entries live as long
/// as the cache does; nothing is evicted unless [`evict`](Self::evict) or
/// [`clear`](Self::clear) is called.
///
/// The cache is a cheap-to-clone handle; clones share the same entries.
#[derive(Debug, Clone, Default, Handle)]
pub struct TrustDecisionCache {
    ignored: Arc<Mutex<HashMap<Identity, HashSet<Fingerprint>>>>,
}

impl TrustDecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `fingerprint` was ignored for `identity`.
    ///
    /// Returns false if it was already recorded.
    pub fn ignore(&self, identity: &Identity, fingerprint: Fingerprint) -> bool {
        self.ignored
            .lock()
            .unwrap()
            .entry(identity.clone())
            .or_default()
            .insert(fingerprint)
    }

    /// Whether `fingerprint` has been ignored for `identity`.
    pub fn is_ignored(&self, identity: &Identity, fingerprint: &Fingerprint) -> bool {
        self.ignored
            .lock()
            .unwrap()
            .get(identity)
            .is_some_and(|set| set.contains(fingerprint))
    }

    /// Snapshot of the fingerprints ignored for `identity`.
    pub fn ignored(&self, identity: &Identity) -> Vec<Fingerprint> {
        self.ignored
            .lock()
            .unwrap()
            .get(identity)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forget every decision recorded for `identity`.
    pub fn evict(&self, identity: &Identity) -> bool {
        self.ignored.lock().unwrap().remove(identity).is_some()
    }

    /// Forget every decision.
    pub fn clear(&self) {
        self.ignored.lock().unwrap().clear();
    }

    /// Number of identities with at least one ignored fingerprint.
    pub fn len(&self) -> usize {
        self.ignored.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ignored.lock().unwrap().is_empty()
    }
}
