//! Engine callbacks installed on every session the coordinator builds.

use std::sync::{
    Arc, Weak,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, error, info, warn};

use super::{CoordinatorInner, SessionLifecycleCoordinator};
use crate::{
    connection::SharedConfig,
    engine::{
        EVENT_TYPE_MESSAGE, EVENT_TYPE_RECEIPT, NetworkErrorListener, SessionListener,
        UNKNOWN_TOKEN,
    },
    identity::Identity,
    session::WeakSession,
    trust::{Negotiation, UnrecognizedCertificate},
};

/// Flags raised by live events, shared by every session's listener.
#[derive(Debug, Default)]
pub(crate) struct LiveEventFlags {
    pub(crate) refresh_unread: AtomicBool,
    pub(crate) clear_cache_required: AtomicBool,
}

/// Live-event and sync listener for one session.
pub(crate) struct SessionEvents {
    session: WeakSession,
    identity: Identity,
    coordinator: Weak<CoordinatorInner>,
    initial_sync_handled: AtomicBool,
}

impl SessionEvents {
    pub(crate) fn new(
        session: WeakSession,
        identity: Identity,
        coordinator: Weak<CoordinatorInner>,
    ) -> Self {
        Self {
            session,
            identity,
            coordinator,
            initial_sync_handled: AtomicBool::new(false),
        }
    }
}

impl SessionListener for SessionEvents {
    fn on_live_event(&self, event_type: &str) {
        if event_type == EVENT_TYPE_MESSAGE || event_type == EVENT_TYPE_RECEIPT {
            if let Some(coordinator) = self.coordinator.upgrade() {
                coordinator.live.refresh_unread.store(true, Ordering::Relaxed);
            }
        }
    }

    fn on_live_events_chunk_processed(&self) {
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.syncing.lock().unwrap().remove(&self.identity);
        }
    }

    fn on_ignored_users_update(&self) {
        // The cache is cleared on the next reload.
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator
                .live
                .clear_cache_required
                .store(true, Ordering::Relaxed);
        }
    }

    fn on_crypto_sync_complete(&self) {
        debug!(identity = %self.identity, "Crypto sync complete");
    }

    fn on_initial_sync_complete(&self) {
        debug!(identity = %self.identity, "Initial sync complete");
        if self.initial_sync_handled.swap(true, Ordering::AcqRel) {
            return;
        }
        let (Some(coordinator), Some(session)) =
            (self.coordinator.upgrade(), self.session.upgrade())
        else {
            return;
        };
        coordinator.install_crypto_handlers(&session);
    }
}

/// Request-level network failures of one session.
pub(crate) struct NetworkErrors {
    pub(crate) session: WeakSession,
    pub(crate) identity: Identity,
    pub(crate) config: SharedConfig,
    pub(crate) coordinator: Weak<CoordinatorInner>,
}

impl NetworkErrorListener for NetworkErrors {
    fn on_certificate_error(&self, certificate: UnrecognizedCertificate) {
        let Some(coordinator) = self.coordinator.upgrade() else {
            return;
        };
        let Some(runtime) = coordinator.runtime.clone() else {
            warn!(identity = %self.identity, "No async runtime, cannot negotiate certificate");
            return;
        };
        debug!(identity = %self.identity, fingerprint = %certificate.fingerprint, "Found unrecognized certificate");

        let session = self.session.clone();
        let identity = self.identity.clone();
        let config = Arc::clone(&self.config);
        runtime.spawn(async move {
            let negotiation = coordinator
                .negotiator
                .show(&config, certificate.fingerprint, true)
                .await;
            match negotiation {
                Ok(Negotiation::Rejected) => {
                    info!(identity = %identity, "Certificate rejected, logging out");
                    let Some(session) = session.upgrade() else {
                        return;
                    };
                    let coordinator = SessionLifecycleCoordinator::from_inner(coordinator);
                    if let Err(e) = coordinator.clear(&session, true).await {
                        error!(identity = %identity, error = %e, "Logout after certificate rejection failed");
                    }
                }
                Ok(outcome) => {
                    debug!(identity = %identity, ?outcome, "Certificate negotiation finished");
                }
                Err(e) => {
                    error!(identity = %identity, error = %e, "Certificate negotiation failed");
                }
            }
        });
    }

    fn on_configuration_error(&self, code: &str) {
        error!(identity = %self.identity, code, "Configuration error");
        if code == UNKNOWN_TOKEN {
            error!(identity = %self.identity, "Access token is no longer valid");
        }
    }
}
