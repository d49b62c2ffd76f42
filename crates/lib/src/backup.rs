//! Per-identity key-backup state listeners.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use handle_trait::Handle;
use tracing::{debug, info, warn};

use crate::{engine::BackupEngine, identity::Identity, ui::ActiveContext};

/// State of an account's server-side key backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackupState {
    Unknown,
    CheckingBackUpOnHomeserver,
    /// The server holds a backup made with a recovery method this device
    /// does not know about.
    WrongBackUpVersion,
    Disabled,
    NotTrusted,
    Enabling,
    ReadyToBackUp,
    WillBackUp,
    BackingUp,
}

/// Receives key-backup state transitions.
pub trait BackupStateListener: Send + Sync {
    fn on_state_change(&self, state: BackupState);
}

/// Listener that surfaces a "new recovery method" prompt.
struct RecoveryMethodPrompt {
    identity: Identity,
    ui: ActiveContext,
}

impl BackupStateListener for RecoveryMethodPrompt {
    fn on_state_change(&self, state: BackupState) {
        if state != BackupState::WrongBackUpVersion {
            return;
        }
        match self.ui.current() {
            Some(context) => {
                info!(identity = %self.identity, "New key-backup recovery method detected");
                context.surface().show_new_recovery_method(&self.identity);
            }
            None => {
                warn!(identity = %self.identity, "No active interactive context, skipping recovery method prompt");
            }
        }
    }
}

/// At most one backup-state listener per identity.
///
/// Listeners are attached to the account's [`BackupEngine`] on
/// [`register`](Self::register) and detached on
/// [`unregister`](Self::unregister).
#[derive(Clone, Handle)]
pub struct KeyBackupListenerRegistry {
    listeners: Arc<Mutex<HashMap<Identity, Arc<dyn BackupStateListener>>>>,
    ui: ActiveContext,
}

impl KeyBackupListenerRegistry {
    pub fn new(ui: ActiveContext) -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            ui,
        }
    }

    /// Attach a listener for `identity` to `backup`.
    ///
    /// Returns false, leaving everything untouched, if `identity` already has
    /// one.
    pub fn register(&self, identity: &Identity, backup: &Arc<dyn BackupEngine>) -> bool {
        let listener: Arc<dyn BackupStateListener> = {
            let mut listeners = self.listeners.lock().unwrap();
            if listeners.contains_key(identity) {
                debug!(identity = %identity, "Backup listener already registered");
                return false;
            }
            let listener: Arc<dyn BackupStateListener> = Arc::new(RecoveryMethodPrompt {
                identity: identity.clone(),
                ui: self.ui.handle(),
            });
            listeners.insert(identity.clone(), Arc::clone(&listener));
            listener
        };
        backup.add_listener(listener);
        debug!(identity = %identity, "Registered backup listener");
        true
    }

    /// Remove the listener for `identity`, detaching it from `backup` when
    /// the account still has one. Returns false if none was registered.
    pub fn unregister(&self, identity: &Identity, backup: Option<&Arc<dyn BackupEngine>>) -> bool {
        let Some(listener) = self.listeners.lock().unwrap().remove(identity) else {
            return false;
        };
        if let Some(backup) = backup {
            backup.remove_listener(&listener);
        }
        debug!(identity = %identity, "Unregistered backup listener");
        true
    }

    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.listeners.lock().unwrap().contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().unwrap().is_empty()
    }
}
