//!
//! Roster: a multi-account session registry with trust-on-first-use
//! certificate negotiation.
//!
//! The crate orchestrates account sessions on top of an external protocol
//! engine. It never speaks the protocol itself and never renders anything.
//!
//! ## Core Concepts
//!
//! * **Credential store (`credentials::CredentialStore`)**: the persisted list of
//!   server connection configurations, one per account.
//! * **Sessions (`session::Session`)**: runtime handles bound to one configuration,
//!   built by the engine plugged in through `engine::SessionEngine`.
//! * **Registry (`registry::SessionRegistry`)**: the ordered, identity-unique list of
//!   active sessions. Index 0 is the default session.
//! * **Lifecycle (`lifecycle::SessionLifecycleCoordinator`)**: builds sessions, wires
//!   their listeners, and runs deactivate / clear / reload teardown.
//! * **Trust (`trust::CertTrustNegotiator`)**: asks the user about unrecognized server
//!   certificates, at most one prompt per account at a time, remembering ignored
//!   fingerprints.
//! * **Key backup (`backup::KeyBackupListenerRegistry`)**: one backup-state listener
//!   per account, surfacing new recovery methods.
//! * **Interactive context (`ui::ActiveContext`)**: whatever surface is currently able
//!   to show prompts, if any.

pub mod backup;
pub mod connection;
pub mod credentials;
pub mod engine;
pub mod fingerprint;
pub mod identity;
pub mod lifecycle;
pub mod registry;
pub mod session;
pub mod settings;
pub mod trust;
pub mod ui;

pub use connection::{ConnectionConfig, Credentials, SharedConfig};
pub use fingerprint::{Fingerprint, HashType};
pub use identity::Identity;
pub use lifecycle::SessionLifecycleCoordinator;
pub use registry::SessionRegistry;
pub use session::Session;
pub use settings::RosterSettings;

/// Result type used throughout the Roster library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Roster library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured credential store errors from the credentials module
    #[error(transparent)]
    Credential(credentials::CredentialError),

    /// Structured registry errors from the registry module
    #[error(transparent)]
    Registry(registry::RegistryError),

    /// Structured lifecycle errors from the lifecycle module
    #[error(transparent)]
    Lifecycle(lifecycle::LifecycleError),

    /// Structured certificate trust errors from the trust module
    #[error(transparent)]
    Trust(trust::TrustError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Credential(_) => "credentials",
            Error::Registry(_) => "registry",
            Error::Lifecycle(_) => "lifecycle",
            Error::Trust(_) => "trust",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Credential(err) => err.is_not_found(),
            Error::Registry(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Registry(err) => err.is_duplicate(),
            _ => false,
        }
    }

    /// Check if the operation targeted an already released session.
    pub fn is_already_released(&self) -> bool {
        match self {
            Error::Lifecycle(err) => err.is_already_released(),
            _ => false,
        }
    }

    /// Check if an engine teardown step failed.
    pub fn is_teardown_failure(&self) -> bool {
        match self {
            Error::Lifecycle(err) => err.is_teardown_failure(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Credential(err) => err.is_io_error(),
            _ => false,
        }
    }

    /// Check if this error came from (de)serialization.
    pub fn is_serialization_error(&self) -> bool {
        match self {
            Error::Serialize(_) => true,
            Error::Credential(err) => err.is_serialization_error(),
            _ => false,
        }
    }

    /// Check if this error is certificate trust related.
    pub fn is_trust_error(&self) -> bool {
        matches!(self, Error::Trust(_))
    }
}
