//! Error types for session lifecycle operations.

use std::fmt;

use thiserror::Error;

use crate::{engine::EngineError, identity::Identity};

/// The engine operation a teardown was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    Deactivate,
    Logout,
    ClearLocal,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TeardownStep::Deactivate => "deactivate",
            TeardownStep::Logout => "logout",
            TeardownStep::ClearLocal => "clear",
        };
        f.write_str(name)
    }
}

/// Errors raised while building or tearing down sessions.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The session was already deactivated, cleared, or is being released.
    #[error("Session {identity} is already released")]
    AlreadyReleased { identity: Identity },

    /// A session can only be built from a configuration with credentials.
    #[error("No credentials for homeserver {homeserver}")]
    MissingCredentials { homeserver: String },

    /// The engine could not open the session.
    #[error("Failed to open session {identity}: {source}")]
    Open {
        identity: Identity,
        #[source]
        source: EngineError,
    },

    /// Crypto-dependent wiring was requested on a session without crypto.
    #[error("Session {identity} has no crypto engine")]
    MissingCryptoEngine { identity: Identity },

    /// An engine teardown operation failed; local state was left in place.
    #[error("{step} failed for {identity}: {source}")]
    Teardown {
        identity: Identity,
        step: TeardownStep,
        #[source]
        source: EngineError,
    },
}

impl LifecycleError {
    /// Check if the session was already released.
    pub fn is_already_released(&self) -> bool {
        matches!(self, LifecycleError::AlreadyReleased { .. })
    }

    /// Check if an engine teardown operation failed.
    pub fn is_teardown_failure(&self) -> bool {
        matches!(self, LifecycleError::Teardown { .. })
    }

    /// Check if the configuration had no usable credentials.
    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, LifecycleError::MissingCredentials { .. })
    }

    /// The teardown step that failed, if this is a teardown failure.
    pub fn teardown_step(&self) -> Option<TeardownStep> {
        match self {
            LifecycleError::Teardown { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<LifecycleError> for crate::Error {
    fn from(err: LifecycleError) -> Self {
        crate::Error::Lifecycle(err)
    }
}
