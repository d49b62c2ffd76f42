//! Error types for the session registry.

use thiserror::Error;

use crate::identity::Identity;

/// Errors raised by the [`SessionRegistry`](super::SessionRegistry).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A session for this identity is already registered.
    #[error("A session for {identity} is already registered")]
    DuplicateIdentity { identity: Identity },

    /// No session is registered for this identity.
    #[error("No session registered for {identity}")]
    NotFound { identity: Identity },
}

impl RegistryError {
    /// Check if this error indicates a session was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }

    /// Check if this error indicates the identity is already registered.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RegistryError::DuplicateIdentity { .. })
    }

    /// The identity the error is about.
    pub fn identity(&self) -> &Identity {
        match self {
            RegistryError::DuplicateIdentity { identity } | RegistryError::NotFound { identity } => {
                identity
            }
        }
    }
}

impl From<RegistryError> for crate::Error {
    fn from(err: RegistryError) -> Self {
        crate::Error::Registry(err)
    }
}
