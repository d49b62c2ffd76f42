//! Error types for credential storage.

use thiserror::Error;

/// Errors raised by a [`CredentialStore`](super::CredentialStore).
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Reading or writing the persistence file failed.
    #[error("Credential file I/O error: {source}")]
    FileIo {
        #[source]
        source: std::io::Error,
    },

    /// Serializing the stored configurations failed.
    #[error("Failed to serialize credentials: {source}")]
    SerializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// The persistence file could not be parsed.
    #[error("Failed to deserialize credentials: {source}")]
    DeserializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// The credential file was written in a format this build cannot read.
    #[error("Unsupported credential file format {found}, expected {supported}")]
    UnsupportedFormat { found: u8, supported: u8 },

    /// No configuration is stored under the given key.
    #[error("No stored configuration for {key}")]
    NotFound { key: String },

    /// The store backend refused the operation.
    #[error("Credential store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl CredentialError {
    /// Check if this error indicates a configuration was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CredentialError::NotFound { .. })
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, CredentialError::FileIo { .. })
    }

    /// Check if a credential file was written in an unreadable format.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, CredentialError::UnsupportedFormat { .. })
    }

    /// Check if this error came from (de)serialization.
    pub fn is_serialization_error(&self) -> bool {
        matches!(
            self,
            CredentialError::SerializationFailed { .. } | CredentialError::DeserializationFailed { .. }
        )
    }
}

impl From<CredentialError> for crate::Error {
    fn from(err: CredentialError) -> Self {
        crate::Error::Credential(err)
    }
}
