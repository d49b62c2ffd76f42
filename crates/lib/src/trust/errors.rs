//! Error types for certificate trust handling.

use thiserror::Error;

/// Errors raised while handling certificate trust.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TrustError {
    /// A fingerprint could not be parsed or had the wrong digest length.
    #[error("Invalid fingerprint: {reason}")]
    InvalidFingerprint { reason: String },
}

impl TrustError {
    /// Check if this error is a malformed fingerprint.
    pub fn is_invalid_fingerprint(&self) -> bool {
        matches!(self, TrustError::InvalidFingerprint { .. })
    }
}

impl From<TrustError> for crate::Error {
    fn from(err: TrustError) -> Self {
        crate::Error::Trust(err)
    }
}
