//! Extracting certificate-trust failures from transport errors.

use std::error::Error as StdError;

use thiserror::Error;

use crate::{engine::EngineError, fingerprint::Fingerprint};

/// The server presented a certificate that is not in the allowed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized certificate {fingerprint}")]
pub struct UnrecognizedCertificate {
    pub fingerprint: Fingerprint,
}

impl UnrecognizedCertificate {
    pub fn new(fingerprint: Fingerprint) -> Self {
        Self { fingerprint }
    }
}

/// Finds a certificate-trust failure inside a generic transport error.
pub trait CertificateErrorClassifier: Send + Sync {
    /// The untrusted certificate carried by `error`, if any.
    fn certificate_failure(
        &self,
        error: &(dyn StdError + 'static),
    ) -> Option<UnrecognizedCertificate>;
}

/// Walks the `source()` chain looking for an [`UnrecognizedCertificate`].
///
/// Wrappers that hide their inner error from `source()` are looked through
/// explicitly: [`EngineError::UntrustedCertificate`] and custom
/// [`std::io::Error`] payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceChainClassifier;

impl SourceChainClassifier {
    fn inspect(error: &(dyn StdError + 'static)) -> Option<UnrecognizedCertificate> {
        if let Some(cert) = error.downcast_ref::<UnrecognizedCertificate>() {
            return Some(cert.clone());
        }
        if let Some(EngineError::UntrustedCertificate(cert)) = error.downcast_ref::<EngineError>() {
            return Some(cert.clone());
        }
        if let Some(inner) = error
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
        {
            return Self::inspect(inner);
        }
        None
    }
}

impl CertificateErrorClassifier for SourceChainClassifier {
    fn certificate_failure(
        &self,
        error: &(dyn StdError + 'static),
    ) -> Option<UnrecognizedCertificate> {
        let mut current = Some(error);
        while let Some(err) = current {
            if let Some(cert) = Self::inspect(err) {
                return Some(cert);
            }
            current = err.source();
        }
        None
    }
}
