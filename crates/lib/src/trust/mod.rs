//! Trust-on-first-use handling of unrecognized server certificates.
//!
//! When a request fails because the server presented a certificate that is
//! not in the configuration's allowed set, the [`CertTrustNegotiator`] asks
//! the user what to do. At most one prompt is open per dialog key
//! ([`NegotiationDeduplicator`]), and fingerprints the user chose to ignore
//! are remembered per identity ([`TrustDecisionCache`]) so the same account
//! is not asked again for the same certificate.

mod cache;
mod certificate;
mod dedup;
pub mod errors;
mod negotiator;

pub use cache::TrustDecisionCache;
pub use certificate::{CertificateErrorClassifier, SourceChainClassifier, UnrecognizedCertificate};
pub use dedup::{DialogKey, NegotiationDeduplicator, OpenDialog};
pub use errors::TrustError;
pub use negotiator::{CertTrustNegotiator, Negotiation};
