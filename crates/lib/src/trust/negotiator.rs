//! The accept / ignore / reject flow for one unrecognized certificate.

use std::{error::Error as StdError, sync::Arc};

use tracing::{debug, info, warn};

use super::{
    cache::TrustDecisionCache,
    certificate::{CertificateErrorClassifier, SourceChainClassifier},
    dedup::{DialogKey, NegotiationDeduplicator},
};
use crate::{
    Result,
    connection::SharedConfig,
    credentials::CredentialStore,
    fingerprint::Fingerprint,
    ui::{ActiveContext, PromptExplanation, PromptSubject, TrustOption, TrustPrompt},
};

/// How a negotiation ended.
///
/// Only the first three carry a user decision. The others mean no prompt was
/// answered and the caller should not act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    /// The fingerprint was added to the configuration's allowed set.
    Accepted,
    /// The user chose to stay offline, now or in an earlier prompt.
    Ignored,
    /// The user refused the certificate; the account should be logged out.
    Rejected,
    /// The interactive context went away before the user decided.
    Dismissed,
    /// A prompt for the same dialog key is already open.
    AlreadyPrompting,
    /// No interactive context is attached.
    NoActiveContext,
}

impl Negotiation {
    /// Whether the user (or a remembered decision) settled the negotiation.
    pub fn is_decided(&self) -> bool {
        matches!(
            self,
            Negotiation::Accepted | Negotiation::Ignored | Negotiation::Rejected
        )
    }

    pub fn should_logout(&self) -> bool {
        matches!(self, Negotiation::Rejected)
    }
}

/// Runs trust negotiations against the active interactive context.
///
/// Clones share the open-dialog set and the decision cache, so every clone
/// enforces the same at-most-one-prompt rule.
#[derive(Clone)]
pub struct CertTrustNegotiator {
    dedup: NegotiationDeduplicator,
    cache: TrustDecisionCache,
    ui: ActiveContext,
    credentials: Arc<dyn CredentialStore>,
    classifier: Arc<dyn CertificateErrorClassifier>,
}

impl CertTrustNegotiator {
    pub fn new(ui: ActiveContext, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            dedup: NegotiationDeduplicator::new(),
            cache: TrustDecisionCache::new(),
            ui,
            credentials,
            classifier: Arc::new(SourceChainClassifier),
        }
    }

    /// Replace the classifier used by [`handle`](Self::handle).
    pub fn with_classifier(mut self, classifier: Arc<dyn CertificateErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn cache(&self) -> &TrustDecisionCache {
        &self.cache
    }

    pub fn deduplicator(&self) -> &NegotiationDeduplicator {
        &self.dedup
    }

    /// Negotiate the certificate carried by a network error, if any.
    ///
    /// Returns `Ok(None)` when `error` is not a certificate-trust failure, so
    /// the caller can fall through to its other error handling.
    pub async fn handle(
        &self,
        config: &SharedConfig,
        error: &(dyn StdError + 'static),
    ) -> Result<Option<Negotiation>> {
        let Some(failure) = self.classifier.certificate_failure(error) else {
            return Ok(None);
        };
        self.show(config, failure.fingerprint, false).await.map(Some)
    }

    /// Ask the user whether to trust `fingerprint` for `config`.
    ///
    /// `existing` selects the prompt variant for an account that is already
    /// stored (trust / remain offline / log out) over the new-login variant
    /// (trust / cancel). The returned future resolves once the user decides,
    /// or the interactive context is destroyed; dropping it early releases
    /// the dialog key.
    pub async fn show(
        &self,
        config: &SharedConfig,
        fingerprint: Fingerprint,
        existing: bool,
    ) -> Result<Negotiation> {
        let (key, identity, prompt) = {
            let config = config.read().unwrap();
            let key = DialogKey::for_config(&config, &fingerprint);
            let subject = match config.identity() {
                Some(id) => PromptSubject::Account(id.clone()),
                None => PromptSubject::Homeserver(config.homeserver.clone()),
            };
            let explanation = match (existing, config.allowed_fingerprints.is_empty()) {
                (false, _) => PromptExplanation::NewAccount,
                (true, false) => PromptExplanation::ExpectedExisting,
                (true, true) => PromptExplanation::UnexpectedExisting,
            };
            let options = if existing {
                vec![
                    TrustOption::Trust,
                    TrustOption::RemainOffline,
                    TrustOption::Logout,
                ]
            } else {
                vec![TrustOption::Trust, TrustOption::Cancel]
            };
            let prompt = TrustPrompt {
                fingerprint: fingerprint.clone(),
                subject,
                explanation,
                options,
            };
            (key, config.identity().cloned(), prompt)
        };

        let Some(_dialog) = self.dedup.try_open(key.clone()) else {
            info!(dialog = %key, "Not opening trust dialog, one is already open");
            return Ok(Negotiation::AlreadyPrompting);
        };

        if let Some(id) = &identity {
            if self.cache.is_ignored(id, &fingerprint) {
                debug!(identity = %id, fingerprint = %fingerprint, "Certificate previously ignored");
                return Ok(Negotiation::Ignored);
            }
        }

        let Some(context) = self.ui.current() else {
            warn!(dialog = %key, "No active interactive context, skipping trust prompt");
            return Ok(Negotiation::NoActiveContext);
        };

        debug!(dialog = %key, fingerprint = %fingerprint, existing, "Showing trust prompt");
        let choice = tokio::select! {
            choice = context.surface().ask_trust(&prompt) => choice,
            _ = context.destroyed() => {
                info!(dialog = %key, "Trust prompt dismissed by context teardown");
                return Ok(Negotiation::Dismissed);
            }
        };

        if !prompt.offers(choice) {
            warn!(dialog = %key, ?choice, "Surface returned an option that was not offered");
        }

        let outcome = match choice {
            TrustOption::Trust => {
                let snapshot = {
                    let mut config = config.write().unwrap();
                    config.allow(fingerprint.clone());
                    config.clone()
                };
                if snapshot.credentials.is_some() {
                    self.credentials.replace(&snapshot).await?;
                }
                Negotiation::Accepted
            }
            TrustOption::RemainOffline if existing => {
                if let Some(id) = &identity {
                    self.cache.ignore(id, fingerprint.clone());
                }
                Negotiation::Ignored
            }
            TrustOption::RemainOffline | TrustOption::Logout | TrustOption::Cancel => {
                Negotiation::Rejected
            }
        };
        info!(dialog = %key, fingerprint = %fingerprint, ?outcome, "Trust negotiation finished");
        Ok(outcome)
    }
}
