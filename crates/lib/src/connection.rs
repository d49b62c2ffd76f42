//! Server connection configuration.
//!
//! A [`ConnectionConfig`] is what the credential store persists for every
//! account: the homeserver, the login credentials, and the certificate
//! fingerprints the user has explicitly trusted for that server.

use std::{
    fmt,
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::Zeroizing;

use crate::{fingerprint::Fingerprint, identity::Identity};

/// Login credentials for one account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account identity (user id)
    pub user_id: Identity,
    /// Access token, wiped from memory on drop
    pub access_token: Zeroizing<String>,
    /// Device id; end-to-end encryption is enabled when this is non-empty
    #[serde(default)]
    pub device_id: Option<String>,
    /// Homeserver name announced at login
    #[serde(default)]
    pub home_server: Option<String>,
}

impl Credentials {
    pub fn new(user_id: impl Into<Identity>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: Zeroizing::new(access_token.into()),
            device_id: None,
            home_server: None,
        }
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Whether a device id is present and non-empty.
    pub fn has_device(&self) -> bool {
        self.device_id.as_deref().is_some_and(|d| !d.is_empty())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("home_server", &self.home_server)
            .finish()
    }
}

/// Key under which the credential store files a configuration.
///
/// Configurations with credentials are keyed by identity; a configuration
/// for a not-yet-logged-in account falls back to its homeserver URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Identity(Identity),
    Homeserver(String),
}

/// Homeserver URI, optional credentials and accepted certificate fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub homeserver: Url,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub allowed_fingerprints: Vec<Fingerprint>,
}

impl ConnectionConfig {
    /// A configuration for a homeserver with no account attached yet.
    pub fn new(homeserver: Url) -> Self {
        Self {
            homeserver,
            credentials: None,
            allowed_fingerprints: Vec::new(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// The account identity, if credentials are present.
    pub fn identity(&self) -> Option<&Identity> {
        self.credentials.as_ref().map(|c| &c.user_id)
    }

    /// The key the credential store uses for this configuration.
    pub fn store_key(&self) -> StoreKey {
        match self.identity() {
            Some(id) => StoreKey::Identity(id.clone()),
            None => StoreKey::Homeserver(self.homeserver.to_string()),
        }
    }

    /// Add a fingerprint to the allowed set. Returns false if already present.
    pub fn allow(&mut self, fingerprint: Fingerprint) -> bool {
        if self.allowed_fingerprints.contains(&fingerprint) {
            return false;
        }
        self.allowed_fingerprints.push(fingerprint);
        true
    }

    /// Whether the fingerprint has been explicitly trusted.
    pub fn is_allowed(&self, fingerprint: &Fingerprint) -> bool {
        self.allowed_fingerprints.contains(fingerprint)
    }
}

/// The single in-process copy of a configuration that a session references.
///
/// Trusting a certificate mutates this copy and then persists a snapshot of
/// it through the credential store.
pub type SharedConfig = Arc<RwLock<ConnectionConfig>>;

/// Wrap a configuration for sharing.
pub fn share(config: ConnectionConfig) -> SharedConfig {
    Arc::new(RwLock::new(config))
}
