//! Persisted server connection configurations.
//!
//! The [`CredentialStore`] trait is the authoritative persisted list of
//! accounts. The registry and coordinator never cache a copy of the list
//! across calls that mutate it; they ask the store again.
//!
//! [`InMemoryCredentials`] is the bundled implementation, with optional JSON
//! file persistence.

use async_trait::async_trait;

use crate::{Result, connection::ConnectionConfig};

pub mod errors;
mod in_memory;

pub use errors::CredentialError;
pub use in_memory::InMemoryCredentials;

/// Storage for persisted connection configurations.
///
/// Configurations are filed under their [`store_key`](ConnectionConfig::store_key):
/// at most one configuration per key is stored.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// All stored configurations, in store order.
    async fn list(&self) -> Result<Vec<ConnectionConfig>>;

    /// Store a configuration. An existing configuration with the same key is
    /// replaced in place; otherwise the configuration is appended.
    async fn add(&self, config: &ConnectionConfig) -> Result<()>;

    /// Remove the configuration with the same key. Removing an absent
    /// configuration is not an error.
    async fn remove(&self, config: &ConnectionConfig) -> Result<()>;

    /// Overwrite the stored configuration with the same key, appending it if
    /// none exists.
    async fn replace(&self, config: &ConnectionConfig) -> Result<()>;
}
