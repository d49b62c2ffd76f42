//! In-memory credential store with JSON persistence.

use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CredentialError, CredentialStore};
use crate::{Result, connection::ConnectionConfig};

/// Format version written to the `_v` field of the credential file.
const FILE_FORMAT: u8 = 0;

/// On-disk layout of the credential file.
#[derive(Serialize, Deserialize)]
struct CredentialFile {
    /// Files written before the field existed have no `_v` and read as 0.
    #[serde(rename = "_v", default)]
    format: u8,
    configs: Vec<ConnectionConfig>,
}

/// A credential store keeping configurations in memory.
///
/// Created with [`InMemoryCredentials::open`], the store is bound to a JSON
/// file and rewrites it after every mutation. Created with
/// [`InMemoryCredentials::new`], nothing is persisted unless
/// [`save_to_file`](Self::save_to_file) is called.
///
/// **Security Note**: access tokens are written to the file in plaintext.
#[derive(Debug, Default)]
pub struct InMemoryCredentials {
    configs: RwLock<Vec<ConnectionConfig>>,
    path: Option<PathBuf>,
}

impl InMemoryCredentials {
    /// Creates a new, empty store with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with configurations, in order.
    pub fn with_configs(configs: Vec<ConnectionConfig>) -> Self {
        Self {
            configs: RwLock::new(configs),
            path: None,
        }
    }

    /// Opens a store bound to `path`, loading it if the file exists.
    ///
    /// Every subsequent mutation rewrites the file.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut store = Self::load_from_file(&path).await?;
        store.path = Some(path.as_ref().to_path_buf());
        Ok(store)
    }

    /// Loads configurations from a JSON file.
    ///
    /// If the file does not exist, an empty store is returned.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => {
                let file: CredentialFile = serde_json::from_str(&json)
                    .map_err(|e| CredentialError::DeserializationFailed { source: e })?;
                if file.format != FILE_FORMAT {
                    return Err(CredentialError::UnsupportedFormat {
                        found: file.format,
                        supported: FILE_FORMAT,
                    }
                    .into());
                }
                debug!(count = file.configs.len(), "Loaded credential file");
                Ok(Self::with_configs(file.configs))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(CredentialError::FileIo { source: e }.into()),
        }
    }

    /// Saves all configurations to a JSON file.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = CredentialFile {
            format: FILE_FORMAT,
            configs: self.configs.read().unwrap().clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| CredentialError::SerializationFailed { source: e })?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| CredentialError::FileIo { source: e }.into())
    }

    /// Number of stored configurations.
    pub fn len(&self) -> usize {
        self.configs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.read().unwrap().is_empty()
    }

    async fn persist(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to_file(path).await,
            None => Ok(()),
        }
    }

    /// Insert or overwrite the config with the same key. Returns true if an
    /// existing entry was overwritten.
    fn upsert(&self, config: &ConnectionConfig) -> bool {
        let key = config.store_key();
        let mut configs = self.configs.write().unwrap();
        match configs.iter_mut().find(|c| c.store_key() == key) {
            Some(existing) => {
                *existing = config.clone();
                true
            }
            None => {
                configs.push(config.clone());
                false
            }
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentials {
    async fn list(&self) -> Result<Vec<ConnectionConfig>> {
        Ok(self.configs.read().unwrap().clone())
    }

    async fn add(&self, config: &ConnectionConfig) -> Result<()> {
        let replaced = self.upsert(config);
        debug!(key = ?config.store_key(), replaced, "Stored connection config");
        self.persist().await
    }

    async fn remove(&self, config: &ConnectionConfig) -> Result<()> {
        let key = config.store_key();
        let removed = {
            let mut configs = self.configs.write().unwrap();
            let before = configs.len();
            configs.retain(|c| c.store_key() != key);
            before != configs.len()
        };
        debug!(key = ?key, removed, "Removed connection config");
        if removed {
            self.persist().await?;
        }
        Ok(())
    }

    async fn replace(&self, config: &ConnectionConfig) -> Result<()> {
        self.upsert(config);
        self.persist().await
    }
}
