//! Runtime settings applied to every session the coordinator builds.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Settings shared by every session.
///
/// Missing fields in a settings file take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterSettings {
    /// Encrypt the local event store on disk
    pub enable_local_file_encryption: bool,
    /// Lazy-load room members during sync
    pub lazy_loading: bool,
    /// Reduce network usage during sync
    pub data_save_mode: bool,
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            enable_local_file_encryption: false,
            lazy_loading: true,
            data_save_mode: false,
        }
    }
}

impl RosterSettings {
    /// Load settings from a JSON file.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Options handed to the engine when it opens a session.
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            file_encryption: self.enable_local_file_encryption,
            lazy_loading: self.lazy_loading,
        }
    }
}

/// Options used by the engine to construct a session's store and data handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenOptions {
    pub file_encryption: bool,
    pub lazy_loading: bool,
}
