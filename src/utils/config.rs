//! Store configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::database::Dialect;
use crate::utils::paths::get_database_path;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Settings used to open a [`RecordStore`](crate::database::RecordStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection target: a file path, `sqlite:` URL or `:memory:`
    pub database: String,

    /// SQL dialect used to pick table and query text
    pub dialect: Dialect,

    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: get_database_path().to_string_lossy().into_owned(),
            dialect: Dialect::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl StoreConfig {
    /// Default settings pointed at an explicit connection target
    ///
    /// Does not consult the platform data directory.
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            database: target.into(),
            dialect: Dialect::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Load settings from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read store config {:?}", path))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse store config {:?}", path))?;
        Ok(config)
    }

    /// Pool size with a floor of one connection
    pub fn effective_max_connections(&self) -> u32 {
        self.max_connections.max(1)
    }
}
