use std::fmt;

use serde::{Deserialize, Serialize};

/// Surrogate identifier for a configuration snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(i64);

impl ConfigId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ConfigId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A complete snapshot of resolved tool configuration.
///
/// Snapshots are append-only: a new row is recorded per distinct
/// configuration, never mutated in place. List and map fields are
/// serialized to JSON text columns by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Remote cache API endpoint
    pub api_url: Option<String>,
    /// Login endpoint for token acquisition
    pub login_url: Option<String>,
    /// Team slug for remote cache scoping
    pub team_slug: Option<String>,
    /// Team identifier for remote cache scoping
    pub team_id: Option<String>,
    /// Whether artifact signature verification is enabled
    pub signature: bool,
    /// Whether preflight requests are sent before artifact uploads
    pub preflight: bool,
    /// Remote cache timeout, milliseconds
    pub timeout: Option<i64>,
    /// Globs whose contents invalidate every task hash
    pub global_deps: Vec<String>,
    /// Environment variable names included in every task hash
    pub global_env: Vec<String>,
    /// Resolved task definitions, keyed by task identifier
    pub task_definitions: serde_json::Value,
    /// Local cache directory
    pub cache_dir: Option<String>,
    /// Path to the root configuration file
    pub root_config_path: Option<String>,
}
