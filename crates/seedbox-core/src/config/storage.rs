//! Sandbox storage configuration.

use serde::{Deserialize, Serialize};

/// Sandbox storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding every user's sandbox.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Sub-directory of `root_path` under which per-user sandboxes live.
    #[serde(default = "default_users_dir")]
    pub users_dir: String,
    /// Quota granted to users known only to the in-memory account store.
    #[serde(default = "default_quota")]
    pub default_quota_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            users_dir: default_users_dir(),
            default_quota_bytes: default_quota(),
        }
    }
}

fn default_root_path() -> String {
    "./data/library".to_string()
}

fn default_users_dir() -> String {
    "users".to_string()
}

fn default_quota() -> u64 {
    32_212_254_720 // 30 GB
}
