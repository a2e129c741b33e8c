//! Authentication and capability-link configuration.

use serde::{Deserialize, Serialize};

/// Login token and capability token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for login JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Secret key for capability links. Falls back to `jwt_secret` when empty.
    #[serde(default)]
    pub link_secret: String,
    /// Login access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Capability link TTL in seconds (default 7 days).
    #[serde(default = "default_link_ttl")]
    pub link_ttl_seconds: u64,
    /// Clock-skew leeway for login tokens, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl AuthConfig {
    /// The secret used to sign capability links.
    pub fn effective_link_secret(&self) -> &str {
        if self.link_secret.is_empty() {
            &self.jwt_secret
        } else {
            &self.link_secret
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            link_secret: String::new(),
            access_ttl_minutes: default_access_ttl(),
            link_ttl_seconds: default_link_ttl(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    7 * 24 * 60
}

fn default_link_ttl() -> u64 {
    7 * 24 * 3600
}

fn default_leeway() -> u64 {
    5
}
