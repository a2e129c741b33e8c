//! Request DTOs with validation.

use serde::Deserialize;
use validator::Validate;

/// `POST /torrents` body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTorrentRequest {
    /// Magnet URI.
    #[validate(length(min = 1, message = "magnet is required"))]
    #[serde(default)]
    pub magnet: String,
    /// Caller-declared total size, used for the synchronous quota check.
    pub torrent_size: Option<u64>,
}

/// `?path=` query for file routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathQuery {
    /// Path relative to the caller's sandbox.
    pub path: Option<String>,
}

/// `DELETE /files/delete` body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeletePathRequest {
    /// Path relative to the caller's sandbox.
    #[validate(length(min = 1, message = "path is required"))]
    #[serde(default)]
    pub path: String,
}
