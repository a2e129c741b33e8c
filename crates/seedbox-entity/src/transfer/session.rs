//! Transfer session and artifact models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use seedbox_core::types::{TransferId, UserId};

use super::descriptor::TransferDescriptor;
use super::state::TransferState;

/// Name shown until the engine resolves metadata.
pub const PLACEHOLDER_NAME: &str = "Loading...";

/// One file inside a transfer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Position within the session; stable for the session's lifetime.
    pub index: usize,
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub length: u64,
    /// Path relative to the owner's sandbox root.
    pub path: String,
}

/// An admitted, tracked transfer owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSession {
    /// Content identifier.
    pub id: TransferId,
    /// Owning user; fixed for the session's life.
    pub owner: UserId,
    /// The descriptor the session was admitted from.
    pub descriptor: TransferDescriptor,
    /// Display name (placeholder until metadata resolves).
    pub name: String,
    /// Files, ordered by index.
    pub artifacts: Vec<Artifact>,
    /// Aggregate length in bytes (0 until metadata resolves).
    pub length: u64,
    /// Lifecycle state.
    pub state: TransferState,
    /// Fraction complete, 0.0..=1.0.
    pub progress: f64,
    /// Bytes downloaded so far.
    pub downloaded: u64,
    /// Current download rate in bytes/s.
    pub download_speed: u64,
    /// Current upload rate in bytes/s.
    pub upload_speed: u64,
    /// Connected peers.
    pub num_peers: u32,
    /// Last engine-side failure, surfaced only through polling.
    pub error: Option<String>,
    /// When the session was admitted.
    pub created_at: DateTime<Utc>,
}

impl TransferSession {
    /// A fresh session in the `Initializing` state.
    pub fn initializing(descriptor: TransferDescriptor, owner: UserId) -> Self {
        Self {
            id: descriptor.info_hash.clone(),
            owner,
            name: PLACEHOLDER_NAME.to_string(),
            descriptor,
            artifacts: Vec::new(),
            length: 0,
            state: TransferState::Initializing,
            progress: 0.0,
            downloaded: 0,
            download_speed: 0,
            upload_speed: 0,
            num_peers: 0,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Look up an artifact by index.
    pub fn artifact(&self, index: usize) -> Option<&Artifact> {
        self.artifacts.get(index)
    }

    /// Progress as a percentage rounded to two decimals.
    pub fn percent(&self) -> f64 {
        (self.progress * 10_000.0).round() / 100.0
    }

    /// Bytes the transfer still expects to write.
    pub fn outstanding_bytes(&self) -> u64 {
        self.length.saturating_sub(self.downloaded)
    }

    /// Whether every byte has been written.
    pub fn is_done(&self) -> bool {
        self.state == TransferState::Completed || (self.length > 0 && self.downloaded >= self.length)
    }
}
