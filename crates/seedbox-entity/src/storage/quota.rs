//! Quota snapshot and admission decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use seedbox_core::types::UserId;

/// Point-in-time usage figures for one user, from a full sandbox walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    /// Owner of the sandbox.
    pub user_id: UserId,
    /// Quota in bytes.
    pub quota_bytes: u64,
    /// Bytes on disk at `computed_at`.
    pub used_bytes: u64,
    /// When the walk finished.
    pub computed_at: DateTime<Utc>,
}

impl QuotaSnapshot {
    /// Bytes still available under the quota (never negative).
    pub fn available(&self) -> u64 {
        self.quota_bytes.saturating_sub(self.used_bytes)
    }

    /// Decide whether `required` more bytes fit.
    pub fn decide(&self, required: u64) -> QuotaDecision {
        let available = self.available();
        QuotaDecision {
            allowed: available >= required,
            required,
            available,
            used: self.used_bytes,
            quota: self.quota_bytes,
        }
    }
}

/// Outcome of a quota admission or continuation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaDecision {
    /// Whether the request fits.
    pub allowed: bool,
    /// Bytes the caller asked for.
    pub required: u64,
    /// Bytes remaining under the quota.
    pub available: u64,
    /// Bytes in use.
    pub used: u64,
    /// Total quota.
    pub quota: u64,
}
