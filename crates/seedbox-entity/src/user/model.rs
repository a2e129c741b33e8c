//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use seedbox_core::types::UserId;

/// An account known to the account store.
///
/// This subsystem only reads the quota and rewrites `storage_used`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Storage quota in bytes.
    pub quota_bytes: i64,
    /// Cached bytes used, as of the last full recompute.
    pub storage_used: i64,
    /// Plan tag (e.g. `"free"`).
    pub plan: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh user with the given quota.
    pub fn new(id: UserId, username: impl Into<String>, quota_bytes: u64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into_uuid(),
            username: username.into(),
            quota_bytes: i64::try_from(quota_bytes).unwrap_or(i64::MAX),
            storage_used: 0,
            plan: "free".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Typed identifier of this user.
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.id)
    }

    /// Quota in bytes; negative values stored by hand read as zero.
    pub fn quota(&self) -> u64 {
        u64::try_from(self.quota_bytes).unwrap_or(0)
    }

    /// Cached usage in bytes.
    pub fn used(&self) -> u64 {
        u64::try_from(self.storage_used).unwrap_or(0)
    }
}
