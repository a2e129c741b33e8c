//! Quota admission and continuation checks.
//!
//! Usage is always a full walk of the user's sandbox, never a running
//! counter, so files removed out of band are accounted for. Each walk also
//! refreshes the cached figure in the account store.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::debug;

use seedbox_core::error::AppError;
use seedbox_core::result::AppResult;
use seedbox_core::types::{UserId, format_bytes};
use seedbox_database::AccountStore;
use seedbox_entity::storage::{QuotaDecision, QuotaSnapshot};
use seedbox_storage::SandboxLayout;

/// Decides whether transfers fit a user's storage quota.
#[derive(Clone)]
pub struct QuotaGuard {
    accounts: Arc<dyn AccountStore>,
    layout: SandboxLayout,
}

impl std::fmt::Debug for QuotaGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGuard")
            .field("layout", &self.layout)
            .finish()
    }
}

impl QuotaGuard {
    /// Creates a new quota guard.
    pub fn new(accounts: Arc<dyn AccountStore>, layout: SandboxLayout) -> Self {
        Self { accounts, layout }
    }

    /// Walk the user's sandbox and return fresh usage figures.
    pub async fn usage(&self, user: UserId) -> AppResult<QuotaSnapshot> {
        let account = self
            .accounts
            .find_user(user)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let sandbox = self.layout.open(user).await?;
        let used_bytes = sandbox.used_bytes().await?;
        self.accounts.update_storage_used(user, used_bytes).await?;

        debug!(user_id = %user, used_bytes, quota_bytes = account.quota(), "Recomputed storage usage");

        Ok(QuotaSnapshot {
            user_id: user,
            quota_bytes: account.quota(),
            used_bytes,
            computed_at: Utc::now(),
        })
    }

    /// Decide whether `estimated_bytes` more fit under the quota.
    pub async fn admit(&self, user: UserId, estimated_bytes: u64) -> AppResult<QuotaDecision> {
        Ok(self.usage(user).await?.decide(estimated_bytes))
    }

    /// Decide whether an in-progress transfer that still needs
    /// `outstanding_bytes` may continue.
    pub async fn monitor(&self, user: UserId, outstanding_bytes: u64) -> AppResult<bool> {
        Ok(self.admit(user, outstanding_bytes).await?.allowed)
    }

    /// Turn a refused decision into a `QuotaExceeded` error with details.
    pub fn ensure_allowed(decision: &QuotaDecision) -> AppResult<()> {
        if decision.allowed {
            return Ok(());
        }

        Err(AppError::quota_exceeded(format!(
            "Insufficient storage space: {} required, {} available",
            format_bytes(decision.required),
            format_bytes(decision.available)
        ))
        .with_details(json!({
            "required": format_bytes(decision.required),
            "available": format_bytes(decision.available),
            "currentUsage": format_bytes(decision.used),
            "quota": format_bytes(decision.quota),
            "bytes": {
                "required": decision.required,
                "available": decision.available,
                "currentUsage": decision.used,
                "quota": decision.quota,
            }
        })))
    }
}
