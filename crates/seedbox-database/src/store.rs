//! Account store abstraction.

use async_trait::async_trait;

use seedbox_core::result::AppResult;
use seedbox_core::types::UserId;
use seedbox_entity::user::User;

/// The account data this subsystem consumes.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Look up a user by id.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Persist a freshly recomputed usage figure. Returns `false` when the
    /// user does not exist.
    async fn update_storage_used(&self, id: UserId, used_bytes: u64) -> AppResult<bool>;
}
