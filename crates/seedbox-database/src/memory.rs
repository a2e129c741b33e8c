//! In-process account store.
//!
//! Used when no database URL is configured. Unknown users are provisioned on
//! first lookup with the configured default quota, since identities come
//! from already-verified login tokens.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use seedbox_core::result::AppResult;
use seedbox_core::types::UserId;
use seedbox_entity::user::User;

use crate::store::AccountStore;

/// DashMap-backed account store.
#[derive(Debug)]
pub struct MemoryAccountStore {
    users: DashMap<UserId, User>,
    default_quota_bytes: u64,
}

impl MemoryAccountStore {
    /// Create an empty store.
    pub fn new(default_quota_bytes: u64) -> Self {
        Self {
            users: DashMap::new(),
            default_quota_bytes,
        }
    }

    /// Insert or replace a user.
    pub fn insert(&self, user: User) {
        self.users.insert(user.user_id(), user);
    }

    /// Set a user's quota, provisioning the user if needed.
    pub fn set_quota(&self, id: UserId, quota_bytes: u64) {
        let mut entry = self
            .users
            .entry(id)
            .or_insert_with(|| User::new(id, id.to_string(), self.default_quota_bytes));
        entry.quota_bytes = i64::try_from(quota_bytes).unwrap_or(i64::MAX);
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        let user = self
            .users
            .entry(id)
            .or_insert_with(|| {
                debug!(user_id = %id, "Provisioning in-memory account");
                User::new(id, id.to_string(), self.default_quota_bytes)
            })
            .clone();
        Ok(Some(user))
    }

    async fn update_storage_used(&self, id: UserId, used_bytes: u64) -> AppResult<bool> {
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.storage_used = i64::try_from(used_bytes).unwrap_or(i64::MAX);
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_user_is_provisioned_with_default_quota() {
        let store = MemoryAccountStore::new(1024);
        let id = UserId::new();
        let user = store.find_user(id).await.expect("lookup").expect("user");
        assert_eq!(user.quota(), 1024);
        assert_eq!(user.used(), 0);
    }

    #[tokio::test]
    async fn test_update_storage_used() {
        let store = MemoryAccountStore::new(1024);
        let id = UserId::new();
        assert!(!store.update_storage_used(id, 10).await.expect("update"));

        store.set_quota(id, 500);
        assert!(store.update_storage_used(id, 42).await.expect("update"));
        let user = store.find_user(id).await.expect("lookup").expect("user");
        assert_eq!(user.used(), 42);
        assert_eq!(user.quota(), 500);
    }
}
