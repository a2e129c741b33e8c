//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use seedbox_core::error::{AppError, ErrorKind};
use seedbox_core::result::AppResult;
use seedbox_core::types::UserId;
use seedbox_entity::user::User;

use crate::store::AccountStore;

/// Repository for the `users` table.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for UserRepository {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, quota_bytes, storage_used, plan, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn update_storage_used(&self, id: UserId, used_bytes: u64) -> AppResult<bool> {
        let used = i64::try_from(used_bytes).unwrap_or(i64::MAX);
        let result = sqlx::query(
            "UPDATE users SET storage_used = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(used)
        .bind(id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update storage usage", e)
        })?;
        Ok(result.rows_affected() > 0)
    }
}
