//! Where each user's sandbox lives on disk.

use std::path::PathBuf;

use tracing::debug;

use seedbox_core::config::StorageConfig;
use seedbox_core::error::{AppError, ErrorKind};
use seedbox_core::result::AppResult;
use seedbox_core::types::UserId;

use crate::providers::local::LocalSandbox;

/// Maps users to `<root>/<users_dir>/<user_id>`.
#[derive(Debug, Clone)]
pub struct SandboxLayout {
    users_root: PathBuf,
}

impl SandboxLayout {
    /// Build the layout from storage configuration.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            users_root: PathBuf::from(&config.root_path).join(&config.users_dir),
        }
    }

    /// Directory holding every user sandbox.
    pub fn users_root(&self) -> &PathBuf {
        &self.users_root
    }

    /// Sandbox directory for `user`, whether or not it exists yet.
    pub fn user_dir(&self, user: UserId) -> PathBuf {
        self.users_root.join(user.to_string())
    }

    /// Create the user's sandbox if needed and open it.
    pub async fn open(&self, user: UserId) -> AppResult<LocalSandbox> {
        let dir = self.user_dir(user);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create sandbox: {}", dir.display()),
                e,
            )
        })?;
        debug!(user_id = %user, path = %dir.display(), "Opened sandbox");
        LocalSandbox::open(&dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_user_directory() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SandboxLayout::new(&StorageConfig {
            root_path: dir.path().to_string_lossy().into_owned(),
            ..StorageConfig::default()
        });
        let user = UserId::new();

        let sandbox = layout.open(user).await.unwrap();
        let expected = dir.path().join("users").join(user.to_string()).canonicalize().unwrap();
        assert_eq!(sandbox.root(), expected.as_path());
    }
}
