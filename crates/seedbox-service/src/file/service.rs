//! File operations scoped to the caller's sandbox.
//!
//! Every user-supplied path goes through the sandbox resolver before any
//! filesystem call. Artifact lookups go through the same resolver with the
//! artifact's recorded relative path.

use std::sync::Arc;

use tracing::{info, warn};

use seedbox_core::error::AppError;
use seedbox_core::result::AppResult;
use seedbox_core::types::UserId;
use seedbox_entity::transfer::TransferSession;
use seedbox_storage::{DirListing, FileMeta, LocalSandbox, SandboxLayout};

use crate::context::RequestContext;
use crate::quota::QuotaGuard;

/// Browses, opens, and deletes paths inside user sandboxes.
#[derive(Debug, Clone)]
pub struct FileService {
    layout: SandboxLayout,
    quota: Arc<QuotaGuard>,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(layout: SandboxLayout, quota: Arc<QuotaGuard>) -> Self {
        Self { layout, quota }
    }

    /// List one directory of the caller's sandbox.
    pub async fn browse(&self, ctx: &RequestContext, path: &str) -> AppResult<DirListing> {
        let sandbox = self.layout.open(ctx.user_id).await?;
        sandbox.list_dir(path).await
    }

    /// Resolve a regular file in the caller's sandbox for delivery.
    pub async fn open(&self, ctx: &RequestContext, path: &str) -> AppResult<(LocalSandbox, FileMeta)> {
        self.open_for_owner(ctx.user_id, path).await
    }

    /// Resolve a regular file in `owner`'s sandbox.
    pub async fn open_for_owner(&self, owner: UserId, path: &str) -> AppResult<(LocalSandbox, FileMeta)> {
        let sandbox = self.layout.open(owner).await?;
        let file = sandbox.stat_file(path).await?;
        Ok((sandbox, file))
    }

    /// Resolve artifact `index` of `session` inside its owner's sandbox.
    pub async fn open_artifact(
        &self,
        session: &TransferSession,
        index: usize,
    ) -> AppResult<(LocalSandbox, FileMeta)> {
        let artifact = session
            .artifact(index)
            .ok_or_else(|| AppError::not_found("File not found"))?;
        self.open_for_owner(session.owner, &artifact.path).await
    }

    /// Delete a file or directory, then refresh the caller's usage.
    pub async fn delete(&self, ctx: &RequestContext, path: &str) -> AppResult<()> {
        let sandbox = self.layout.open(ctx.user_id).await?;
        sandbox.delete(path).await?;
        info!(user_id = %ctx.user_id, path = %path, "Deleted from sandbox");

        // Best effort; the next walk corrects any miss.
        if let Err(e) = self.quota.usage(ctx.user_id).await {
            warn!(user_id = %ctx.user_id, error = %e, "Usage recompute after delete failed");
        }
        Ok(())
    }
}
