//! Redeeming capability links without a login session.

use std::sync::Arc;

use tracing::debug;

use seedbox_auth::{CapabilityResource, CapabilityTokenService};
use seedbox_core::error::AppError;
use seedbox_core::result::AppResult;
use seedbox_entity::delivery::Disposition;
use seedbox_storage::{FileMeta, LocalSandbox};

use crate::file::FileService;
use crate::transfer::SessionRegistry;

/// A verified link resolved to bytes on disk.
#[derive(Debug, Clone)]
pub struct DirectTarget {
    pub sandbox: LocalSandbox,
    pub file: FileMeta,
    pub disposition: Disposition,
}

/// Verifies capability tokens and resolves what they grant.
#[derive(Debug, Clone)]
pub struct DirectLinkService {
    capabilities: Arc<CapabilityTokenService>,
    registry: SessionRegistry,
    files: Arc<FileService>,
}

impl DirectLinkService {
    /// Creates a new direct link service.
    pub fn new(
        capabilities: Arc<CapabilityTokenService>,
        registry: SessionRegistry,
        files: Arc<FileService>,
    ) -> Self {
        Self {
            capabilities,
            registry,
            files,
        }
    }

    /// Verify `token` and resolve its target.
    ///
    /// Artifact tokens follow the live session: once it is gone the link
    /// answers `NotFound`. An owner embedded in the token must still own the
    /// session. File tokens must carry an owner.
    pub async fn resolve(&self, token: &str) -> AppResult<DirectTarget> {
        let payload = self.capabilities.verify(token)?;

        let (sandbox, file) = match &payload.resource {
            CapabilityResource::Artifact { session, index } => {
                let session = self.registry.get(session, payload.owner)?;
                self.files.open_artifact(&session, *index).await?
            }
            CapabilityResource::File { path } => {
                let owner = payload
                    .owner
                    .ok_or_else(|| AppError::token_invalid("Invalid link"))?;
                self.files.open_for_owner(owner, path).await?
            }
        };

        debug!(
            path = %file.relative,
            disposition = %payload.disposition,
            expires_at = %payload.expires_at,
            "Direct link resolved"
        );
        Ok(DirectTarget {
            sandbox,
            file,
            disposition: payload.disposition,
        })
    }
}
