//! Builds stream, download, and direct URLs for files and artifacts.

use std::sync::Arc;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use seedbox_auth::{CapabilityPayload, CapabilityResource, CapabilityTokenService};
use seedbox_core::result::AppResult;
use seedbox_core::types::UserId;
use seedbox_entity::delivery::Disposition;
use seedbox_entity::transfer::TransferSession;

/// Characters left alone by a URI component encoder.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode one URI component.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// URLs for one sandbox file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLinks {
    pub stream_url: String,
    pub download_url: String,
    /// Capability link; plays inline without a login.
    pub direct_url: String,
}

/// URLs for one artifact of a transfer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLinks {
    pub stream_url: String,
    pub download_url: String,
    pub direct_stream_url: String,
    pub direct_download_url: String,
}

/// Mints delivery URLs, signing capability tokens for the direct ones.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    capabilities: Arc<CapabilityTokenService>,
    public_base_url: Option<String>,
}

impl LinkBuilder {
    /// Creates a new link builder.
    pub fn new(capabilities: Arc<CapabilityTokenService>, public_base_url: Option<String>) -> Self {
        Self {
            capabilities,
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    /// Base URL for links: the configured public URL, else the request host.
    pub fn base(&self, host: Option<&str>) -> String {
        match (&self.public_base_url, host) {
            (Some(url), _) => url.clone(),
            (None, Some(host)) => format!("http://{host}"),
            (None, None) => String::new(),
        }
    }

    /// Links for `relative` inside `owner`'s sandbox.
    pub fn file_links(&self, base: &str, owner: UserId, relative: &str) -> AppResult<FileLinks> {
        let encoded = encode_component(relative);
        let token = self.sign(
            CapabilityResource::File {
                path: relative.to_string(),
            },
            Disposition::Stream,
            owner,
        )?;

        Ok(FileLinks {
            stream_url: format!("{base}/files/stream?path={encoded}"),
            download_url: format!("{base}/files/download?path={encoded}"),
            direct_url: format!("{base}/files/direct/{token}"),
        })
    }

    /// Links for artifact `index` of `session`.
    pub fn artifact_links(
        &self,
        base: &str,
        session: &TransferSession,
        index: usize,
    ) -> AppResult<ArtifactLinks> {
        let resource = CapabilityResource::Artifact {
            session: session.id.clone(),
            index,
        };
        let direct_stream = self.sign(resource.clone(), Disposition::Stream, session.owner)?;
        let direct_download = self.sign(resource, Disposition::Attachment, session.owner)?;
        let prefix = format!("{base}/torrents/{}/files/{index}", session.id);

        Ok(ArtifactLinks {
            stream_url: format!("{prefix}/stream"),
            download_url: format!("{prefix}/download"),
            direct_stream_url: format!("{base}/files/direct/{direct_stream}"),
            direct_download_url: format!("{base}/files/direct/{direct_download}"),
        })
    }

    fn sign(&self, resource: CapabilityResource, disposition: Disposition, owner: UserId) -> AppResult<String> {
        let payload = CapabilityPayload {
            resource,
            disposition,
            owner: Some(owner),
        };
        let issued = self
            .capabilities
            .issue(&payload, self.capabilities.default_ttl_seconds())?;
        Ok(issued.token)
    }
}
