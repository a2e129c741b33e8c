//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use seedbox_core::result::AppResult;
use seedbox_core::types::format_bytes;
use seedbox_entity::transfer::{Artifact, TransferSession, TransferState};
use seedbox_service::{ArtifactLinks, FileLinks};
use seedbox_storage::{DirEntry, DirListing, FileEntry};

/// One file in a browse listing, with delivery URLs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseFile {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub mime: String,
    #[serde(flatten)]
    pub links: FileLinks,
}

/// `GET /files/browse` body.
#[derive(Debug, Clone, Serialize)]
pub struct BrowseResponse {
    pub cwd: String,
    pub parent: Option<String>,
    pub dirs: Vec<DirEntry>,
    pub files: Vec<BrowseFile>,
}

impl BrowseResponse {
    /// Attach links to every file of `listing`.
    pub fn from_listing(
        listing: DirListing,
        mut links_for: impl FnMut(&FileEntry) -> AppResult<FileLinks>,
    ) -> AppResult<Self> {
        let files = listing
            .files
            .into_iter()
            .map(|f| {
                let links = links_for(&f)?;
                Ok(BrowseFile {
                    name: f.name,
                    path: f.path,
                    size: f.size,
                    mime: f.mime,
                    links,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            cwd: listing.cwd,
            parent: listing.parent,
            dirs: listing.dirs,
            files,
        })
    }
}

/// `POST /torrents` body.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Artifact row in a session summary.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub index: usize,
    pub name: String,
    pub path: String,
    pub length: u64,
}

impl From<&Artifact> for ArtifactSummary {
    fn from(a: &Artifact) -> Self {
        Self {
            index: a.index,
            name: a.name.clone(),
            path: a.path.clone(),
            length: a.length,
        }
    }
}

/// Session as returned by `GET /torrents`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentSummary {
    pub id: String,
    pub name: String,
    pub state: TransferState,
    /// Percent complete, two decimals.
    pub progress: f64,
    pub downloaded: u64,
    pub downloaded_human: String,
    pub length: u64,
    pub length_human: String,
    pub download_speed: String,
    pub upload_speed: String,
    pub num_peers: u32,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub files: Vec<ArtifactSummary>,
}

impl From<&TransferSession> for TorrentSummary {
    fn from(s: &TransferSession) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name.clone(),
            state: s.state,
            progress: s.percent(),
            downloaded: s.downloaded,
            downloaded_human: format_bytes(s.downloaded),
            length: s.length,
            length_human: format_bytes(s.length),
            download_speed: format!("{}/s", format_bytes(s.download_speed)),
            upload_speed: format!("{}/s", format_bytes(s.upload_speed)),
            num_peers: s.num_peers,
            done: s.is_done(),
            error: s.error.clone(),
            created_at: s.created_at,
            files: s.artifacts.iter().map(ArtifactSummary::from).collect(),
        }
    }
}

/// Artifact row in session detail, with delivery URLs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDetail {
    pub index: usize,
    pub name: String,
    pub path: String,
    pub length: u64,
    #[serde(flatten)]
    pub links: ArtifactLinks,
}

/// `GET /torrents/:id` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentDetail {
    pub id: String,
    pub name: String,
    pub state: TransferState,
    pub progress: f64,
    pub downloaded_human: String,
    pub length_human: String,
    pub num_peers: u32,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub files: Vec<ArtifactDetail>,
}

/// Result of a terminal transition.
#[derive(Debug, Clone, Serialize)]
pub struct StoppedResponse {
    pub stopped: bool,
    pub id: String,
}

/// Result of `DELETE /torrents/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
    pub id: String,
}

/// Result of `DELETE /files/delete`.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
    pub path: String,
}

/// `GET /storage/usage` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub used_bytes: u64,
    pub quota_bytes: u64,
    pub available_bytes: u64,
    pub used: String,
    pub quota: String,
    pub available: String,
    pub computed_at: DateTime<Utc>,
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}
