//! Transfer admission, polling, termination, and artifact delivery.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use tracing::{info, warn};

use seedbox_core::error::AppError;
use seedbox_core::types::{TransferId, format_bytes};
use seedbox_entity::delivery::Disposition;
use seedbox_entity::transfer::TransferDescriptor;
use seedbox_service::QuotaGuard;

use super::{range_header, validated};
use crate::dto::request::CreateTorrentRequest;
use crate::dto::response::{
    AcceptedResponse, ArtifactDetail, RemovedResponse, StoppedResponse, TorrentDetail, TorrentSummary,
};
use crate::extractors::{AuthUser, RequestBase};
use crate::state::AppState;
use crate::stream::RangeStreamer;

/// POST /torrents
///
/// Validates the magnet and, when a size is known, the quota, then admits
/// the transfer in the background. Later failures show up only by polling.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateTorrentRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>), AppError> {
    let req = validated(req)?;
    let descriptor = TransferDescriptor::parse(&req.magnet)?;
    let owner = auth.user_id;

    if let Some(estimate) = req.torrent_size.or(descriptor.exact_length) {
        let decision = state.quota.admit(owner, estimate).await?;
        QuotaGuard::ensure_allowed(&decision)?;
    }

    info!(user_id = %owner, transfer_id = %descriptor.info_hash, "Transfer requested");

    let registry = state.registry.clone();
    let size_hint = req.torrent_size;
    tokio::spawn(async move {
        let id = descriptor.info_hash.clone();
        if let Err(e) = registry.admit(descriptor, owner, size_hint).await {
            warn!(user_id = %owner, transfer_id = %id, error = %e, "Background admission failed");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            status: "accepted",
            message: "Torrent add started. Poll GET /torrents or /torrents/:id until ready.",
        }),
    ))
}

/// GET /torrents
pub async fn index(State(state): State<AppState>, auth: AuthUser) -> Json<Vec<TorrentSummary>> {
    let sessions = state.registry.list(auth.user_id);
    Json(sessions.iter().map(TorrentSummary::from).collect())
}

/// GET /torrents/{id}
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    RequestBase(base): RequestBase,
    Path(id): Path<String>,
) -> Result<Json<TorrentDetail>, AppError> {
    let session = state.registry.get(&TransferId::new(id), Some(auth.user_id))?;

    let files = session
        .artifacts
        .iter()
        .map(|a| {
            Ok(ArtifactDetail {
                index: a.index,
                name: a.name.clone(),
                path: a.path.clone(),
                length: a.length,
                links: state.links.artifact_links(&base, &session, a.index)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(TorrentDetail {
        id: session.id.to_string(),
        name: session.name.clone(),
        state: session.state,
        progress: session.percent(),
        downloaded_human: format_bytes(session.downloaded),
        length_human: format_bytes(session.length),
        num_peers: session.num_peers,
        done: session.is_done(),
        error: session.error.clone(),
        files,
    }))
}

/// PUT /torrents/{id}/stop
pub async fn stop(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<StoppedResponse>, AppError> {
    let session = state.registry.stop(&TransferId::new(id), Some(auth.user_id)).await?;
    Ok(Json(StoppedResponse {
        stopped: true,
        id: session.id.to_string(),
    }))
}

/// DELETE /torrents/{id}
pub async fn destroy(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<RemovedResponse>, AppError> {
    let session = state.registry.remove(&TransferId::new(id), Some(auth.user_id)).await?;
    Ok(Json(RemovedResponse {
        removed: true,
        id: session.id.to_string(),
    }))
}

/// GET /torrents/{id}/files/{index}/stream
pub async fn stream_artifact(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, index)): Path<(String, usize)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    deliver_artifact(&state, &auth, id, index, &headers, Disposition::Stream).await
}

/// GET /torrents/{id}/files/{index}/download
pub async fn download_artifact(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, index)): Path<(String, usize)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    deliver_artifact(&state, &auth, id, index, &headers, Disposition::Attachment).await
}

async fn deliver_artifact(
    state: &AppState,
    auth: &AuthUser,
    id: String,
    index: usize,
    headers: &HeaderMap,
    disposition: Disposition,
) -> Result<Response, AppError> {
    let session = state.registry.get(&TransferId::new(id), Some(auth.user_id))?;
    let (sandbox, file) = state.file_service.open_artifact(&session, index).await?;
    RangeStreamer::serve(&sandbox, &file, range_header(headers), disposition).await
}
