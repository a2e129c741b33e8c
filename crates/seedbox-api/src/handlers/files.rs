//! Sandbox browse, delivery, direct-link, and delete handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;

use seedbox_core::error::AppError;
use seedbox_entity::delivery::Disposition;

use super::{range_header, validated};
use crate::dto::request::{DeletePathRequest, PathQuery};
use crate::dto::response::{BrowseResponse, DeletedResponse};
use crate::extractors::{AuthUser, RequestBase};
use crate::state::AppState;
use crate::stream::RangeStreamer;

/// GET /files/browse?path=
pub async fn browse(
    State(state): State<AppState>,
    auth: AuthUser,
    RequestBase(base): RequestBase,
    Query(query): Query<PathQuery>,
) -> Result<Json<BrowseResponse>, AppError> {
    let path = query.path.unwrap_or_default();
    let listing = state.file_service.browse(&auth, &path).await?;

    let owner = auth.user_id;
    let body = BrowseResponse::from_listing(listing, |file| {
        state.links.file_links(&base, owner, &file.path)
    })?;
    Ok(Json(body))
}

/// GET /files/stream?path=
pub async fn stream(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    deliver(&state, &auth, query, &headers, Disposition::Stream).await
}

/// GET /files/download?path=
pub async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    deliver(&state, &auth, query, &headers, Disposition::Attachment).await
}

async fn deliver(
    state: &AppState,
    auth: &AuthUser,
    query: PathQuery,
    headers: &HeaderMap,
    disposition: Disposition,
) -> Result<Response, AppError> {
    let path = query
        .path
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::validation("path is required"))?;

    let (sandbox, file) = state.file_service.open(auth, &path).await?;
    RangeStreamer::serve(&sandbox, &file, range_header(headers), disposition).await
}

/// GET /files/direct/{token}
///
/// No login: the capability token is the credential.
pub async fn direct(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let target = state.direct_links.resolve(&token).await?;
    RangeStreamer::serve(&target.sandbox, &target.file, range_header(&headers), target.disposition).await
}

/// DELETE /files/delete
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<DeletePathRequest>,
) -> Result<Json<DeletedResponse>, AppError> {
    let req = validated(req)?;
    state.file_service.delete(&auth, &req.path).await?;
    Ok(Json(DeletedResponse {
        deleted: true,
        path: req.path,
    }))
}
