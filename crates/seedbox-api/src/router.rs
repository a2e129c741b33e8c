//! Route definitions for the Seedbox HTTP API.
//!
//! Routes are grouped by domain and mounted at the root so the URLs the
//! link builder mints resolve directly.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .merge(file_routes())
        .merge(torrent_routes())
        .merge(storage_routes())
        .merge(health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Sandbox browse, delivery, direct links, delete
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files/browse", get(handlers::files::browse))
        .route("/files/stream", get(handlers::files::stream))
        .route("/files/download", get(handlers::files::download))
        .route("/files/direct/{token}", get(handlers::files::direct))
        .route("/files/delete", delete(handlers::files::delete))
}

/// Transfer admission, polling, termination, artifact delivery
fn torrent_routes() -> Router<AppState> {
    Router::new()
        .route("/torrents", post(handlers::torrents::create))
        .route("/torrents", get(handlers::torrents::index))
        .route("/torrents/{id}", get(handlers::torrents::show))
        .route("/torrents/{id}", delete(handlers::torrents::destroy))
        .route("/torrents/{id}/stop", put(handlers::torrents::stop))
        .route(
            "/torrents/{id}/files/{index}/stream",
            get(handlers::torrents::stream_artifact),
        )
        .route(
            "/torrents/{id}/files/{index}/download",
            get(handlers::torrents::download_artifact),
        )
}

/// Quota usage
fn storage_routes() -> Router<AppState> {
    Router::new().route("/storage/usage", get(handlers::storage::usage))
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
