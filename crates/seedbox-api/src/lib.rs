//! # seedbox-api
//!
//! HTTP API layer for Seedbox built on Axum.
//!
//! Provides the file, transfer, storage, and health endpoints, the bearer
//! login extractor, CORS and logging middleware, DTOs, and the range-aware
//! byte streamer used by every delivery route.

pub mod app;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod stream;

pub use app::{build_app, build_state};
pub use state::AppState;
