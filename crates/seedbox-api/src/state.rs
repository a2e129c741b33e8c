//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use seedbox_auth::{CapabilityTokenService, JwtDecoder};
use seedbox_core::config::AppConfig;
use seedbox_service::{DirectLinkService, FileService, LinkBuilder, QuotaGuard, SessionRegistry};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Auth ─────────────────────────────────────────────────
    /// Login token decoder
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Capability token signer/verifier
    pub capabilities: Arc<CapabilityTokenService>,

    // ── Services ─────────────────────────────────────────────
    /// Storage quota checks and usage walks
    pub quota: Arc<QuotaGuard>,
    /// Live transfer sessions
    pub registry: SessionRegistry,
    /// Sandbox browse/open/delete
    pub file_service: Arc<FileService>,
    /// Delivery URL builder
    pub links: Arc<LinkBuilder>,
    /// Capability link redemption
    pub direct_links: Arc<DirectLinkService>,
}
