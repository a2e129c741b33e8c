//! Application builder: wires services into state and state into a router.

use std::sync::Arc;

use axum::Router;

use seedbox_auth::{CapabilityTokenService, JwtDecoder};
use seedbox_core::config::AppConfig;
use seedbox_database::AccountStore;
use seedbox_engine::TransferEngine;
use seedbox_service::{
    DirectLinkService, FileService, LinkBuilder, QuotaGuard, RegistrySettings, SessionRegistry,
};
use seedbox_storage::SandboxLayout;

use crate::router::build_router;
use crate::state::AppState;

/// Construct every service once and bundle them into [`AppState`].
pub fn build_state(
    config: AppConfig,
    accounts: Arc<dyn AccountStore>,
    engine: Arc<dyn TransferEngine>,
) -> AppState {
    let layout = SandboxLayout::new(&config.storage);

    let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
    let capabilities = Arc::new(CapabilityTokenService::new(&config.auth));

    let quota = Arc::new(QuotaGuard::new(accounts, layout.clone()));
    let registry = SessionRegistry::new(
        engine,
        Arc::clone(&quota),
        layout.clone(),
        RegistrySettings::from_config(&config.engine),
    );
    let file_service = Arc::new(FileService::new(layout, Arc::clone(&quota)));
    let links = Arc::new(LinkBuilder::new(
        Arc::clone(&capabilities),
        config.server.public_base_url.clone(),
    ));
    let direct_links = Arc::new(DirectLinkService::new(
        Arc::clone(&capabilities),
        registry.clone(),
        Arc::clone(&file_service),
    ));

    AppState {
        config: Arc::new(config),
        jwt_decoder,
        capabilities,
        quota,
        registry,
        file_service,
        links,
        direct_links,
    }
}

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}
