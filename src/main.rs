//! Seedbox server: multi-tenant transfer, storage, and streaming service.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use seedbox_core::config::{AppConfig, LogFormat};
use seedbox_core::error::AppError;
use seedbox_database::{AccountStore, DatabasePool, MemoryAccountStore, UserRepository};
use seedbox_engine::{SimulatedEngine, SimulationPacing, TransferEngine};

#[tokio::main]
async fn main() {
    let env = std::env::var("SEEDBOX_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Seedbox");

    // ── Step 1: Sandbox root ─────────────────────────────────────
    let users_root = std::path::Path::new(&config.storage.root_path).join(&config.storage.users_dir);
    tokio::fs::create_dir_all(&users_root).await.map_err(|e| {
        AppError::with_source(
            seedbox_core::ErrorKind::Storage,
            format!("Failed to create {}", users_root.display()),
            e,
        )
    })?;

    // ── Step 2: Account store ────────────────────────────────────
    let (accounts, db_pool): (Arc<dyn AccountStore>, Option<DatabasePool>) = match &config.database.url {
        Some(_) => {
            tracing::info!("Connecting to database...");
            let pool = DatabasePool::connect(&config.database).await?;
            seedbox_database::migration::run_migrations(pool.pool()).await?;
            tracing::info!("Database migrations complete");
            (Arc::new(UserRepository::new(pool.pool().clone())), Some(pool))
        }
        None => {
            tracing::warn!("No database configured, using the in-memory account store");
            (
                Arc::new(MemoryAccountStore::new(config.storage.default_quota_bytes)),
                None,
            )
        }
    };

    // ── Step 3: Transfer engine ──────────────────────────────────
    let engine: Arc<dyn TransferEngine> = match config.engine.provider.as_str() {
        "simulated" => Arc::new(SimulatedEngine::with_pacing(
            config.engine.event_buffer,
            SimulationPacing::from_config(&config.engine),
        )),
        other => {
            return Err(AppError::configuration(format!("Unknown engine provider: {other}")));
        }
    };
    tracing::info!(engine = engine.name(), trackers = config.engine.trackers.len(), "Engine ready");

    // ── Step 4: Services and router ──────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = seedbox_api::build_state(config, accounts, engine);
    let app = seedbox_api::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!(addr = %addr, "Seedbox server listening");

    // ── Step 5: Graceful shutdown ────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    // Long downloads must not hold shutdown open forever.
    let deadline = async move {
        if shutdown_rx.changed().await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        _ = deadline => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Grace period elapsed, dropping open connections");
        }
    }

    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("Seedbox server shut down gracefully");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
