//! # lumend: lumen daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize `tracing`
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the light bridge, repository, event bus, service and engine
//! - Build the axum router and serve it
//! - Stop every running routine on graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use lumen_adapter_http_axum::state::AppState;
use lumen_adapter_storage_sqlite_sqlx::SqliteRoutineRepository;
use lumen_adapter_virtual::VirtualLights;
use lumen_app::event_bus::InProcessEventBus;
use lumen_app::routine_engine::RoutineEngine;
use lumen_app::services::routine_service::RoutineService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = lumen_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let repo = Arc::new(SqliteRoutineRepository::new(db.pool().clone()));

    // Lights
    let lights = Arc::new(VirtualLights::from_config(&config.virtual_lights)?);
    tracing::info!(lights = ?lights.light_ids(), "virtual lights configured");

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));

    // Services
    let service = RoutineService::new(Arc::clone(&repo), Arc::clone(&event_bus));
    let engine = RoutineEngine::new(
        lights,
        repo,
        Arc::clone(&event_bus),
        config.engine_config(),
    );

    // HTTP
    let state = AppState::new(service, engine.clone(), event_bus);
    let app = lumen_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, tick_interval = ?engine.config().tick_interval, "lumend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let stopped = engine.cancel_all().await;
    tracing::info!(stopped, "lumend stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
