/// Server setup and initialization
///
/// Wires together the document client, storage initialization and HTTP routes.
/// Provides the main application factory function for creating the Axum app.

use crate::{
    api::{create_storage_routes, AppState},
    client::MemoryDocumentClient,
    config::Config,
    storage::FlowStorage,
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application over initialized storage
pub fn create_app(storage: Arc<FlowStorage>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Storage API routes
        .merge(create_storage_routes().with_state(AppState { storage }))
}

/// Initialize storage from the configuration
///
/// Uses the in-memory client when `server.in_memory` is set, otherwise the
/// document service named in the storage settings.
pub async fn init_storage(config: &Config) -> Result<FlowStorage> {
    if config.server.in_memory {
        tracing::warn!("🧪 Using in-memory document store, nothing will be persisted");
        let client = Arc::new(MemoryDocumentClient::new());
        return FlowStorage::initialize(&config.settings, client)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e));
    }

    FlowStorage::connect(&config.settings)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    let debug = config.settings.storage().debug;

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_max_level(if debug { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .init();

    tracing::info!("Starting flowdoc storage server...");

    let storage = init_storage(&config).await?;
    let report = storage.bootstrap_report();
    tracing::info!(
        "📋 Bootstrap: created_database={} flows={:?} credentials={:?}",
        report.created_database,
        report.flows,
        report.credentials
    );

    let app = create_app(Arc::new(storage));

    // Bind to the configured address
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
