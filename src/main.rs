/// flowdoc-storage server
///
/// Main entry point. Loads configuration from the environment, initializes storage
/// and serves the storage API.

use flowdoc_storage::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Singleton state at /flows, /credentials, /settings, /sessions
/// - Library entries and listings at /library/{type}/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3005 and the NODE_RED_CLOUDANT service)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
