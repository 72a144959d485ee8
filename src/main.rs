use log::*;
use service::{config::Config, logging::Logger};
use std::sync::Arc;

use domain::{ConnectorRegistry, InMemoryPipeStore, PipeStore, StrategyRegistry};
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting Pipeflow OAuth orchestrator [{}]",
        config.runtime_env()
    );

    // Connectors and auth strategies are registered by the platform's plugin
    // loader at startup; the orchestrator only reads from these registries.
    let connectors = Arc::new(ConnectorRegistry::new());
    let strategies = Arc::new(StrategyRegistry::new());
    let pipes: Arc<dyn PipeStore> = Arc::new(InMemoryPipeStore::new());

    let app_state = AppState::new(config.clone(), connectors, strategies, pipes);

    let host = config.interface.as_deref().unwrap_or("127.0.0.1");
    let listen_addr = format!("{}:{}", host, config.port);

    info!("Server starting... listening for connections on http://{listen_addr}");

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {listen_addr}: {e}");
            std::process::exit(1);
        }
    };

    let router = web::init_server(app_state);

    if let Err(e) = web::serve(listener, router).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
