use std::sync::Arc;

use axum::http::HeaderValue;
use axum::http::Method;
use axum::Router;
use log::warn;
use time::Duration;
use tower_http::cors::CorsLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use domain::{ConnectorRegistry, PipeStore, StrategyRegistry};
use service::config::Config;

pub(crate) mod controller;
mod error;
pub mod router;

pub use error::{Error, Result};

/// Web-level state shared across request handlers.
///
/// The registries are owned by the platform's plugin loader; the pipe
/// store is the external configuration store. All are read-only from this
/// layer's perspective.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub connectors: Arc<ConnectorRegistry>,
    pub strategies: Arc<StrategyRegistry>,
    pub pipes: Arc<dyn PipeStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        connectors: Arc<ConnectorRegistry>,
        strategies: Arc<StrategyRegistry>,
        pipes: Arc<dyn PipeStore>,
    ) -> Self {
        Self {
            config,
            connectors,
            strategies,
            pipes,
        }
    }
}

/// Build the full application router with session and CORS layers applied.
pub fn init_server(app_state: AppState) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(app_state.config.is_production())
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            app_state.config.backend_session_expiry_seconds as i64,
        )));

    let allowed_origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse()
                .inspect_err(|e| warn!("Skipping invalid CORS origin [{origin}]: {e}"))
                .ok()
        })
        .collect();

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_credentials(true)
        .allow_origin(allowed_origins);

    router::define_routes(app_state)
        .layer(session_layer)
        .layer(cors_layer)
}

/// Serve the router on an already-bound listener.
pub async fn serve(listener: tokio::net::TcpListener, router: Router) -> std::io::Result<()> {
    axum::serve(listener, router).await
}
