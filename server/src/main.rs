//! flowbridge server
//!
//! Main entry point for the web server. Provides HTTP endpoints that run
//! workflows in-process or schedule them through the orchestrator.

mod api;
mod config;
mod errors;

pub use api::AppState;

use crate::config::Config;
use flowbridge::orchestrator::HttpOrchestrator;
use flowbridge::{flows, setup, DeploymentRef};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize logging based on environment
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug")),
        )
        .init();

    if config.is_development() {
        tracing::debug!("Loaded configuration: {:?}", config);
    }

    // Workflows read the user store through the process context, so it has
    // to exist before the first request arrives
    setup::setup(&config.settings).await.map_err(|e| {
        tracing::error!("Startup failed: {}", e);
        e
    })?;

    let deployment: DeploymentRef = config.settings.dispatch.deployment.parse()?;
    let orchestrator = HttpOrchestrator::new(&config.settings.orchestrator)?;

    let state = Arc::new(AppState {
        poll_interval: config.settings.orchestrator.poll_interval(),
        flows: flows::registry(),
        orchestrator: Arc::new(orchestrator),
        deployment,
        config: config.clone(),
    });

    let app = api::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
