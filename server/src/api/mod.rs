pub mod flows;

use axum::{routing::get, Router};
use flowbridge::{DeploymentRef, FlowRegistry, Orchestrator};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    /// Workflows runnable in-process
    pub flows: FlowRegistry,
    pub orchestrator: Arc<dyn Orchestrator>,
    /// Deployment scheduled by the dispatch handlers
    pub deployment: DeploymentRef,
    /// Delay between flow-run state checks while a handler waits
    pub poll_interval: Duration,
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/flows/run-immediately",
            get(flows::run_flow_immediately).post(flows::run_flow_immediately),
        )
        .route(
            "/flows/schedule",
            get(flows::schedule_flow_run).post(flows::schedule_flow_run),
        )
        .route(
            "/flows/create-run",
            get(flows::create_flow_run).post(flows::create_flow_run),
        )
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}
