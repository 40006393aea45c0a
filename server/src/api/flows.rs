//! Workflow dispatch handlers
//!
//! Every handler ignores the request and answers `200 OK` with an empty body
//! once its dispatch has returned. Failures raised while dispatching are
//! turned into error responses by `ServerError`.

use axum::{extract::State, http::StatusCode};
use flowbridge::flows::hello;
use flowbridge::{run_deployment, DispatchMode};
use log::info;
use std::sync::Arc;

use crate::api::AppState;
use crate::errors::ServerError;

/// Run the workflow in this request and wait for it to return
///
/// Running a workflow in-process ties up the request for as long as the
/// workflow takes.
pub async fn run_flow_immediately(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ServerError> {
    let flow = state.flows.get(hello::FLOW_NAME)?;
    flow.invoke().await?;
    Ok(StatusCode::OK)
}

/// Schedule a run of the deployment without waiting for it
///
/// The response goes out as soon as the orchestrator has accepted the run.
/// An agent executes it later, and its outcome never reaches this caller.
pub async fn schedule_flow_run(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ServerError> {
    let run = run_deployment(
        state.orchestrator.as_ref(),
        &state.deployment,
        DispatchMode::FireAndForget,
        state.poll_interval,
    )
    .await?;
    info!("Scheduled flow run {} ({})", run.name, run.id);
    Ok(StatusCode::OK)
}

/// Schedule a run of the deployment and wait as configured
///
/// Without a configured timeout the handler waits until the run reaches a
/// final state; with one it gives up after that many seconds.
pub async fn create_flow_run(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ServerError> {
    let run = run_deployment(
        state.orchestrator.as_ref(),
        &state.deployment,
        state.config.settings.dispatch.mode(),
        state.poll_interval,
    )
    .await?;
    info!("Flow run {} ({}) left in state {}", run.name, run.id, run.state.kind);
    Ok(StatusCode::OK)
}
