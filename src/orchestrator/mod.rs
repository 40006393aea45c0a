//! Orchestration service client layer
//!
//! This module defines the seam between the adapters in this crate and the
//! external orchestration service: the `Orchestrator` trait, the flow-run
//! model it speaks, and `run_deployment`, which schedules a run and
//! optionally waits for it to reach a final state.

pub use async_trait::async_trait;

pub mod agent;
pub mod http;
pub mod memory;
mod types;

pub use self::agent::LocalAgent;
pub use self::http::HttpOrchestrator;
pub use self::memory::InMemoryOrchestrator;
pub use self::types::*;

use std::time::Duration;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use crate::errors::OrchestratorResult;

/// Shortest delay allowed between flow-run state checks
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Common trait for orchestration backends
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Look up a deployment by flow and deployment name
    async fn read_deployment_by_name(
        &self,
        flow_name: &str,
        deployment_name: &str,
    ) -> OrchestratorResult<Deployment>;

    /// Look up a deployment by id
    async fn read_deployment(&self, id: Uuid) -> OrchestratorResult<Deployment>;

    /// Ask the orchestrator to schedule a new run of a deployment
    ///
    /// Returns once the run has been accepted; execution is left to an agent.
    async fn create_flow_run(&self, deployment_id: Uuid) -> OrchestratorResult<FlowRun>;

    /// Fetch the current state of a flow run
    async fn read_flow_run(&self, id: Uuid) -> OrchestratorResult<FlowRun>;

    /// Resolve a deployment reference to a deployment record
    async fn resolve(&self, deployment: &DeploymentRef) -> OrchestratorResult<Deployment> {
        match deployment {
            DeploymentRef::Id(id) => self.read_deployment(*id).await,
            DeploymentRef::Name { flow, deployment } => {
                self.read_deployment_by_name(flow, deployment).await
            }
        }
    }
}

/// Schedule a run of `deployment` and wait according to `mode`
///
/// With `FireAndForget` the created run is returned as soon as the
/// orchestrator acknowledges it. With `WaitForCompletion` the run is polled
/// every `poll_interval` (at least `MIN_POLL_INTERVAL`) until it reaches a
/// final state; when a timeout is
/// given and elapses first, the last observed run is returned. A run that
/// ends `Failed` or `Crashed` is still returned as `Ok`.
pub async fn run_deployment(
    orchestrator: &dyn Orchestrator,
    deployment: &DeploymentRef,
    mode: DispatchMode,
    poll_interval: Duration,
) -> OrchestratorResult<FlowRun> {
    let target = orchestrator.resolve(deployment).await?;
    let flow_run = orchestrator.create_flow_run(target.id).await?;
    tracing::info!(
        "Created flow run '{}' ({}) for deployment {}",
        flow_run.name,
        flow_run.id,
        deployment
    );

    let wait_limit = match mode {
        DispatchMode::FireAndForget => return Ok(flow_run),
        DispatchMode::WaitForCompletion { timeout } => timeout,
    };

    let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
    let run_id = flow_run.id;
    let mut last_seen = flow_run;

    let wait = async {
        loop {
            if last_seen.state.is_final() {
                return Ok::<(), crate::errors::OrchestratorError>(());
            }
            sleep(poll_interval).await;
            last_seen = orchestrator.read_flow_run(run_id).await?;
            tracing::debug!("Flow run {} is {}", run_id, last_seen.state.kind);
        }
    };

    match wait_limit {
        None => wait.await?,
        Some(limit) => match timeout(limit, wait).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    "Stopped waiting for flow run {} after {:?}",
                    run_id,
                    limit
                );
            }
        },
    }

    Ok(last_seen)
}
