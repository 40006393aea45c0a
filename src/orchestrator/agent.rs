//! Local agent for the in-memory orchestrator
//!
//! Picks up scheduled runs and executes the matching registered workflow in
//! this process, recording the outcome as the run's final state.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::{InMemoryOrchestrator, State, StateType};
use crate::workflow::FlowRegistry;

pub struct LocalAgent {
    orchestrator: Arc<InMemoryOrchestrator>,
    flows: FlowRegistry,
}

impl LocalAgent {
    pub fn new(orchestrator: Arc<InMemoryOrchestrator>, flows: FlowRegistry) -> Self {
        Self {
            orchestrator,
            flows,
        }
    }

    /// Execute every currently scheduled run, returning how many were picked up
    pub async fn execute_pending(&self) -> usize {
        let pending: Vec<_> = self
            .orchestrator
            .flow_runs()
            .into_iter()
            .filter(|run| run.state.kind == StateType::Scheduled)
            .collect();

        for run in &pending {
            self.orchestrator.set_state(run.id, StateType::Running);

            let flow_name = run
                .deployment_id
                .and_then(|id| self.orchestrator.flow_name(id))
                .unwrap_or_default();
            let outcome = match self.flows.get(&flow_name) {
                Ok(flow) => flow.invoke().await,
                Err(e) => Err(e),
            };

            let state = match outcome {
                Ok(()) => State::new(StateType::Completed),
                Err(e) => {
                    tracing::warn!("Flow run {} failed: {}", run.name, e);
                    State {
                        message: Some(e.to_string()),
                        ..State::new(StateType::Failed)
                    }
                }
            };
            self.orchestrator.transition(run.id, state);
        }

        pending.len()
    }

    /// Poll for scheduled runs until the task is dropped or aborted
    pub async fn run(self, poll_interval: Duration) {
        loop {
            self.execute_pending().await;
            sleep(poll_interval).await;
        }
    }
}
