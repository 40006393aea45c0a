//! In-process orchestrator
//!
//! Keeps deployments and flow runs in memory. Nothing executes runs on its
//! own: `set_state` plays the part of the agent that would pick a run up.

use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::{async_trait, Deployment, FlowRun, Orchestrator, State, StateType};
use crate::errors::{OrchestratorError, OrchestratorResult};

#[derive(Default)]
struct Inner {
    // keyed by (flow name, deployment name)
    deployments: HashMap<(String, String), Deployment>,
    flow_runs: Vec<FlowRun>,
}

/// Orchestrator backend that never leaves the process
#[derive(Default)]
pub struct InMemoryOrchestrator {
    inner: RwLock<Inner>,
}

impl InMemoryOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deployment and return its record
    pub fn add_deployment(&self, flow_name: &str, deployment_name: &str) -> Deployment {
        let deployment = Deployment {
            id: Uuid::new_v4(),
            name: deployment_name.to_string(),
            flow_id: None,
        };
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.deployments.insert(
            (flow_name.to_string(), deployment_name.to_string()),
            deployment.clone(),
        );
        deployment
    }

    /// All flow runs created so far, oldest first
    pub fn flow_runs(&self) -> Vec<FlowRun> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.flow_runs.clone()
    }

    /// Move a flow run to a new state
    pub fn set_state(&self, id: Uuid, kind: StateType) -> bool {
        self.transition(id, State::new(kind))
    }

    /// Replace a flow run's state, returning false for an unknown run
    pub fn transition(&self, id: Uuid, state: State) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        match inner.flow_runs.iter_mut().find(|run| run.id == id) {
            Some(run) => {
                run.state = state;
                true
            }
            None => false,
        }
    }

    /// Flow name a deployment was registered under
    pub fn flow_name(&self, deployment_id: Uuid) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .deployments
            .iter()
            .find(|(_, d)| d.id == deployment_id)
            .map(|((flow, _), _)| flow.clone())
    }
}

#[async_trait]
impl Orchestrator for InMemoryOrchestrator {
    async fn read_deployment_by_name(
        &self,
        flow_name: &str,
        deployment_name: &str,
    ) -> OrchestratorResult<Deployment> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .deployments
            .get(&(flow_name.to_string(), deployment_name.to_string()))
            .cloned()
            .ok_or_else(|| {
                OrchestratorError::DeploymentNotFound(format!("{}/{}", flow_name, deployment_name))
            })
    }

    async fn read_deployment(&self, id: Uuid) -> OrchestratorResult<Deployment> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .deployments
            .values()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| OrchestratorError::DeploymentNotFound(id.to_string()))
    }

    async fn create_flow_run(&self, deployment_id: Uuid) -> OrchestratorResult<FlowRun> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if !inner.deployments.values().any(|d| d.id == deployment_id) {
            return Err(OrchestratorError::DeploymentNotFound(deployment_id.to_string()));
        }

        let id = Uuid::new_v4();
        let run = FlowRun {
            id,
            name: format!("run-{}", &id.simple().to_string()[..8]),
            deployment_id: Some(deployment_id),
            state: State::new(StateType::Scheduled),
        };
        inner.flow_runs.push(run.clone());
        Ok(run)
    }

    async fn read_flow_run(&self, id: Uuid) -> OrchestratorResult<FlowRun> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .flow_runs
            .iter()
            .find(|run| run.id == id)
            .cloned()
            .ok_or(OrchestratorError::FlowRunNotFound(id))
    }
}
