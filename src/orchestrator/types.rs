use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::OrchestratorError;

/// How a caller waits on a scheduled run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Block until the run is final, or until `timeout` elapses if set
    WaitForCompletion { timeout: Option<Duration> },
    /// Return as soon as the orchestrator has accepted the run
    FireAndForget,
}

impl DispatchMode {
    /// Map a timeout setting onto a dispatch mode
    ///
    /// `None` waits indefinitely and `Some(0)` does not wait at all.
    pub fn from_timeout_secs(timeout_secs: Option<u64>) -> Self {
        match timeout_secs {
            Some(0) => DispatchMode::FireAndForget,
            Some(secs) => DispatchMode::WaitForCompletion {
                timeout: Some(Duration::from_secs(secs)),
            },
            None => DispatchMode::WaitForCompletion { timeout: None },
        }
    }
}

impl Default for DispatchMode {
    fn default() -> Self {
        DispatchMode::WaitForCompletion { timeout: None }
    }
}

/// Reference to a deployment, by id or by `flow-name/deployment-name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentRef {
    Id(Uuid),
    Name { flow: String, deployment: String },
}

impl FromStr for DeploymentRef {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = Uuid::parse_str(s) {
            return Ok(DeploymentRef::Id(id));
        }

        match s.split_once('/') {
            Some((flow, deployment))
                if !flow.is_empty() && !deployment.is_empty() && !deployment.contains('/') =>
            {
                Ok(DeploymentRef::Name {
                    flow: flow.to_string(),
                    deployment: deployment.to_string(),
                })
            }
            _ => Err(OrchestratorError::InvalidDeploymentRef(s.to_string())),
        }
    }
}

impl fmt::Display for DeploymentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentRef::Id(id) => write!(f, "{}", id),
            DeploymentRef::Name { flow, deployment } => write!(f, "{}/{}", flow, deployment),
        }
    }
}

/// Deployment record as returned by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deployment {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub flow_id: Option<Uuid>,
}

/// Flow-run state types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateType {
    Scheduled,
    Pending,
    Running,
    Paused,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Crashed,
}

impl StateType {
    /// Whether no further transitions are expected
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            StateType::Completed | StateType::Failed | StateType::Cancelled | StateType::Crashed
        )
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateType::Scheduled => "Scheduled",
            StateType::Pending => "Pending",
            StateType::Running => "Running",
            StateType::Paused => "Paused",
            StateType::Cancelling => "Cancelling",
            StateType::Completed => "Completed",
            StateType::Failed => "Failed",
            StateType::Cancelled => "Cancelled",
            StateType::Crashed => "Crashed",
        };
        write!(f, "{}", name)
    }
}

/// Flow-run state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct State {
    #[serde(rename = "type")]
    pub kind: StateType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl State {
    pub fn new(kind: StateType) -> Self {
        Self {
            kind,
            name: Some(kind.to_string()),
            message: None,
        }
    }

    pub fn is_final(&self) -> bool {
        self.kind.is_final()
    }
}

/// Flow run as returned by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowRun {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub deployment_id: Option<Uuid>,
    pub state: State,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deployment_ref() {
        assert_eq!(
            "test-flow/test-flow".parse::<DeploymentRef>().unwrap(),
            DeploymentRef::Name {
                flow: "test-flow".to_string(),
                deployment: "test-flow".to_string(),
            }
        );

        let id = Uuid::new_v4();
        assert_eq!(
            id.to_string().parse::<DeploymentRef>().unwrap(),
            DeploymentRef::Id(id)
        );

        for bad in ["test-flow", "/x", "x/", "a/b/c", ""] {
            assert!(
                matches!(
                    bad.parse::<DeploymentRef>(),
                    Err(OrchestratorError::InvalidDeploymentRef(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_dispatch_mode_from_timeout() {
        assert_eq!(DispatchMode::from_timeout_secs(Some(0)), DispatchMode::FireAndForget);
        assert_eq!(
            DispatchMode::from_timeout_secs(Some(30)),
            DispatchMode::WaitForCompletion {
                timeout: Some(Duration::from_secs(30))
            }
        );
        assert_eq!(DispatchMode::from_timeout_secs(None), DispatchMode::default());
    }

    #[test]
    fn test_final_states() {
        assert!(StateType::Completed.is_final());
        assert!(StateType::Crashed.is_final());
        assert!(!StateType::Scheduled.is_final());
        assert!(!StateType::Cancelling.is_final());
    }

    #[test]
    fn test_flow_run_from_api_json() {
        let json = r#"{
            "id": "3f0c8a9e-6d2b-4c59-9b0e-0b8f6a1f2c11",
            "name": "crimson-otter",
            "deployment_id": null,
            "flow_id": "8b9f1c2d-1111-4c59-9b0e-0b8f6a1f2c11",
            "state": {"type": "SCHEDULED", "name": "Scheduled", "message": null}
        }"#;

        let run: FlowRun = serde_json::from_str(json).unwrap();
        assert_eq!(run.name, "crimson-otter");
        assert_eq!(run.state.kind, StateType::Scheduled);
        assert!(!run.state.is_final());
    }
}
