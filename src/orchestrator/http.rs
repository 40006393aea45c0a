//! HTTP client for the orchestrator REST API.

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use super::{async_trait, Deployment, FlowRun, Orchestrator, State, StateType};
use crate::config::OrchestratorSettings;
use crate::errors::{OrchestratorError, OrchestratorResult};

/// REST client for a Prefect-compatible orchestration API.
#[derive(Debug, Clone)]
pub struct HttpOrchestrator {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpOrchestrator {
    /// Create a client from settings.
    pub fn new(settings: &OrchestratorSettings) -> OrchestratorResult<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(format!("flowbridge/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(settings.api_url())
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| OrchestratorError::InvalidApiUrl(settings.api_url().to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key.clone(),
        })
    }

    /// API URL for `segments`, each percent-encoded as one path segment
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> OrchestratorResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Orchestrator for HttpOrchestrator {
    async fn read_deployment_by_name(
        &self,
        flow_name: &str,
        deployment_name: &str,
    ) -> OrchestratorResult<Deployment> {
        let url = self.url(&["deployments", "name", flow_name, deployment_name]);
        let response = self.authorize(self.client.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(OrchestratorError::DeploymentNotFound(format!(
                "{}/{}",
                flow_name, deployment_name
            )));
        }

        Self::parse(response).await
    }

    async fn read_deployment(&self, id: Uuid) -> OrchestratorResult<Deployment> {
        let url = self.url(&["deployments", &id.to_string()]);
        let response = self.authorize(self.client.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(OrchestratorError::DeploymentNotFound(id.to_string()));
        }

        Self::parse(response).await
    }

    async fn create_flow_run(&self, deployment_id: Uuid) -> OrchestratorResult<FlowRun> {
        let url = self.url(&["deployments", &deployment_id.to_string(), "create_flow_run"]);
        let body = json!({
            "parameters": {},
            "state": State::new(StateType::Scheduled),
        });
        let response = self
            .authorize(self.client.post(url).json(&body))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(OrchestratorError::DeploymentNotFound(deployment_id.to_string()));
        }

        Self::parse(response).await
    }

    async fn read_flow_run(&self, id: Uuid) -> OrchestratorResult<FlowRun> {
        let url = self.url(&["flow_runs", &id.to_string()]);
        let response = self.authorize(self.client.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(OrchestratorError::FlowRunNotFound(id));
        }

        Self::parse(response).await
    }
}
