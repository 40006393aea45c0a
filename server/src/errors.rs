use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flowbridge::{FlowError, OrchestratorError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Workflow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
    message: String,
    status_code: u16,
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Flow(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Orchestrator(
                OrchestratorError::InvalidDeploymentRef(_) | OrchestratorError::InvalidApiUrl(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Orchestrator(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ServerError::Flow(_) => "workflow_error",
            ServerError::Orchestrator(_) => "orchestrator_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        log::error!("Request failed: {}", self);

        let body = Json(ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
