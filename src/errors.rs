//! Error types shared by the library
//!
//! Workflow failures and orchestrator failures are kept apart so callers
//! (the web server in particular) can map them to different responses.

use thiserror::Error;

/// Errors raised while running a workflow in-process
#[derive(Error, Debug)]
pub enum FlowError {
    /// A record the workflow expected was absent and one of its fields was read
    #[error("Cannot read attribute '{field}': no {model} record found")]
    MissingRecord {
        model: &'static str,
        field: &'static str,
    },

    #[error("Application not initialized: call setup() before running workflows")]
    NotInitialized,

    #[error("Unknown workflow: {0}")]
    UnknownFlow(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Workflow failed: {0}")]
    Failed(String),
}

/// Errors raised while talking to the orchestration service
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Orchestrator API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Deployment not found: {0}")]
    DeploymentNotFound(String),

    #[error("Flow run not found: {0}")]
    FlowRunNotFound(uuid::Uuid),

    #[error("Invalid orchestrator API URL: {0}")]
    InvalidApiUrl(String),

    #[error("Invalid deployment reference '{0}': expected a UUID or 'flow-name/deployment-name'")]
    InvalidDeploymentRef(String),
}

/// Errors raised by process-wide startup
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to apply migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type FlowResult<T> = Result<T, FlowError>;
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
