//! Settings shared by the CLI and the web server
//!
//! Values come from built-in defaults, an optional `config/<ENVIRONMENT>`
//! file and `__`-separated environment variables, in that order.

use config::{Config as ConfigLib, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::orchestrator::DispatchMode;

/// Orchestrator API used when none is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:4200/api";

/// Executable that receives forwarded arguments when none is configured
pub const DEFAULT_CLI_PROGRAM: &str = "prefect";

/// Connection details for the orchestration service
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSettings {
    /// Base URL of the orchestrator REST API; unset means `DEFAULT_API_URL`
    /// for the HTTP client and no override for the forwarded CLI
    pub api_url: Option<String>,
    /// Bearer token sent with every API request
    pub api_key: Option<String>,
    /// Delay between flow-run state checks while waiting
    pub poll_interval_secs: u64,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
    /// Executable that receives forwarded CLI arguments
    pub cli_program: String,
}

impl OrchestratorSettings {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Poll delay, never shorter than one second
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Which deployment the web handlers trigger, and how long they wait
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    /// Deployment reference, `flow-name/deployment-name` or a UUID
    pub deployment: String,
    /// Absent waits indefinitely, `0` returns as soon as the run is scheduled
    pub wait_timeout_secs: Option<u64>,
}

impl DispatchSettings {
    pub fn mode(&self) -> DispatchMode {
        DispatchMode::from_timeout_secs(self.wait_timeout_secs)
    }
}

/// Library settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Database holding the user records read by workflows
    pub database_url: String,
    pub orchestrator: OrchestratorSettings,
    pub dispatch: DispatchSettings,
}

impl Settings {
    /// Load settings from defaults, config files and the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let builder = with_defaults(ConfigLib::builder())?;
        let builder = with_sources(builder);
        builder.build()?.try_deserialize()
    }
}

/// Apply the library defaults to a config builder
///
/// The server layers its own keys on top of the same builder, so the
/// defaults are exposed separately from `Settings::from_env`.
pub fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("database_url", "sqlite://flowbridge.db?mode=rwc")?
        .set_default("orchestrator.poll_interval_secs", 5)?
        .set_default("orchestrator.request_timeout_secs", 30)?
        .set_default("orchestrator.cli_program", DEFAULT_CLI_PROGRAM)?
        .set_default("dispatch.deployment", "test-flow/test-flow")
}

/// Layer the optional environment file and environment variables
pub fn with_sources(mut builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    if let Ok(env) = env::var("ENVIRONMENT") {
        builder = builder.add_source(File::with_name(&format!("config/{}", env)).required(false));
    }

    builder.add_source(Environment::default().separator("__"))
}
