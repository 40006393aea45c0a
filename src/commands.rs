//! Management commands
//!
//! `prefectcli` hands everything after the command token to the external
//! orchestrator CLI untouched. The argument vector is taken raw, before any
//! local parsing, so flags such as `--help` reach the external program.
//!
//! `schedule_local` schedules through an in-process orchestrator and agent
//! for development without an orchestration service.

use anyhow::{anyhow, Context, Result};
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use crate::config::{OrchestratorSettings, Settings, DEFAULT_CLI_PROGRAM};
use crate::orchestrator::{
    run_deployment, DeploymentRef, DispatchMode, FlowRun, InMemoryOrchestrator, LocalAgent,
};
use crate::workflow::FlowRegistry;

/// Command token that triggers forwarding
pub const FORWARD_COMMAND: &str = "prefectcli";

/// Arguments passed on to the external CLI: everything after the program
/// name and the command token
pub fn forwarded_args(argv: &[String]) -> &[String] {
    argv.get(2..).unwrap_or(&[])
}

/// Whether `argv` names the forwarding command
pub fn is_forward_command(argv: &[String]) -> bool {
    argv.get(1).map(String::as_str) == Some(FORWARD_COMMAND)
}

/// External orchestrator command-line program
#[derive(Debug, Clone)]
pub struct ExternalCli {
    program: String,
    env: Vec<(String, String)>,
}

impl ExternalCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            env: Vec::new(),
        }
    }

    /// Program configured in settings
    ///
    /// An explicitly configured API URL or key is exported to the child only
    /// when the parent environment does not already define that variable.
    pub fn from_settings(settings: &OrchestratorSettings) -> Self {
        Self::from_settings_with(settings, |key| std::env::var_os(key).is_some())
    }

    fn from_settings_with(
        settings: &OrchestratorSettings,
        is_set: impl Fn(&str) -> bool,
    ) -> Self {
        let mut cli = Self::new(settings.cli_program.clone());
        let exports = [
            ("PREFECT_API_URL", settings.api_url.as_ref()),
            ("PREFECT_API_KEY", settings.api_key.as_ref()),
        ];
        for (key, value) in exports {
            match value {
                Some(value) if !is_set(key) => cli = cli.with_env(key, value.clone()),
                Some(_) => tracing::debug!("{} already set, not overriding", key),
                None => {}
            }
        }
        cli
    }

    /// Forwarder for the `prefectcli` command
    ///
    /// Broken settings must not stop arguments reaching the external CLI, so
    /// a load failure falls back to the default program and the parent
    /// environment as-is.
    pub fn for_forwarding<E: std::fmt::Display>(settings: Result<Settings, E>) -> Self {
        match settings {
            Ok(settings) => Self::from_settings(&settings.orchestrator),
            Err(e) => {
                tracing::warn!("Ignoring settings for forwarded command: {}", e);
                Self::new(DEFAULT_CLI_PROGRAM)
            }
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Variables set on the child in addition to the inherited environment
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Run the program with `args` and wait for it to exit
    pub async fn run(&self, args: &[String]) -> Result<ExitStatus> {
        tracing::debug!("Forwarding {:?} to {}", args, self.program);
        Command::new(&self.program)
            .args(args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()
            .await
            .with_context(|| format!("Failed to run orchestrator CLI '{}'", self.program))
    }

    /// Forward a raw argument vector and return the child's exit code
    pub async fn run_from_argv(&self, argv: &[String]) -> Result<i32> {
        let status = self.run(forwarded_args(argv)).await?;
        // terminated by a signal has no code
        Ok(status.code().unwrap_or(1))
    }
}

/// Schedule `deployment` against an in-process orchestrator
///
/// The deployment is registered under its flow name and a local agent runs
/// it through `flows`. Waiting modes run the agent alongside the caller;
/// fire-and-forget returns the scheduled run and executes it afterwards.
pub async fn schedule_local(
    flows: FlowRegistry,
    deployment: &DeploymentRef,
    mode: DispatchMode,
    poll_interval: Duration,
) -> Result<FlowRun> {
    let (flow_name, deployment_name) = match deployment {
        DeploymentRef::Name { flow, deployment } => (flow, deployment),
        DeploymentRef::Id(id) => {
            return Err(anyhow!(
                "Local scheduling needs 'flow-name/deployment-name', got id {}",
                id
            ))
        }
    };

    let orchestrator = Arc::new(InMemoryOrchestrator::new());
    orchestrator.add_deployment(flow_name, deployment_name);
    let agent = LocalAgent::new(orchestrator.clone(), flows);

    if mode == DispatchMode::FireAndForget {
        let run = run_deployment(&*orchestrator, deployment, mode, poll_interval).await?;
        agent.execute_pending().await;
        return Ok(run);
    }

    let agent_task = tokio::spawn(agent.run(poll_interval));
    let run = run_deployment(&*orchestrator, deployment, mode, poll_interval).await;
    agent_task.abort();
    Ok(run?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::StateType;
    use crate::workflow::flow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_forwarded_args_strip_program_and_command() {
        let argv = argv(&["prog", "prefectcli", "deployment", "run", "x/y"]);
        assert!(is_forward_command(&argv));
        assert_eq!(forwarded_args(&argv), ["deployment", "run", "x/y"]);
    }

    #[test]
    fn test_forwarded_args_are_verbatim() {
        let argv = argv(&["prog", "prefectcli", "--help", "-x", "a b", "--", "prefectcli"]);
        assert_eq!(forwarded_args(&argv), ["--help", "-x", "a b", "--", "prefectcli"]);
    }

    #[test]
    fn test_forwarded_args_short_argv() {
        assert!(forwarded_args(&argv(&["prog", "prefectcli"])).is_empty());
        assert!(forwarded_args(&argv(&["prog"])).is_empty());
        assert!(!is_forward_command(&argv(&["prog", "migrate"])));
        assert!(!is_forward_command(&argv(&["prog"])));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_is_propagated() {
        let ok = ExternalCli::new("true");
        assert_eq!(ok.run_from_argv(&argv(&["prog", "prefectcli"])).await.unwrap(), 0);

        let failing = ExternalCli::new("sh");
        let code = failing
            .run_from_argv(&argv(&["prog", "prefectcli", "-c", "exit 3"]))
            .await
            .unwrap();
        assert_eq!(code, 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_environment_is_exported() {
        let cli = ExternalCli::new("sh").with_env("PREFECT_API_URL", "http://orchestrator/api");
        let code = cli
            .run_from_argv(&argv(&[
                "prog",
                "prefectcli",
                "-c",
                r#"test "$PREFECT_API_URL" = "http://orchestrator/api""#,
            ]))
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    fn orchestrator_settings(api_url: Option<&str>, api_key: Option<&str>) -> OrchestratorSettings {
        OrchestratorSettings {
            api_url: api_url.map(str::to_string),
            api_key: api_key.map(str::to_string),
            poll_interval_secs: 5,
            request_timeout_secs: 30,
            cli_program: "prefect".to_string(),
        }
    }

    #[test]
    fn test_unconfigured_api_is_not_exported() {
        let cli = ExternalCli::from_settings_with(&orchestrator_settings(None, None), |_| false);
        assert_eq!(cli.program(), "prefect");
        assert!(cli.env().is_empty());
    }

    #[test]
    fn test_configured_api_is_exported_when_parent_lacks_it() {
        let settings = orchestrator_settings(Some("http://orchestrator/api"), Some("key"));

        let cli = ExternalCli::from_settings_with(&settings, |_| false);
        assert_eq!(
            cli.env(),
            [
                ("PREFECT_API_URL".to_string(), "http://orchestrator/api".to_string()),
                ("PREFECT_API_KEY".to_string(), "key".to_string()),
            ]
        );

        let cli = ExternalCli::from_settings_with(&settings, |key| key == "PREFECT_API_URL");
        assert_eq!(
            cli.env(),
            [("PREFECT_API_KEY".to_string(), "key".to_string())]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_parent_api_url_reaches_child() {
        // only test in the crate touching this variable
        std::env::set_var("PREFECT_API_URL", "https://api.example.cloud/api/workspaces/w");

        let mut settings = orchestrator_settings(Some("http://127.0.0.1:4200/api"), None);
        settings.cli_program = "sh".to_string();
        let code = ExternalCli::from_settings(&settings)
            .run_from_argv(&argv(&[
                "prog",
                "prefectcli",
                "-c",
                r#"test "$PREFECT_API_URL" = "https://api.example.cloud/api/workspaces/w""#,
            ]))
            .await
            .unwrap();

        std::env::remove_var("PREFECT_API_URL");
        assert_eq!(code, 0);
    }

    #[test]
    fn test_forwarding_survives_bad_settings() {
        let cli = ExternalCli::for_forwarding::<String>(Err("invalid type for port".to_string()));
        assert_eq!(cli.program(), DEFAULT_CLI_PROGRAM);
        assert!(cli.env().is_empty());
    }

    fn counting_flows(calls: Arc<AtomicUsize>) -> FlowRegistry {
        let mut flows = FlowRegistry::new();
        flows.register(flow("test-flow", move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));
        flows
    }

    #[tokio::test]
    async fn test_schedule_local_waits_for_completion() {
        let calls = Arc::new(AtomicUsize::new(0));
        let run = schedule_local(
            counting_flows(calls.clone()),
            &"test-flow/test-flow".parse().unwrap(),
            DispatchMode::WaitForCompletion { timeout: None },
            Duration::from_millis(10),
        )
        .await
        .unwrap();

        assert_eq!(run.state.kind, StateType::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_schedule_local_fire_and_forget_runs_afterwards() {
        let calls = Arc::new(AtomicUsize::new(0));
        let run = schedule_local(
            counting_flows(calls.clone()),
            &"test-flow/test-flow".parse().unwrap(),
            DispatchMode::FireAndForget,
            Duration::from_millis(10),
        )
        .await
        .unwrap();

        assert_eq!(run.state.kind, StateType::Scheduled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_schedule_local_unregistered_flow_fails_run() {
        let run = schedule_local(
            FlowRegistry::new(),
            &"other-flow/nightly".parse().unwrap(),
            DispatchMode::WaitForCompletion { timeout: None },
            Duration::from_millis(10),
        )
        .await
        .unwrap();

        assert_eq!(run.state.kind, StateType::Failed);
    }

    #[tokio::test]
    async fn test_schedule_local_rejects_deployment_id() {
        let deployment = DeploymentRef::Id(uuid::Uuid::new_v4());
        let result = schedule_local(
            FlowRegistry::new(),
            &deployment,
            DispatchMode::FireAndForget,
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let cli = ExternalCli::new("flowbridge-no-such-program");
        assert!(cli.run(&[]).await.is_err());
    }
}
