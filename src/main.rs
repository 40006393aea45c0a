//! flowbridge management entry point
//!
//! Runs database and workflow management commands, and forwards
//! `prefectcli` invocations to the orchestrator CLI.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use flowbridge::commands::{is_forward_command, schedule_local, ExternalCli};
use flowbridge::config::Settings;
use flowbridge::db::UserOps;
use flowbridge::orchestrator::{run_deployment, DeploymentRef, DispatchMode, HttpOrchestrator};
use flowbridge::{flows, setup};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().collect();
    if is_forward_command(&argv) {
        let code = ExternalCli::for_forwarding(Settings::from_env())
            .run_from_argv(&argv)
            .await?;
        std::process::exit(code);
    }

    let settings = Settings::from_env().context("Failed to load settings")?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate => {
            setup::setup(&settings).await?;
            println!("Migrations applied.");
        }
        Commands::CreateUser { username, email } => {
            let context = setup::setup(&settings).await?;
            let user = UserOps::create(&context.pool, &username, &email).await?;
            println!("Created user {} (id {})", user.username, user.id);
        }
        Commands::Flows => {
            for name in flows::registry().names() {
                println!("{}", name);
            }
        }
        Commands::RunFlow { name } => {
            setup::setup(&settings).await?;
            let registry = flows::registry();
            registry.get(&name)?.invoke().await?;
        }
        Commands::Schedule {
            deployment,
            timeout,
            local,
        } => {
            let deployment: DeploymentRef = deployment
                .unwrap_or_else(|| settings.dispatch.deployment.clone())
                .parse()?;
            let mode = match timeout {
                Some(_) => DispatchMode::from_timeout_secs(timeout),
                None => settings.dispatch.mode(),
            };
            let poll_interval = settings.orchestrator.poll_interval();
            let run = if local {
                setup::setup(&settings).await?;
                schedule_local(flows::registry(), &deployment, mode, poll_interval).await?
            } else {
                let orchestrator = HttpOrchestrator::new(&settings.orchestrator)?;
                run_deployment(&orchestrator, &deployment, mode, poll_interval).await?
            };
            println!("{} {} {}", run.id, run.name, run.state.kind);
        }
    }

    Ok(())
}
