//! Command-line interface definition and argument parsing
//!
//! This module uses clap to define the management commands. The
//! `prefectcli` forwarder is dispatched before clap runs and is only
//! listed here in the help text.

use clap::{Parser, Subcommand};

/// Command-line arguments for flowbridge
#[derive(Parser, Debug)]
#[command(
    name = "flowbridge",
    about = "Management commands for flowbridge workflows",
    version,
    after_help = "Orchestrator passthrough:\n  prefectcli [ARGS]...  Forward ARGS verbatim to the orchestrator CLI"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for flowbridge
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply database migrations
    Migrate,

    /// Add a user to the user store
    CreateUser {
        /// Username of the new user
        username: String,

        /// Email address of the new user
        #[arg(long, default_value = "")]
        email: String,
    },

    /// List registered workflows
    Flows,

    /// Run a registered workflow in this process
    RunFlow {
        /// Name of the workflow to run
        name: String,
    },

    /// Schedule a run of a deployment through the orchestrator
    Schedule {
        /// Deployment as `flow-name/deployment-name` or a UUID
        /// (defaults to the configured dispatch deployment)
        deployment: Option<String>,

        /// Seconds to wait for the run to finish; 0 returns once scheduled
        #[arg(long)]
        timeout: Option<u64>,

        /// Run against an in-process orchestrator and agent instead of the API
        #[arg(long)]
        local: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schedule() {
        let cli = Cli::try_parse_from(["flowbridge", "schedule", "x/y", "--timeout", "0"]).unwrap();
        match cli.command {
            Commands::Schedule {
                deployment,
                timeout,
                local,
            } => {
                assert_eq!(deployment.as_deref(), Some("x/y"));
                assert_eq!(timeout, Some(0));
                assert!(!local);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_schedule_local() {
        let cli = Cli::try_parse_from(["flowbridge", "schedule", "--local"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Schedule { deployment: None, timeout: None, local: true }
        ));
    }

    #[test]
    fn test_parse_create_user() {
        let cli = Cli::try_parse_from(["flowbridge", "create-user", "ada"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::CreateUser { ref username, ref email } if username == "ada" && email.is_empty()
        ));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["flowbridge", "frobnicate"]).is_err());
    }
}
