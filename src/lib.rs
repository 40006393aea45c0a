//! Flowbridge: web and CLI adapters for orchestrated workflows
//!
//! This library provides the pieces shared by the `flowbridge` management
//! CLI and the web server: workflow registration, process startup, the user
//! store read by workflows, and the client for the external orchestrator.

pub mod commands;
pub mod config;
pub mod db;
pub mod errors;
pub mod flows;
pub mod orchestrator;
pub mod setup;
pub mod workflow;

pub use errors::{FlowError, OrchestratorError, SetupError};
pub use orchestrator::{run_deployment, DeploymentRef, DispatchMode, Orchestrator};
pub use workflow::{flow, Flow, FlowRegistry};
