use config::{Config as ConfigLib, ConfigError};
use flowbridge::config::{with_defaults, with_sources, Settings};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ServerSection {
    environment: String,
    host: String,
    port: u16,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database, orchestrator and dispatch settings
    pub settings: Settings,
}

impl Config {
    /// Load configuration from environment variables and config files
    pub fn from_env() -> Result<Self, ConfigError> {
        let builder = with_defaults(ConfigLib::builder())?
            .set_default("environment", "development")?
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?;

        let raw = with_sources(builder).build()?;
        let server: ServerSection = raw.clone().try_deserialize()?;

        Ok(Self {
            environment: server.environment,
            host: server.host,
            port: server.port,
            settings: raw.try_deserialize()?,
        })
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
