//! Process-wide startup
//!
//! Workflows reach the user store through a context installed once per
//! process. `setup` must run before any workflow is invoked; calling it again
//! returns the context that is already installed.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tokio::sync::OnceCell;

use crate::config::Settings;
use crate::errors::{FlowError, FlowResult, SetupError};

/// Shared bindings available to workflows
#[derive(Debug, Clone)]
pub struct AppContext {
    pub pool: SqlitePool,
}

static CONTEXT: OnceCell<AppContext> = OnceCell::const_new();

/// Embedded schema migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Connect to the configured database, apply migrations and install the context
///
/// Concurrent and repeated calls connect at most once.
pub async fn setup(settings: &Settings) -> Result<&'static AppContext, SetupError> {
    CONTEXT
        .get_or_try_init(|| async {
            let pool = connect(&settings.database_url).await?;
            MIGRATOR.run(&pool).await?;
            tracing::info!("Initialized application context");
            Ok(AppContext { pool })
        })
        .await
}

/// Install an already-connected pool as the process context
///
/// Returns the installed context, which is the existing one if setup has
/// already happened.
pub async fn install(pool: SqlitePool) -> Result<&'static AppContext, SetupError> {
    CONTEXT
        .get_or_try_init(move || async move {
            MIGRATOR.run(&pool).await?;
            Ok(AppContext { pool })
        })
        .await
}

/// The installed context, or `FlowError::NotInitialized` before setup
pub fn context() -> FlowResult<&'static AppContext> {
    CONTEXT.get().ok_or(FlowError::NotInitialized)
}

pub fn is_initialized() -> bool {
    CONTEXT.initialized()
}

async fn connect(database_url: &str) -> Result<SqlitePool, SetupError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(SetupError::Connect)?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .map_err(SetupError::Connect)
}

/// Migrated single-connection in-memory database
///
/// In-memory SQLite databases are per connection, so the pool is capped at one.
pub async fn memory_pool() -> Result<SqlitePool, SetupError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(SetupError::Connect)?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}
