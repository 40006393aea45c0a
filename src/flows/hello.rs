//! Greets the first registered user.

use sqlx::SqlitePool;

use crate::db::UserOps;
use crate::errors::{FlowError, FlowResult};
use crate::setup;
use crate::workflow::{self, Flow};

pub const FLOW_NAME: &str = "test-flow";

/// Build the greeting for the first user in the store
///
/// An empty store is reported as a missing `username` attribute rather
/// than skipped, so callers see the same failure the record access causes.
pub async fn greeting(pool: &SqlitePool) -> FlowResult<String> {
    let user = UserOps::first(pool).await?;
    let username = user
        .map(|u| u.username)
        .ok_or(FlowError::MissingRecord {
            model: "User",
            field: "username",
        })?;
    Ok(format!("Hello! {}", username))
}

/// The workflow, reading from the process context installed by `setup`
pub fn flow() -> Flow {
    workflow::flow(FLOW_NAME, || async {
        let context = setup::context()?;
        println!("{}", greeting(&context.pool).await?);
        Ok(())
    })
}

/// The workflow bound to a specific pool instead of the process context
pub fn flow_with_pool(pool: SqlitePool) -> Flow {
    workflow::flow(FLOW_NAME, move || {
        let pool = pool.clone();
        async move {
            println!("{}", greeting(&pool).await?);
            Ok(())
        }
    })
}
