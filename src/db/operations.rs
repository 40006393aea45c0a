use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db::models::User;
use crate::errors::FlowResult;

/// Operations for User model
pub struct UserOps;

impl UserOps {
    /// First user by primary key, if any
    pub async fn first(pool: &SqlitePool) -> FlowResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM auth_user ORDER BY id LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                error!("Database error reading first user: {}", e);
                e
            })?;

        Ok(user)
    }

    /// Create a new user
    pub async fn create(pool: &SqlitePool, username: &str, email: &str) -> FlowResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO auth_user (username, email, first_name, last_name, is_active, date_joined)
            VALUES (?, ?, '', '', ?, ?)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(true)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| {
            error!("Database error creating user: {}", e);
            e
        })?;

        info!("Created new user: {}", user.username);
        Ok(user)
    }

    /// Number of stored users
    pub async fn count(pool: &SqlitePool) -> FlowResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM auth_user")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
