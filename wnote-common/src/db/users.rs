//! Account queries

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Database, User};
use crate::auth::{hash_password, verify_password, UserDirectory};
use crate::{Error, Result};

impl Database {
    /// Create an account with an Argon2id-hashed password
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidInput("Username must not be empty".to_string()));
        }

        let password_hash = hash_password(password).await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES (?, ?) RETURNING id, username, password_hash",
        )
        .bind(username)
        .bind(&password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Error::InvalidInput(format!("Username already exists: {}", username))
            }
            other => Error::Database(other),
        })?;

        info!(username = %user.username, "Created user");
        Ok(user)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    /// Check a username/password pair
    ///
    /// Returns `None` for an unknown user or a wrong password alike.
    pub async fn check_login(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_user(username).await? else {
            return Ok(None);
        };

        match verify_password(password, &user.password_hash).await {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(e) => {
                warn!(username = %username, "Stored password hash unusable: {}", e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl UserDirectory for Database {
    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        Database::find_user(self, username).await
    }
}
