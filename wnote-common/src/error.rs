//! Errors shared by the wnote crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Query or connection failure from sqlx
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unreadable config file or an invalid setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected caller input: empty password, duplicate username
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Password hashing failures and unusable stored hashes
    #[error("Internal error: {0}")]
    Internal(String),
}
