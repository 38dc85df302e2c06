//! Database models and queries
//!
//! SQLite via sqlx. Two tables: `users` and `articles`.

pub mod articles;
pub mod init;
pub mod models;
pub mod users;

pub use init::*;
pub use models::*;

use sqlx::SqlitePool;

/// Handle to the WNOTE database
///
/// Cheap to clone; wraps a connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
