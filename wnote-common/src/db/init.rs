//! Database initialization
//!
//! Opens the pool and creates the schema if needed. Table creation is
//! idempotent, so this is safe on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use super::Database;

/// Connect to `database_url` and create tables if needed
///
/// `sqlite::memory:` URLs get a single, never-recycled connection so that the
/// schema and data live as long as the pool.
pub async fn init_database(database_url: &str) -> Result<Database> {
    let in_memory = database_url.contains(":memory:");

    let options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(10)
    };

    let pool = options.connect(database_url).await?;

    if !in_memory {
        // WAL allows concurrent readers with one writer
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout = 5000")
            .execute(&pool)
            .await?;
    }

    create_users_table(&pool).await?;
    create_articles_table(&pool).await?;

    info!("Database ready: {}", redact_url(database_url));

    Ok(Database::from_pool(pool))
}

/// In-memory database with the full schema
pub async fn init_memory_database() -> Result<Database> {
    init_database("sqlite::memory:").await
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_articles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            summary TEXT NOT NULL,
            url TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '',
            user_id INTEGER NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_user ON articles(user_id, id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Strip query parameters (may carry credentials) before logging
fn redact_url(database_url: &str) -> &str {
    database_url.split('?').next().unwrap_or(database_url)
}
