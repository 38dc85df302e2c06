//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Saved article row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub url: String,
    /// Comma-separated topic tags
    pub tags: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when saving an article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub tags: String,
}
