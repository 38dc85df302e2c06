//! Saved article queries

use super::{Article, Database, NewArticle};
use crate::Result;

const ARTICLE_COLUMNS: &str = "id, title, summary, url, tags, user_id, created_at";

impl Database {
    /// Persist an article owned by `user_id`
    pub async fn save_article(&self, user_id: i64, article: &NewArticle) -> Result<Article> {
        let sql = format!(
            "INSERT INTO articles (title, summary, url, tags, user_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            ARTICLE_COLUMNS
        );

        let saved = sqlx::query_as::<_, Article>(&sql)
            .bind(&article.title)
            .bind(&article.summary)
            .bind(&article.url)
            .bind(&article.tags)
            .bind(user_id)
            .bind(crate::time::now())
            .fetch_one(self.pool())
            .await?;

        Ok(saved)
    }

    /// Most recent articles owned by `user_id`, newest first
    pub async fn recent_articles(&self, user_id: i64, limit: i64) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT {} FROM articles WHERE user_id = ? ORDER BY id DESC LIMIT ?",
            ARTICLE_COLUMNS
        );

        let articles = sqlx::query_as::<_, Article>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(self.pool())
            .await?;

        Ok(articles)
    }

    /// Replace the tags of an article if `user_id` owns it
    ///
    /// Returns false when the article is missing or belongs to someone else.
    pub async fn update_tags(&self, article_id: i64, user_id: i64, tags: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE articles SET tags = ? WHERE id = ? AND user_id = ?")
            .bind(tags)
            .bind(article_id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
