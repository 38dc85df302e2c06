//! Saved article endpoints
//!
//! All three require a session; the middleware puts the [`User`] in the
//! request extensions.

use axum::{extract::State, http::StatusCode, Extension, Form, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wnote_common::db::{Article, NewArticle, User};

use crate::error::{ApiError, ApiResult};
use crate::notify::EventMessage;
use crate::AppState;

/// Articles returned by `GET /saved`
pub const RECENT_LIMIT: i64 = 4;

#[derive(Debug, Deserialize)]
pub struct SaveForm {
    pub title: String,
    pub summary: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagsForm {
    pub article_id: i64,
    pub tags: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateTagsResponse {
    pub updated: bool,
}

/// POST /save
///
/// Tags the summary, stores the article, then announces it to every
/// notification client.
pub async fn save_article(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Form(form): Form<SaveForm>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    // Tagging is best effort; the article is saved either way
    let tags = match state.tagger.suggest_tags(&form.summary).await {
        Ok(tags) => tags,
        Err(e) => {
            warn!("Tag suggestion failed for '{}': {}", title, e);
            String::new()
        }
    };

    let article = state
        .db
        .save_article(
            user.id,
            &NewArticle {
                title: title.to_string(),
                summary: form.summary,
                url: form.url,
                tags,
            },
        )
        .await?;
    info!(article_id = article.id, subject = %user.username, "Article saved");

    let report = state
        .registry
        .broadcast(EventMessage::article_saved(&article.title))
        .await;
    if !report.failures.is_empty() {
        warn!(
            "{} of {} notification clients missed the save of article {}",
            report.failures.len(),
            report.attempted,
            article.id
        );
    }

    Ok((StatusCode::CREATED, Json(article)))
}

/// GET /saved
///
/// The caller's most recent articles, newest first.
pub async fn saved_articles(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Json<Vec<Article>>> {
    let articles = state.db.recent_articles(user.id, RECENT_LIMIT).await?;
    Ok(Json(articles))
}

/// POST /update-tags
///
/// `updated` is false when the article does not exist or belongs to
/// someone else.
pub async fn update_tags(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Form(form): Form<UpdateTagsForm>,
) -> ApiResult<Json<UpdateTagsResponse>> {
    let updated = state
        .db
        .update_tags(form.article_id, user.id, form.tags.trim())
        .await?;
    if !updated {
        info!(
            article_id = form.article_id,
            subject = %user.username,
            "Tag update matched no article"
        );
    }
    Ok(Json(UpdateTagsResponse { updated }))
}
