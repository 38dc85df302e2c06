//! Reference article lookup

use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::services::ReferenceArticle;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub keyword: String,
}

/// `article` is null when nothing matched
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub article: Option<ReferenceArticle>,
}

/// POST /search
pub async fn search(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> ApiResult<Json<SearchResponse>> {
    let keyword = form.keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::BadRequest("keyword must not be empty".to_string()));
    }

    let article = state.reference.lookup(keyword).await?;
    debug!(keyword = %keyword, found = article.is_some(), "Reference lookup");

    Ok(Json(SearchResponse { article }))
}
