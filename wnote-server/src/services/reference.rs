//! Wikipedia page summary lookup
//!
//! Uses the REST summary endpoint:
//! `GET https://en.wikipedia.org/api/rest_v1/page/summary/{title}`

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const WIKIPEDIA_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";
const USER_AGENT: &str = "WNOTE/0.1.0 (saved-article notifier)";

/// Reference lookup errors
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// A page found in the reference source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceArticle {
    pub title: String,
    pub summary: String,
    pub url: String,
}

/// Keyword lookup against an external reference source
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// `Ok(None)` when no page exists for the keyword
    async fn lookup(&self, keyword: &str) -> Result<Option<ReferenceArticle>, LookupError>;
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "type")]
    page_type: Option<String>,
    title: String,
    #[serde(default)]
    extract: String,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: PageUrl,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: String,
}

/// Wikipedia REST API client
pub struct WikipediaClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl WikipediaClient {
    pub fn new() -> Result<Self, LookupError> {
        Self::with_base_url(WIKIPEDIA_SUMMARY_URL)
    }

    /// Point the client at another summary endpoint (mirrors, test servers)
    pub fn with_base_url(base_url: &str) -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LookupError::NetworkError(e.to_string()))?;
        let base_url = Url::parse(base_url).map_err(|e| LookupError::ParseError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn page_url(&self, keyword: &str) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::ParseError("base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .push(&keyword.trim().replace(' ', "_"));
        Ok(url)
    }
}

#[async_trait]
impl ReferenceLookup for WikipediaClient {
    async fn lookup(&self, keyword: &str) -> Result<Option<ReferenceArticle>, LookupError> {
        if keyword.trim().is_empty() {
            return Ok(None);
        }

        let url = self.page_url(keyword)?;
        tracing::debug!(keyword = %keyword, url = %url, "Querying Wikipedia");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LookupError::ApiError(status.as_u16(), error_text));
        }

        let summary: SummaryResponse = response
            .json()
            .await
            .map_err(|e| LookupError::ParseError(e.to_string()))?;

        Ok(into_article(summary))
    }
}

fn into_article(summary: SummaryResponse) -> Option<ReferenceArticle> {
    if summary.page_type.as_deref() == Some("no-extract") && summary.extract.is_empty() {
        return None;
    }
    let url = summary.content_urls?.desktop.page;

    Some(ReferenceArticle {
        title: summary.title,
        summary: summary.extract,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_encodes_keyword() {
        let client = WikipediaClient::new().unwrap();

        let url = client.page_url("Turing Award").unwrap();
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/Turing_Award"
        );

        let url = client.page_url("C/C++").unwrap();
        assert!(url.as_str().ends_with("/summary/C%2FC++"));
    }

    #[test]
    fn test_summary_response_mapping() {
        let json = r#"{
            "type": "standard",
            "title": "Turing Award",
            "extract": "The ACM A. M. Turing Award is an annual prize.",
            "content_urls": {
                "desktop": { "page": "https://en.wikipedia.org/wiki/Turing_Award" },
                "mobile": { "page": "https://en.m.wikipedia.org/wiki/Turing_Award" }
            }
        }"#;

        let summary: SummaryResponse = serde_json::from_str(json).unwrap();
        let article = into_article(summary).unwrap();

        assert_eq!(article.title, "Turing Award");
        assert!(article.summary.starts_with("The ACM"));
        assert_eq!(article.url, "https://en.wikipedia.org/wiki/Turing_Award");
    }

    #[test]
    fn test_summary_without_urls_is_absent() {
        let json = r#"{ "title": "Nothing", "extract": "" }"#;
        let summary: SummaryResponse = serde_json::from_str(json).unwrap();
        assert!(into_article(summary).is_none());
    }

    #[tokio::test]
    async fn test_blank_keyword_short_circuits() {
        let client = WikipediaClient::new().unwrap();
        assert_eq!(client.lookup("   ").await.unwrap(), None);
    }
}
