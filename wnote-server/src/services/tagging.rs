//! Topic tag suggestion
//!
//! [`GeminiTagger`] asks a text-generation model for 3-5 comma-separated
//! tags. [`KeywordTagger`] derives tags locally from word frequency and is
//! used when no API key is configured. [`FallbackTagger`] tries a model
//! first and falls back to keywords when the call fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_MODEL: &str = "gemini-1.5-flash";
const TEMPERATURE: f32 = 0.3;
const MAX_TAGS: usize = 5;

const STOPWORDS: &[&str] = &[
    "about", "after", "also", "among", "because", "been", "before", "being", "between",
    "could", "during", "first", "their", "there", "these", "those", "which", "while", "where",
    "would", "other", "since", "under", "until", "known", "often", "including", "through",
];

/// Tag suggestion errors
#[derive(Debug, Error)]
pub enum TagError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Model returned no tags")]
    Empty,
}

/// Suggests topic tags for an article summary
#[async_trait]
pub trait TagSuggester: Send + Sync {
    /// Comma-separated tags, e.g. `"computing, awards, history"`
    async fn suggest_tags(&self, summary: &str) -> Result<String, TagError>;
}

/// Normalize a raw comma-separated list: trimmed, de-duplicated, at most five
pub fn normalize_tags(raw: &str) -> String {
    let mut seen = Vec::new();
    for tag in raw.split([',', '\n']) {
        let tag = tag
            .trim()
            .trim_matches(|c: char| c == '"' || c == '*' || c == '-' || c == '.')
            .trim();
        if tag.is_empty() || seen.iter().any(|t: &String| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        seen.push(tag.to_string());
        if seen.len() == MAX_TAGS {
            break;
        }
    }
    seen.join(", ")
}

fn tag_prompt(summary: &str) -> String {
    format!(
        "You are a content classifier.\n\
         Given the following article, generate 3-5 concise topic tags as a comma-separated list:\n\n\
         {}\n\nTags:",
        summary
    )
}

/// Local frequency-based tagger
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordTagger;

impl KeywordTagger {
    /// Most frequent words of five letters or more, ties by first appearance
    pub fn tags_for(&self, summary: &str) -> String {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

        for (position, word) in summary
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 5)
            .map(str::to_lowercase)
            .filter(|w| !STOPWORDS.contains(&w.as_str()))
            .enumerate()
        {
            counts.entry(word).or_insert((0, position)).0 += 1;
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

        ranked
            .into_iter()
            .take(MAX_TAGS)
            .map(|(word, _)| word)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[async_trait]
impl TagSuggester for KeywordTagger {
    async fn suggest_tags(&self, summary: &str) -> Result<String, TagError> {
        Ok(self.tags_for(summary))
    }
}

/// Tries `primary`, falls back to [`KeywordTagger`] on any error
pub struct FallbackTagger {
    primary: Box<dyn TagSuggester>,
}

impl FallbackTagger {
    pub fn new(primary: impl TagSuggester + 'static) -> Self {
        Self {
            primary: Box::new(primary),
        }
    }
}

#[async_trait]
impl TagSuggester for FallbackTagger {
    async fn suggest_tags(&self, summary: &str) -> Result<String, TagError> {
        match self.primary.suggest_tags(summary).await {
            Ok(tags) => Ok(tags),
            Err(e) => {
                tracing::warn!("Tag generation failed, using keyword tags: {}", e);
                KeywordTagger.suggest_tags(summary).await
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|p| p.text.as_str())
    }
}

/// Gemini `generateContent` client
pub struct GeminiTagger {
    http_client: reqwest::Client,
    api_key: String,
}

impl GeminiTagger {
    pub fn new(api_key: impl Into<String>) -> Result<Self, TagError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| TagError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl TagSuggester for GeminiTagger {
    async fn suggest_tags(&self, summary: &str) -> Result<String, TagError> {
        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, GEMINI_MODEL);
        let prompt = tag_prompt(summary);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| TagError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TagError::ApiError(status.as_u16(), error_text));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TagError::ParseError(e.to_string()))?;

        let tags = normalize_tags(generated.first_text().unwrap_or_default());
        if tags.is_empty() {
            return Err(TagError::Empty);
        }

        tracing::debug!(tags = %tags, "Generated tags");
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        assert_eq!(
            normalize_tags("  Computing , awards,computing, \"History\"\n"),
            "Computing, awards, History"
        );
        assert_eq!(normalize_tags("a, b, c, d, e, f, g"), "a, b, c, d, e");
        assert_eq!(normalize_tags(" , ,"), "");
    }

    #[test]
    fn test_prompt_embeds_summary() {
        let prompt = tag_prompt("Alan Turing was a mathematician.");
        assert!(prompt.contains("3-5 concise topic tags"));
        assert!(prompt.contains("Alan Turing was a mathematician."));
        assert!(prompt.ends_with("Tags:"));
    }

    #[test]
    fn test_keyword_tagger_ranks_by_frequency() {
        let summary = "The Turing Award is an annual computing prize. \
                       The award honours computing contributions; the Turing \
                       Award is given by the ACM. Computing pioneers which receive it.";

        let tags = KeywordTagger.tags_for(summary);
        let tags: Vec<&str> = tags.split(", ").collect();

        assert_eq!(tags[0], "award");
        assert_eq!(tags[1], "computing");
        assert_eq!(tags[2], "turing");
        assert!(tags.len() <= MAX_TAGS);
        assert!(!tags.contains(&"which"));
    }

    #[test]
    fn test_keyword_tagger_empty_summary() {
        assert_eq!(KeywordTagger.tags_for(""), "");
        assert_eq!(KeywordTagger.tags_for("a an the of"), "");
    }

    #[test]
    fn test_generate_response_first_text() {
        let json = r#"{
            "candidates": [
                { "content": { "parts": [ { "text": "computing, awards, history" } ], "role": "model" } }
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_text(), Some("computing, awards, history"));

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.first_text(), None);
    }

    struct FailingTagger;

    #[async_trait]
    impl TagSuggester for FailingTagger {
        async fn suggest_tags(&self, _summary: &str) -> Result<String, TagError> {
            Err(TagError::ApiError(503, "overloaded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fallback_tagger_uses_keywords_on_error() {
        let tagger = FallbackTagger::new(FailingTagger);
        let tags = tagger
            .suggest_tags("Cryptography cryptography protocols")
            .await
            .unwrap();
        assert_eq!(tags, "cryptography, protocols");
    }

    #[tokio::test]
    async fn test_keyword_tagger_as_suggester() {
        let tagger: &dyn TagSuggester = &KeywordTagger;
        let tags = tagger
            .suggest_tags("Lambda calculus lambda abstraction")
            .await
            .unwrap();
        assert_eq!(tags, "lambda, calculus, abstraction");
    }
}
