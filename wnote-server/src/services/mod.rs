//! Clients for the external services used by request handlers
//!
//! - [`reference`]: keyword lookup against Wikipedia
//! - [`tagging`]: topic tag suggestion (Gemini, with a local fallback)

pub mod reference;
pub mod tagging;

pub use reference::{LookupError, ReferenceArticle, ReferenceLookup, WikipediaClient};
pub use tagging::{FallbackTagger, GeminiTagger, KeywordTagger, TagError, TagSuggester};
