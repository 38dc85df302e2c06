//! wnote-server library - article notes with live save notifications
//!
//! Users log in, look up reference articles, save them with suggested tags,
//! and every client connected to `/ws/updates` hears about each save.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;
use wnote_common::auth::CredentialAuthority;
use wnote_common::db::Database;

pub mod api;
pub mod error;
pub mod notify;
pub mod services;

use notify::ConnectionRegistry;
use services::{ReferenceLookup, TagSuggester};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Issues and verifies session credentials
    pub credentials: Arc<CredentialAuthority>,
    /// Open notification connections
    pub registry: Arc<ConnectionRegistry>,
    pub reference: Arc<dyn ReferenceLookup>,
    pub tagger: Arc<dyn TagSuggester>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: Database,
        credentials: CredentialAuthority,
        registry: Arc<ConnectionRegistry>,
        reference: Arc<dyn ReferenceLookup>,
        tagger: Arc<dyn TagSuggester>,
    ) -> Self {
        Self {
            db,
            credentials: Arc::new(credentials),
            registry,
            reference,
            tagger,
        }
    }
}

/// Build application router
///
/// `/save`, `/saved` and `/update-tags` require a session. Login, search,
/// health and the notification socket are public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/save", post(api::save_article))
        .route("/saved", get(api::saved_articles))
        .route("/update-tags", post(api::update_tags))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_session,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/login", post(api::login))
        .route("/search", post(api::search))
        .route("/ws/updates", get(api::updates_socket))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
