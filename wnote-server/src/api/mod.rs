//! HTTP API handlers for wnote-server

pub mod articles;
pub mod auth;
pub mod health;
pub mod notify;
pub mod search;
pub mod session;

pub use articles::{save_article, saved_articles, update_tags};
pub use auth::{require_session, SESSION_COOKIE};
pub use health::health_routes;
pub use notify::updates_socket;
pub use search::search;
pub use session::login;
