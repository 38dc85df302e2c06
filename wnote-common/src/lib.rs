//! # WNOTE Common Library
//!
//! Shared code for the WNOTE service crates:
//! - Session credentials (issue/verify) and password hashing
//! - Database models and queries (users, saved articles)
//! - Configuration loading
//! - Clock abstraction used for credential expiry

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
