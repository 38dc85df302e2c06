//! Security tests for wnote-server
//!
//! Tests security-critical features:
//! - Forged, tampered and unsigned credentials are rejected
//! - Failed logins do not reveal whether the account exists
//! - Password hashes never leave the server
//! - Request bodies are capped at MAX_BODY_BYTES

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::util::ServiceExt;
use wnote_common::auth::CredentialAuthority;
use wnote_common::db::init_memory_database;
use wnote_server::notify::ConnectionRegistry;
use wnote_server::services::{KeywordTagger, LookupError, ReferenceArticle, ReferenceLookup};
use wnote_server::{build_router, AppState, MAX_BODY_BYTES};

const SECRET: &[u8] = b"security-test-secret";

struct NoReference;

#[async_trait]
impl ReferenceLookup for NoReference {
    async fn lookup(&self, _keyword: &str) -> Result<Option<ReferenceArticle>, LookupError> {
        Ok(None)
    }
}

async fn setup_app() -> Router {
    let db = init_memory_database().await.unwrap();
    db.create_user("alice", "wonderland").await.unwrap();

    let state = AppState::new(
        db,
        CredentialAuthority::new(SECRET),
        Arc::new(ConnectionRegistry::default()),
        Arc::new(NoReference),
        Arc::new(KeywordTagger),
    );
    build_router(state)
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password={}", username, password)))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn saved_status(app: &Router, token: &str) -> StatusCode {
    let request = Request::builder()
        .uri("/saved")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let app = setup_app().await;
    let forged = CredentialAuthority::new(b"attacker-secret")
        .issue("alice")
        .unwrap()
        .token;

    assert_eq!(saved_status(&app, &forged).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let app = setup_app().await;
    let (_, body) = login(&app, "alice", "wonderland").await;
    let token = body["token"].as_str().unwrap();
    assert_eq!(saved_status(&app, token).await, StatusCode::OK);

    // Swap in the payload of a token for someone else
    let other = CredentialAuthority::new(b"attacker-secret")
        .issue("mallory")
        .unwrap()
        .token;
    let parts: Vec<&str> = token.split('.').collect();
    let other_parts: Vec<&str> = other.split('.').collect();
    let spliced = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

    assert_eq!(saved_status(&app, &spliced).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unsigned_token_rejected() {
    let app = setup_app().await;

    // {"alg":"none","typ":"JWT"} . {"sub":"alice","iat":0,"exp":9999999999} .
    let unsigned = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                    eyJzdWIiOiJhbGljZSIsImlhdCI6MCwiZXhwIjo5OTk5OTk5OTk5fQ.";

    assert_eq!(saved_status(&app, unsigned).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_failed_login_does_not_reveal_account_existence() {
    let app = setup_app().await;

    let (wrong_password_status, wrong_password) = login(&app, "alice", "guess").await;
    let (no_account_status, no_account) = login(&app, "nobody", "guess").await;

    assert_eq!(wrong_password_status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_account_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, no_account);
}

#[tokio::test]
async fn test_login_response_has_no_password_hash() {
    let app = setup_app().await;

    let (status, body) = login(&app, "alice", "wonderland").await;

    assert_eq!(status, StatusCode::OK);
    let text = body.to_string();
    assert!(!text.contains("argon2"));
    assert!(!text.contains("wonderland"));
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let app = setup_app().await;
    let (_, body) = login(&app, "alice", "wonderland").await;
    let token = body["token"].as_str().unwrap();

    let summary = "a".repeat(MAX_BODY_BYTES + 1);
    let request = Request::builder()
        .method("POST")
        .uri("/save")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(format!(
            "title=Big&url=https%3A%2F%2Fexample.org&summary={}",
            summary
        )))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
