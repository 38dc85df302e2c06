//! Session identity: credential issuance/verification and password hashing
//!
//! # Architecture
//!
//! - Credentials are HS256-signed JWTs carrying `sub`, `iat` and `exp`
//! - Lifetime is fixed at 60 minutes from issuance; there is no revocation
//! - Expiry is checked against an injected [`Clock`](crate::time::Clock)
//! - The subject is resolved through a [`UserDirectory`] on every privileged call
//!
//! Both [`AuthError::InvalidCredential`] and [`AuthError::UnknownSubject`] must
//! surface to HTTP callers as the same unauthenticated response. They are
//! kept apart here so logs can tell them apart.
//!
//! This module has no HTTP framework dependencies. Token extraction from
//! requests lives in the server crate.

pub mod credential;
pub mod password;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::User;

pub use credential::{Credential, CredentialAuthority, Subject, CREDENTIAL_LIFETIME_MINUTES};
pub use password::{hash_password, verify_password};

/// Why a presented credential was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialFault {
    #[error("no credential presented")]
    Missing,
    #[error("credential is malformed")]
    Malformed,
    #[error("signature does not verify")]
    BadSignature,
    #[error("subject claim is absent")]
    MissingSubject,
    #[error("credential has expired")]
    Expired,
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    /// Signature, structure or expiry check failed
    #[error("Invalid credential: {0}")]
    InvalidCredential(CredentialFault),

    /// Credential verified but its subject has no account
    #[error("Unknown subject: {0}")]
    UnknownSubject(String),

    /// Token could not be signed
    #[error("Credential signing failed: {0}")]
    Signing(String),

    /// User lookup failed for reasons unrelated to the credential
    #[error("User directory error: {0}")]
    Directory(#[from] crate::Error),
}

impl AuthError {
    /// True for the failures that map to an unauthenticated response
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredential(_) | AuthError::UnknownSubject(_)
        )
    }
}

/// User-record lookup consumed by credential verification
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, username: &str) -> crate::Result<Option<User>>;
}
