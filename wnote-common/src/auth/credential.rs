//! Signed, time-bounded session credentials
//!
//! A credential is an HS256 JWT with three claims:
//! - `sub`: the username it asserts
//! - `iat`: issuance time (Unix seconds)
//! - `exp`: `iat` + 60 minutes (Unix seconds)
//!
//! `exp` is compared against the authority's [`Clock`] rather than the
//! library's own wall-clock check, with zero leeway.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{AuthError, CredentialFault, UserDirectory};
use crate::db::models::User;
use crate::time::{Clock, SystemClock};

/// Fixed credential lifetime
pub const CREDENTIAL_LIFETIME_MINUTES: i64 = 60;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Identifier (username) asserted by a credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    pub fn new(subject: impl Into<String>) -> Self {
        Self(subject.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for Subject {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    iat: i64,
    exp: i64,
}

/// An issued credential
#[derive(Debug, Clone, Serialize)]
pub struct Credential {
    /// Opaque bearer token
    pub token: String,
    pub subject: Subject,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies credentials with the process-wide secret
pub struct CredentialAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
}

impl CredentialAuthority {
    /// Create an authority backed by the system clock
    pub fn new(secret: &[u8]) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against `clock` in `verify`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
            lifetime: Duration::minutes(CREDENTIAL_LIFETIME_MINUTES),
        }
    }

    /// Issue a credential for an already-authenticated subject
    pub fn issue(&self, subject: &str) -> Result<Credential, AuthError> {
        let issued_at = self.clock.now();
        let expires_at = issued_at + self.lifetime;

        let claims = Claims {
            sub: Some(subject.to_string()),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        debug!(subject = %subject, expires_at = %expires_at, "Issued credential");

        Ok(Credential {
            token,
            subject: Subject::new(subject),
            issued_at,
            expires_at,
        })
    }

    /// Check signature, claims and expiry; return the asserted subject
    ///
    /// Does not consult the user directory, see [`Self::authenticate`].
    pub fn verify(&self, token: &str) -> Result<Subject, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidCredential(CredentialFault::Missing));
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidCredential(classify(e.kind())))?;
        let claims = data.claims;

        let subject = claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(AuthError::InvalidCredential(CredentialFault::MissingSubject))?;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(AuthError::InvalidCredential(CredentialFault::Expired));
        }

        Ok(Subject::new(subject))
    }

    /// Verify the token and resolve its subject to an existing account
    pub async fn authenticate<D>(&self, token: &str, directory: &D) -> Result<User, AuthError>
    where
        D: UserDirectory + ?Sized,
    {
        let subject = self.verify(token)?;

        match directory.find_user(subject.as_str()).await? {
            Some(user) => Ok(user),
            None => Err(AuthError::UnknownSubject(subject.into_inner())),
        }
    }
}

fn classify(kind: &ErrorKind) -> CredentialFault {
    match kind {
        ErrorKind::InvalidSignature => CredentialFault::BadSignature,
        ErrorKind::ExpiredSignature => CredentialFault::Expired,
        _ => CredentialFault::Malformed,
    }
}
