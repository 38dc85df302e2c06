//! Login endpoint

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use wnote_common::auth::CREDENTIAL_LIFETIME_MINUTES;

use super::auth::SESSION_COOKIE;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

/// POST /login
///
/// Issues a 60-minute credential, returned in the body and as an
/// HttpOnly cookie.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Response> {
    let Some(user) = state.db.check_login(&form.username, &form.password).await? else {
        info!(username = %form.username, "Login rejected");
        return Err(ApiError::InvalidLogin);
    };

    let credential = state.credentials.issue(&user.username)?;
    info!(subject = %credential.subject, expires_at = %credential.expires_at, "Login succeeded");

    let cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        credential.token,
        CREDENTIAL_LIFETIME_MINUTES * 60
    );
    let body = LoginResponse {
        subject: credential.subject.to_string(),
        expires_at: credential.expires_at,
        token: credential.token,
    };

    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}
