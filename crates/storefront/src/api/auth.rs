//! Authentication endpoints.
//!
//! These are free functions over the bare HTTP client rather than methods on
//! [`super::ApiClient`]: they run outside the authenticated pipeline (no
//! bearer header, no refresh-on-401), both because they are anonymous and
//! because the refresh exchange itself must never recurse into refresh.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use driftmarket_core::{AccessToken, RefreshToken};

use super::ApiError;
use super::types::AuthUser;

/// Request body for `POST /auth/login/`.
#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Response from `POST /auth/login/`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: AccessToken,
    pub refresh: RefreshToken,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// Request body for `POST /auth/register/`.
#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

/// Response from `POST /auth/register/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub user: AuthUser,
    #[serde(default)]
    pub verify_token: Option<String>,
}

/// Request body for `POST /token/refresh/`.
#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Response from `POST /token/refresh/`.
#[derive(Deserialize)]
struct RefreshResponse {
    access: AccessToken,
}

/// Error body shape shared by the auth endpoints.
#[derive(Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Log in with email and password.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` on invalid credentials.
#[instrument(skip(http, password), fields(email = %email))]
pub async fn login(
    http: &reqwest::Client,
    base_url: &Url,
    email: &str,
    password: &SecretString,
) -> Result<LoginResponse, ApiError> {
    let url = base_url.join("auth/login/")?;

    let response = http
        .post(url)
        .json(&LoginRequest {
            email,
            password: password.expose_secret(),
        })
        .send()
        .await?;

    read_auth_response(response).await
}

/// Register a new account.
///
/// # Errors
///
/// Returns a conflict `ApiError` when the email is already registered
/// (check with [`ApiError::is_conflict`]).
#[instrument(skip(http, password), fields(email = %email))]
pub async fn register(
    http: &reqwest::Client,
    base_url: &Url,
    email: &str,
    password: &SecretString,
    first_name: &str,
    last_name: &str,
) -> Result<RegisterResponse, ApiError> {
    let url = base_url.join("auth/register/")?;

    let response = http
        .post(url)
        .json(&RegisterRequest {
            email,
            password: password.expose_secret(),
            first_name,
            last_name,
        })
        .send()
        .await?;

    read_auth_response(response).await
}

/// Exchange a refresh token for a new access token.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` when the refresh token is expired or
/// revoked.
#[instrument(skip_all)]
pub async fn refresh_access_token(
    http: &reqwest::Client,
    base_url: &Url,
    refresh: &RefreshToken,
) -> Result<AccessToken, ApiError> {
    let url = base_url.join("token/refresh/")?;

    let response = http
        .post(url)
        .json(&RefreshRequest {
            refresh: refresh.reveal(),
        })
        .send()
        .await?;

    let parsed: RefreshResponse = read_auth_response(response).await?;
    Ok(parsed.access)
}

/// Decode an auth endpoint response, mapping error bodies to `ApiError`.
async fn read_auth_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body: AuthErrorBody = response.json().await.unwrap_or(AuthErrorBody {
        detail: None,
        message: None,
    });
    let message = body
        .detail
        .or(body.message)
        .unwrap_or_else(|| "Authentication failed".to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized(message)),
        _ => Err(ApiError::Api {
            status: status.as_u16(),
            message,
        }),
    }
}
