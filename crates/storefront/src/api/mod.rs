//! Commerce backend API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth - no local persistence, direct REST
//!   calls with JSON bodies
//! - Every request carries the current bearer token; a 401 triggers exactly
//!   one refresh-and-retry, shared across concurrent failures
//! - Catalog reads are cached in-memory via `moka` (5 minute TTL); cart and
//!   checkout state are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use driftmarket_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api, credentials)?;
//!
//! // Fetch the cart
//! let cart = client.fetch_cart().await?;
//!
//! // Browse the catalog (cached)
//! let page = client.products(&ProductQuery::default()).await?;
//! ```

mod account;
pub mod auth;
mod cache;
mod cart;
mod catalog;
mod checkout;
pub mod types;

pub use catalog::ProductQuery;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;
use crate::credentials::CredentialStore;

use cache::CacheValue;

/// Catalog cache time-to-live.
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Catalog cache capacity (entries).
const CACHE_CAPACITY: u64 = 1000;

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credential and refresh could not recover.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON (de)serialization failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint path did not join onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether this error indicates something broken (worth reporting)
    /// rather than a normal user-facing condition.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Unauthorized(_) | Self::NotFound(_) | Self::RateLimited(_) => false,
        }
    }

    /// Whether this error is a uniqueness conflict (e.g., email already
    /// registered). The backend reports these as 409, or as 400 with an
    /// "already exists" detail.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Api { status: 409, .. } => true,
            Self::Api {
                status: 400,
                message,
            } => {
                let lower = message.to_lowercase();
                lower.contains("exist") || lower.contains("already")
            }
            _ => false,
        }
    }
}

/// Client for the commerce backend REST API.
///
/// Cheaply cloneable; all clones share the HTTP connection pool, the
/// credential store, and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    credentials: CredentialStore,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig, credentials: CredentialStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                credentials,
                cache,
            }),
        })
    }

    /// The credential store this client attaches tokens from.
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub(crate) fn cache(&self) -> &Cache<String, CacheValue> {
        &self.inner.cache
    }

    /// Join an endpoint path onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    // =========================================================================
    // Request pipeline
    // =========================================================================

    /// Send a request through the authenticated pipeline.
    ///
    /// Attaches the current bearer token, and on a 401 for a request that has
    /// not already been retried runs a single refresh exchange (shared with
    /// any other request that hit a 401 concurrently) before re-issuing the
    /// request once. A request that fails again after its retry propagates
    /// the failure; there is never a second cycle.
    pub(crate) async fn dispatch(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut retried = false;

        loop {
            // Observed before send so the refresh path can tell whether the
            // credential that produced the 401 is still the current one.
            let generation = self.inner.credentials.generation();

            let mut request = self.inner.http.request(method.clone(), url.clone());
            if let Some(access) = self.inner.credentials.access_token().await {
                request = request.bearer_auth(access.reveal());
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED
                && !retried
                && self.try_refresh(generation).await
            {
                retried = true;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(1);
                return Err(ApiError::RateLimited(retry_after));
            }

            if !status.is_success() {
                return Err(Self::error_from_response(status, response).await);
            }

            return Ok(response);
        }
    }

    /// Run the deduplicated refresh exchange.
    ///
    /// Returns `true` when a credential is available to retry with - either
    /// because this task refreshed, or because another task already did
    /// while this one waited at the gate.
    async fn try_refresh(&self, observed_generation: u64) -> bool {
        let credentials = &self.inner.credentials;
        let _gate = credentials.refresh_gate().lock().await;

        if credentials.generation() != observed_generation {
            // Someone else rotated the credential while we waited; retry
            // with whatever is stored now (false if they logged out).
            return credentials.is_authenticated().await;
        }

        let Some(refresh) = credentials.refresh_token().await else {
            return false;
        };

        match auth::refresh_access_token(&self.inner.http, &self.inner.base_url, &refresh).await {
            Ok(access) => {
                credentials.store_access(access).await;
                true
            }
            Err(error) => {
                tracing::warn!(%error, "Token refresh failed");
                false
            }
        }
    }

    /// Convert a non-success response into an `ApiError`, pulling the
    /// backend's `detail`/`message` field out of the body when present.
    async fn error_from_response(status: StatusCode, response: reqwest::Response) -> ApiError {
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| body.chars().take(200).collect::<String>());

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    /// GET `path` and decode the JSON response.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        self.get_json_at(url).await
    }

    /// GET a fully-built URL (for endpoints with query parameters).
    pub(crate) async fn get_json_at<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.dispatch(Method::GET, url, None).await?;
        Self::decode(response).await
    }

    /// Send `body` with `method` and decode the JSON response.
    pub(crate) async fn request_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let body = serde_json::to_value(body)?;
        let response = self.dispatch(method, url, Some(body)).await?;
        Self::decode(response).await
    }

    /// Send `body` with `method`, discarding any response body.
    pub(crate) async fn request_empty<B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let url = self.url(path)?;
        let body = body.map(serde_json::to_value).transpose()?;
        self.dispatch(method, url, body).await?;
        Ok(())
    }

    /// Decode a response body, logging a truncated copy on parse failure.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }
}

/// Pull a human-readable message out of a backend error body.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["detail", "message"] {
        if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
            return Some(message.to_string());
        }
    }
    None
}
