//! Remote stats API client
//!
//! [`StatsApi`] is the contract the adapter consumes; [`IRacingClient`]
//! implements it against the iRacing data API.
//!
//! ## Request flow
//!
//! 1. `POST {base}/auth` with the username and the encoded password. The
//!    session cookie is kept by the client's cookie store.
//! 2. `GET {base}/data/...`. Data endpoints answer with `{"link": ...}`
//!    pointing at the actual payload, which is fetched with a second `GET`.
//!
//! Every request is bounded by the client timeout. Nothing is retried.

use base64::Engine;
use reqwest::StatusCode;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::time::Duration;

use super::RemoteError;
use crate::credentials::Credentials;

/// Production API host
pub const DEFAULT_BASE_URL: &str = "https://members-ng.iracing.com";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote stats collaborator
pub trait StatsApi {
    /// Recent races of a driver, shaped `{"races": [...]}`
    fn fetch_recent_races(
        &self,
        credentials: &Credentials,
        driver_id: u64,
    ) -> impl Future<Output = Result<Value, RemoteError>> + Send;

    /// Upcoming scheduled sessions, shaped `{"sessions": [...]}`
    fn fetch_upcoming_sessions(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Value, RemoteError>> + Send;
}

/// HTTP client for the iRacing data API
pub struct IRacingClient {
    client: reqwest::Client,
    base_url: String,
}

impl IRacingClient {
    /// Client for `base_url` with the given per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("RaceLedger/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        IRacingClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Service root, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<(), RemoteError> {
        let body = json!({
            "email": credentials.username,
            "password": encode_password(&credentials.username, credentials.password()),
        });

        let response = self
            .client
            .post(format!("{}/auth", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response.status())?;

        let payload: Value = response.json().await.map_err(transport_error)?;

        // Rejected logins still answer 200, with authcode 0
        if payload.get("authcode").and_then(Value::as_i64) == Some(0) {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("credentials rejected");
            return Err(RemoteError::Auth(message.to_string()));
        }

        tracing::debug!("Authenticated with {}", self.base_url);
        Ok(())
    }

    /// GET a data endpoint and follow its `link` indirection
    async fn get_data(&self, path: &str, query: &[(&str, String)]) -> Result<Value, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        let payload = self.get_json(&url, query).await?;

        match payload.get("link").and_then(Value::as_str) {
            Some(link) => self.get_json(link, &[]).await,
            None => Ok(payload),
        }
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, RemoteError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response.status())?;

        response.json().await.map_err(transport_error)
    }
}

impl Default for IRacingClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }
}

impl StatsApi for IRacingClient {
    async fn fetch_recent_races(
        &self,
        credentials: &Credentials,
        driver_id: u64,
    ) -> Result<Value, RemoteError> {
        self.authenticate(credentials).await?;
        self.get_data(
            "/data/stats/member_recent_races",
            &[("cust_id", driver_id.to_string())],
        )
        .await
    }

    async fn fetch_upcoming_sessions(&self, credentials: &Credentials) -> Result<Value, RemoteError> {
        self.authenticate(credentials).await?;
        self.get_data("/data/season/race_guide", &[]).await
    }
}

/// `base64(sha256(password + lowercase(username)))`, as the auth endpoint expects
pub fn encode_password(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(username.to_lowercase().as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// Map an HTTP status onto the error taxonomy
pub fn check_status(status: StatusCode) -> Result<(), RemoteError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(RemoteError::Auth(format!("server answered {}", status)))
    } else {
        Err(RemoteError::Transient(format!("server answered {}", status)))
    }
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Transient("request timed out".to_string())
    } else if e.is_decode() {
        RemoteError::Transient(format!("unreadable response: {}", e))
    } else {
        RemoteError::Transient(e.to_string())
    }
}
