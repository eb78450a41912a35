//! Blocking HTTP client for the AI backend.

use std::time::Duration;

use retouch_pipeline::gateway::{AiEditResponse, ChatResponse, ErrorBody};
use retouch_pipeline::{AiEditRequest, AiGateway, ChatRequest, GatewayError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Request timeout used by [`HttpGateway::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// What the backend can do, from `GET /api/capabilities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Tools processed in the client.
    pub client_side: Vec<String>,
    /// Operations that need the AI backend.
    pub ai_powered: Vec<String>,
    /// Local model families the backend knows about.
    pub local_models: Vec<String>,
}

/// Talks to `POST /api/process-ai` and `POST /api/chat` of an AI backend.
pub struct HttpGateway {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpGateway {
    /// Client for the backend at `base_url`, authenticating with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the HTTP client cannot be
    /// built (e.g. no TLS backend).
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, GatewayError> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Like [`new`](Self::new) with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn with_timeout(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self::with_client(base_url, api_key, client, timeout))
    }

    /// Use a caller-built client, e.g. one with proxies disabled.
    ///
    /// `timeout` should be the one the client was built with; it is only
    /// used in error messages.
    #[must_use]
    pub fn with_client(
        base_url: &str,
        api_key: &str,
        client: reqwest::blocking::Client,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            client,
            timeout,
        }
    }

    /// The backend root, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET /api/health`: whether the backend answers at all.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the backend is unreachable
    /// and [`GatewayError::Status`] for a non-success status.
    pub fn health(&self) -> Result<(), GatewayError> {
        let response = self
            .client
            .get(self.url("/api/health"))
            .send()
            .map_err(|e| self.transport_error(&e))?;
        check_status(response).map(|_| ())
    }

    /// `GET /api/capabilities`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`health`](Self::health), plus
    /// [`GatewayError::InvalidResponse`] for an unexpected body.
    pub fn capabilities(&self) -> Result<Capabilities, GatewayError> {
        let response = self
            .client
            .get(self.url("/api/capabilities"))
            .send()
            .map_err(|e| self.transport_error(&e))?;
        parse_json(check_status(response)?)
    }

    fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, GatewayError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .map_err(|e| self.transport_error(&e))?;
        parse_json(check_status(response)?)
    }

    fn transport_error(&self, e: &reqwest::Error) -> GatewayError {
        let message = if e.is_connect() {
            format!("cannot connect to {}", self.base_url)
        } else if e.is_timeout() {
            format!("request timed out after {}s", self.timeout.as_secs())
        } else {
            e.to_string()
        };
        warn!(%message, "AI gateway transport error");
        GatewayError::Transport(message)
    }
}

impl AiGateway for HttpGateway {
    fn process(&self, request: &AiEditRequest) -> Result<String, GatewayError> {
        if self.api_key.is_empty() {
            return Err(GatewayError::MissingCredential);
        }
        let response: AiEditResponse = self.post("/api/process-ai", request)?;
        Ok(response.image)
    }

    fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        let response: ChatResponse = self.post("/api/chat", request)?;
        Ok(response.message)
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let err = status_error(
        status.as_u16(),
        status.canonical_reason().unwrap_or("error"),
        &body,
    );
    warn!(%err, "AI gateway rejected request");
    Err(err)
}

fn parse_json<R: DeserializeOwned>(
    response: reqwest::blocking::Response,
) -> Result<R, GatewayError> {
    response
        .json()
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

/// Map a non-success response to [`GatewayError::Status`], preferring the
/// body's `error` field over the status reason.
#[must_use]
pub fn status_error(status: u16, reason: &str, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| reason.to_string(), |b| b.error);
    GatewayError::Status { status, message }
}
