//! HTTP client for the Fivetran REST API.
//!
//! Every endpoint answers with the same envelope, `{"code": ..., "data": ...}`.
//! A response only counts as successful when the HTTP status is 200 *and*
//! the envelope code is `Success`.

pub mod resp;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use self::resp::Envelope;

pub const BASE_URL: &str = "https://api.fivetran.com";

/// Upper bound requested for list endpoints. Only one page is ever fetched.
pub const PAGE_LIMIT: usize = 1000;

const SUCCESS_CODE: &str = "Success";

/// Failure of a single API call.
#[derive(Debug)]
pub enum ApiError {
    /// Connection, timeout or body read failure.
    Transport(reqwest::Error),
    /// Any HTTP status other than 200.
    Status(StatusCode),
    /// HTTP 200, but the envelope code was not `Success`.
    Envelope {
        code: String,
        message: Option<String>,
    },
    /// The body was not the JSON shape we expect.
    Decode(serde_json::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(e) => write!(f, "sending request failed: {}", e),
            ApiError::Status(status) => write!(f, "unexpected HTTP status {}", status),
            ApiError::Envelope { code, message } => match message {
                Some(message) => write!(f, "received response code '{}': {}", code, message),
                None => write!(f, "received response code '{}'", code),
            },
            ApiError::Decode(e) => write!(f, "unmarshalling response body failed: {}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(e) => Some(e),
            ApiError::Decode(e) => Some(e),
            ApiError::Status(_) | ApiError::Envelope { .. } => None,
        }
    }
}

/// Authenticated Fivetran API client.
///
/// The Basic auth header is computed once at construction and reused for
/// every request. Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct FivetranClient {
    http_client: Client,
    base_url: String,
    auth_header: String,
}

impl FivetranClient {
    /// Create a client against the public Fivetran API.
    pub fn new(api_key: &str, api_secret: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, api_secret, BASE_URL.to_string(), timeout)
    }

    /// Create a client with a custom base URL (for testing with a mock server).
    pub fn with_base_url(
        api_key: &str,
        api_secret: &str,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("fivetran-exporter/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let token = BASE64.encode(format!("{}:{}", api_key, api_secret));

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {}", token),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and return the envelope's `data`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Sending API request failed");
                ApiError::Transport(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(url = %url, status = %status, "Received unexpected HTTP status");
            return Err(ApiError::Status(status));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(url = %url, error = %e, "Reading API response body failed");
            ApiError::Transport(e)
        })?;

        // The envelope is checked before `data` is decoded: error responses
        // carry no data of the requested shape.
        let envelope: Envelope = serde_json::from_slice(&body).map_err(|e| {
            warn!(url = %url, error = %e, "Unmarshalling API response envelope failed");
            ApiError::Decode(e)
        })?;
        if envelope.code != SUCCESS_CODE {
            warn!(url = %url, code = %envelope.code, "Received unsuccessful response code");
            return Err(ApiError::Envelope {
                code: envelope.code,
                message: envelope.message,
            });
        }

        let data = serde_json::from_value(envelope.data).map_err(|e| {
            warn!(url = %url, error = %e, "Unmarshalling API response data failed");
            ApiError::Decode(e)
        })?;

        debug!(url = %url, "Received and unmarshalled API response");
        Ok(data)
    }
}
