//! A single HTTP exchange.
//!
//! [`Transport`] knows nothing about credentials or retries: it sends what
//! it is given and reports either the response or the failure to get one.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::request::{Method, RequestDescriptor};

/// Status code the backend uses for "authorization failure".
pub const AUTH_FAILURE_STATUS: u16 = 401;

/// Response of a completed exchange, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status == AUTH_FAILURE_STATUS
    }
}

/// No response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request URL could not be built.
    #[error("invalid request URL {path}: {message}")]
    InvalidUrl { path: String, message: String },

    /// An absolute URL points away from the configured backend.
    #[error("refusing to send to {url}: not on the API origin")]
    ForeignOrigin { url: String },

    /// Connection, TLS or timeout failure.
    #[error("{message}")]
    Network { message: String },
}

/// Performs one HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a transport whose requests time out after `timeout`.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a descriptor path against the base URL.
    ///
    /// Absolute URLs (pagination cursors) are used as-is; their own query
    /// string is kept and descriptor parameters are appended after it.
    /// They must share the base URL's scheme, host and port.
    pub fn resolve(&self, request: &RequestDescriptor) -> Result<Url, TransportError> {
        let path = request.path();
        let absolute = path.starts_with("http://") || path.starts_with("https://");
        let parsed = if absolute {
            Url::parse(path)
        } else {
            self.base_url.join(path)
        };

        let mut url = parsed.map_err(|e| TransportError::InvalidUrl {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        if absolute && url.origin() != self.base_url.origin() {
            tracing::warn!(
                "Refusing request to foreign origin {}",
                url.origin().ascii_serialization()
            );
            return Err(TransportError::ForeignOrigin {
                url: url.to_string(),
            });
        }

        if !request.query().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query().encoded());
        }
        Ok(url)
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<TransportResponse, TransportError> {
        let url = self.resolve(request)?;

        let mut builder = self
            .client
            .request(reqwest_method(request.method()), url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(authorization) = request.authorization() {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization.expose());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| TransportError::Network {
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError::Network {
            message: format!("failed to read response body: {}", e),
        })?;

        tracing::debug!("{} -> {}", request, status);

        Ok(TransportResponse { status, body })
    }
}
