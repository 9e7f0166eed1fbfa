//! HTTP layer for calling LLM providers
//!
//! This module implements the transport seam of the gateway, handling:
//! - Connection pooling and client management
//! - Raw status/header/body capture with no retry or interpretation
//! - Error message extraction and Retry-After parsing
//! - Request ID generation and correlation

pub mod client;
pub mod error;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// A fully prepared provider request
#[derive(Clone)]
pub struct OutboundRequest {
    /// Endpoint, possibly carrying the API key as a query parameter
    pub url: Url,

    /// Auth, protocol and caller headers
    pub headers: HeaderMap,

    /// Serialized request body
    pub body: String,

    /// Unique request ID for correlation
    pub request_id: Uuid,
}

impl OutboundRequest {
    /// Create a request with a fresh request ID
    pub fn new(url: Url, headers: HeaderMap, body: String) -> Self {
        Self {
            url,
            headers,
            body,
            request_id: Uuid::new_v4(),
        }
    }

    /// Copy of this request with a new request ID, for the next attempt
    pub fn next_attempt(&self) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Endpoint without its query string, safe to log
    pub fn redacted_url(&self) -> String {
        redact_url(&self.url)
    }
}

impl fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundRequest")
            .field("url", &self.redacted_url())
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("request_id", &self.request_id)
            .finish()
    }
}

/// Strip the query string from a URL
pub fn redact_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// What came back from the provider, before any interpretation
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Server-supplied retry hint, if present and parseable
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(error::parse_retry_after)
    }
}

/// Failures where no HTTP response was obtained
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Response size {size} exceeds maximum {max}")]
    ResponseTooLarge { size: usize, max: usize },

    #[error("{0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The URL may carry an API key in its query string
        let err = err.without_url();
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Issues one HTTP call per invocation.
///
/// Implementations must not retry or interpret statuses; every non-2xx
/// response is returned as a `RawResponse`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError>;
}
