//! Gateway error types and failure classification

use crate::config::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for gateway pre-flight operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised before any network activity starts.
///
/// Vendor and network failures never surface here; they are encoded in the
/// returned `RetryResult`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No model identifier supplied
    #[error("Model identifier is required")]
    MissingModel,

    /// No API key supplied
    #[error("API key is required")]
    MissingApiKey,

    /// A header name or value could not be encoded
    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    /// The provider endpoint could not be built
    #[error("Invalid endpoint '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    /// Retry parameters violate their bounds
    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    /// Request payload serialization failed
    #[error("Failed to serialize request: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The gateway configuration failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Why a call ended without a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Non-retryable status, or a retryable status with no retry budget
    Fatal,
    /// 429/503 persisted through every retry
    RateLimitExhausted,
    /// The transport produced no response on the final attempt
    Network,
    /// The caller's deadline elapsed
    Timeout,
    /// The caller's cancellation token fired
    Cancelled,
}

impl FailureKind {
    /// True for failures that may succeed if the caller tries again later
    pub fn is_transient(&self) -> bool {
        !matches!(self, FailureKind::Fatal | FailureKind::Cancelled)
    }
}
