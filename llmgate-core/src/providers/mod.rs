//! Provider abstraction and retry policy
//!
//! Each provider is a stateless [`ProviderAdapter`] that translates the
//! canonical Gemini-shaped request into its own wire format and back. The
//! resolver picks one per call; the retry policy decides what happens when a
//! call fails.

pub mod adapter;
pub mod anthropic;
pub mod error;
pub mod gemini;
pub mod openai;
pub mod retry;
pub mod routing;

pub use adapter::{ChatMessage, ProviderAdapter, VendorPayload};
pub use error::{FailureKind, GatewayError, GatewayResult};
pub use retry::{RetryPolicy, RETRYABLE_STATUSES};
pub use routing::{infer_provider, resolve_provider};

// Re-export concrete providers
pub use anthropic::ClaudeAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAIAdapter;
