//! Llmgate Core Library
//!
//! A provider-agnostic gateway for LLM generation calls. Callers build one
//! Gemini-shaped request; the gateway picks Gemini, OpenAI or Claude, translates
//! the request, retries rate-limited calls with backoff, and hands back a
//! normalized response or a structured error.
//!
//! ```no_run
//! use llmgate_core::{GenerateRequest, LlmGateway, RetryOptions};
//!
//! # async fn run() -> Result<(), llmgate_core::GatewayError> {
//! let gateway = LlmGateway::new()?;
//! let request = GenerateRequest::from_prompt("Summarize the borrow checker in one line");
//! let result = gateway.call(RetryOptions::new("sk-...", "gpt-4o-mini", request)).await?;
//!
//! match result.response {
//!     Some(response) => println!("{}", response.text),
//!     None => eprintln!("{:?}", result.error_message),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod gateway;
pub mod http;
pub mod protocol;
pub mod providers;

pub use config::{GatewayConfig, SecretString};
pub use gateway::{LlmGateway, RetryOptions, RetryResult};
pub use http::error::classify_error;
pub use http::Transport;
pub use protocol::{GenerateRequest, LlmProvider, LlmResponse, RequestBody, ResponseShape, Usage};
pub use providers::{resolve_provider, FailureKind, GatewayError, RetryPolicy};

/// Returns the version of the Llmgate Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
