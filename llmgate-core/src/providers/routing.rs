//! Provider resolution
//!
//! An explicit provider always wins. Otherwise the model name decides, and
//! anything unrecognized goes to Gemini.

use crate::protocol::LlmProvider;
use tracing::debug;

/// Pick the provider for a call
pub fn resolve_provider(explicit: Option<LlmProvider>, model: &str) -> LlmProvider {
    if let Some(provider) = explicit {
        return provider;
    }

    let provider = infer_provider(model);
    debug!("Resolved model {} to provider {}", model, provider);
    provider
}

/// Infer a provider from a model name alone. Matching is case-sensitive.
pub fn infer_provider(model: &str) -> LlmProvider {
    if model.starts_with("gpt-") || model.contains("openai") {
        LlmProvider::OpenAI
    } else if model.starts_with("claude-") || model.contains("anthropic") {
        LlmProvider::Claude
    } else {
        LlmProvider::Gemini
    }
}
