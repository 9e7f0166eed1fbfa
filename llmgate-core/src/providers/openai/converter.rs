//! Conversion between the canonical Gemini shape and OpenAI chat completions

use super::types::{OpenAIRequest, OpenAIResponse};
use crate::protocol::{GenerateRequest, Usage, ROLE_USER};
use crate::providers::adapter::{chat_messages, token_count, ChatMessage};
use serde_json::{json, Map, Value};

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TOP_P: f64 = 0.95;

/// Convert a canonical request to OpenAI format
pub fn to_openai_request(request: &GenerateRequest, model: &str) -> OpenAIRequest {
    // Roles are forwarded as given; a missing or blank role is a user turn
    let mut messages = chat_messages(request, |role| {
        role.filter(|r| !r.is_empty()).unwrap_or(ROLE_USER).to_string()
    });
    if let Some(system) = request.system_prompt() {
        messages.insert(0, ChatMessage::new("system", system));
    }

    let config = &request.generation_config;
    OpenAIRequest {
        model: model.to_string(),
        messages,
        temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens: config.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        top_p: config.top_p.unwrap_or(DEFAULT_TOP_P),
    }
}

/// Convert an OpenAI response to the canonical payload plus usage.
///
/// Returns `None` when the response has no first choice.
pub fn from_openai_response(response: OpenAIResponse) -> Option<(Value, Option<Usage>)> {
    let choice = response.choices.into_iter().next()?;
    let text = choice
        .message
        .and_then(|m| m.content)
        .map(|c| c.into_text())
        .unwrap_or_default();

    let usage = response.usage.as_ref().map(|u| Usage {
        prompt_tokens: token_count(u, "prompt_tokens"),
        completion_tokens: token_count(u, "completion_tokens"),
        total_tokens: token_count(u, "total_tokens"),
    });

    let mut payload = Map::new();
    payload.insert(
        "candidates".to_string(),
        json!([{
            "content": {"parts": [{"text": text}]},
            "finishReason": choice.finish_reason,
        }]),
    );
    if let Some(model) = response.model {
        payload.insert("model".to_string(), Value::String(model));
    }
    if let Some(raw_usage) = response.usage {
        payload.insert("usage".to_string(), raw_usage);
    }

    Some((Value::Object(payload), usage))
}
