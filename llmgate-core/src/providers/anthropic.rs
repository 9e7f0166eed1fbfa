//! Anthropic provider implementation
//!
//! Claude's messages API only knows `user` and `assistant` turns and takes
//! the system prompt as a top-level field rather than a message.

use crate::config::EndpointConfig;
use crate::protocol::{
    GenerateRequest, LlmProvider, LlmResponse, RequestBody, Usage, ROLE_ASSISTANT, ROLE_MODEL,
    ROLE_USER,
};
use crate::providers::adapter::{
    chat_messages, header_value, parse_endpoint, secret_header_value, token_count, ChatMessage,
    ProviderAdapter, VendorPayload,
};
use crate::providers::error::GatewayResult;
use reqwest::header::{HeaderMap, HeaderName};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;
use url::Url;

/// Messages API version sent on every request
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Anthropic messages request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

/// Anthropic messages response
#[derive(Debug, Deserialize)]
pub struct ClaudeResponse {
    #[serde(default)]
    pub model: Option<String>,

    pub content: Vec<ClaudeContentBlock>,

    #[serde(default)]
    pub stop_reason: Option<String>,

    /// Kept verbatim for the normalized payload
    #[serde(default)]
    pub usage: Option<Value>,
}

/// A content block; only `text` blocks carry output text
#[derive(Debug, Deserialize)]
pub struct ClaudeContentBlock {
    #[serde(rename = "type", default)]
    pub block_type: Option<String>,

    #[serde(default)]
    pub text: Option<String>,
}

/// Map a canonical role onto the two roles Claude accepts
fn claude_role(role: Option<&str>) -> String {
    match role {
        Some(ROLE_MODEL) | Some(ROLE_ASSISTANT) => ROLE_ASSISTANT.to_string(),
        _ => ROLE_USER.to_string(),
    }
}

/// Convert a canonical request to Anthropic format
pub fn to_claude_request(request: &GenerateRequest, model: &str) -> ClaudeRequest {
    let config = &request.generation_config;
    ClaudeRequest {
        model: model.to_string(),
        messages: chat_messages(request, claude_role),
        max_tokens: config.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        system: request.system_prompt(),
    }
}

/// Convert an Anthropic response to the canonical payload plus usage
pub fn from_claude_response(response: ClaudeResponse) -> (Value, Option<Usage>) {
    let text = response
        .content
        .into_iter()
        .filter(|block| block.block_type.as_deref() == Some("text"))
        .map(|block| block.text.unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n");

    let usage = response.usage.as_ref().map(|u| {
        let input = token_count(u, "input_tokens");
        let output = token_count(u, "output_tokens");
        Usage {
            prompt_tokens: input,
            completion_tokens: output,
            total_tokens: input.saturating_add(output),
        }
    });

    let mut payload = Map::new();
    payload.insert(
        "candidates".to_string(),
        json!([{
            "content": {"parts": [{"text": text}]},
            "finishReason": response.stop_reason,
        }]),
    );
    if let Some(model) = response.model {
        payload.insert("model".to_string(), Value::String(model));
    }
    if let Some(raw_usage) = response.usage {
        payload.insert("usage".to_string(), raw_usage);
    }

    (Value::Object(payload), usage)
}

/// Adapter for Anthropic's Claude models
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaudeAdapter;

impl ProviderAdapter for ClaudeAdapter {
    fn provider(&self) -> LlmProvider {
        LlmProvider::Claude
    }

    fn build_payload(&self, body: &RequestBody, model: &str) -> VendorPayload {
        if let Some(text) = body.as_verbatim() {
            return VendorPayload::Verbatim(text.to_string());
        }
        let request = to_claude_request(&body.to_canonical(), model);
        VendorPayload::Json(serde_json::to_value(request).unwrap_or_else(|_| Value::Object(Default::default())))
    }

    fn normalize(&self, payload: Value, model: &str) -> LlmResponse {
        match serde_json::from_value::<ClaudeResponse>(payload.clone()) {
            Ok(response) => {
                let (canonical, usage) = from_claude_response(response);
                LlmResponse::from_canonical_payload(LlmProvider::Claude, model, canonical, usage)
            }
            Err(_) => {
                warn!("Unrecognized claude response for model {}; passing payload through", model);
                LlmResponse::unrecognized(LlmProvider::Claude, model, payload)
            }
        }
    }

    fn endpoint(&self, api_key: &str, _model: &str, endpoints: &EndpointConfig) -> GatewayResult<Url> {
        if endpoints.uses_proxy(api_key) {
            parse_endpoint(&endpoints.anthropic_proxy_url)
        } else {
            parse_endpoint(&endpoints.anthropic_url)
        }
    }

    fn auth_headers(&self, api_key: &str) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            secret_header_value("x-api-key", api_key)?,
        );
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            header_value("anthropic-version", ANTHROPIC_VERSION)?,
        );
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_mapping() {
        let request = GenerateRequest::from_prompt("q")
            .push_turn("model", "a")
            .push_turn("assistant", "b")
            .push_turn("system", "c");
        let converted = to_claude_request(&request, "claude-3-5-sonnet");
        let roles: Vec<_> = converted.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "assistant", "user"]);
    }

    #[test]
    fn test_system_prompt_is_top_level() {
        let request = GenerateRequest::from_prompt("hi").with_system_prompt("You grade essays");
        let value = serde_json::to_value(to_claude_request(&request, "claude-3-haiku")).unwrap();
        assert_eq!(value["system"], "You grade essays");
        assert_eq!(value["messages"], json!([{"role": "user", "content": "hi"}]));
        assert_eq!(value["max_tokens"], 2048);
        assert_eq!(value["temperature"], 0.7);
        assert!(value.get("top_p").is_none());
    }

    #[test]
    fn test_empty_request_gets_placeholder_turn() {
        let converted = to_claude_request(&GenerateRequest::new(), "claude-3-haiku");
        assert_eq!(converted.messages, vec![ChatMessage::new("user", "")]);
        assert_eq!(converted.system, None);
    }

    #[test]
    fn test_headers() {
        let headers = ClaudeAdapter.auth_headers("sk-ant-test").unwrap();
        assert_eq!(headers["x-api-key"], "sk-ant-test");
        assert!(headers["x-api-key"].is_sensitive());
        assert_eq!(headers["anthropic-version"], "2023-06-01");
    }

    #[test]
    fn test_proxy_prefix_selects_proxy_endpoint() {
        let endpoints = EndpointConfig::default();
        let proxied = ClaudeAdapter.endpoint("sk-emergent-xyz", "claude-3-haiku", &endpoints).unwrap();
        assert_eq!(proxied.as_str(), "https://api.emergent.ai/v1/messages");
        let direct = ClaudeAdapter.endpoint("sk-ant-xyz", "claude-3-haiku", &endpoints).unwrap();
        assert_eq!(direct.as_str(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn test_normalize_joins_text_blocks() {
        let payload = json!({
            "model": "claude-3-haiku",
            "content": [
                {"type": "text", "text": "first"},
                {"type": "tool_use", "id": "t1", "name": "lookup", "input": {}},
                {"type": "text", "text": "second"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 3}
        });
        let response = ClaudeAdapter.normalize(payload, "claude-3-haiku");
        assert_eq!(response.text, "first\nsecond");
        assert_eq!(response.finish_reason.as_deref(), Some("end_turn"));
        assert_eq!(
            response.usage,
            Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 3,
                total_tokens: 13
            })
        );
        assert_eq!(response.payload["usage"]["input_tokens"], 10);
    }

    #[test]
    fn test_error_shaped_success_is_unrecognized() {
        let payload = json!({"type": "error", "error": {"message": "overloaded"}});
        let response = ClaudeAdapter.normalize(payload.clone(), "claude-3-haiku");
        assert!(!response.is_recognized());
        assert_eq!(response.payload, payload);
    }
}
