//! OpenAI provider implementation
//!
//! Translates the canonical request into a chat completions call and the
//! completion back into the canonical shape. Keys carrying the proxy prefix
//! are sent to the proxy endpoint instead of api.openai.com.

pub mod converter;
pub mod types;

pub use types::{OpenAIRequest, OpenAIResponse};

use crate::config::EndpointConfig;
use crate::protocol::{LlmProvider, LlmResponse, RequestBody};
use crate::providers::adapter::{parse_endpoint, secret_header_value, ProviderAdapter, VendorPayload};
use crate::providers::error::GatewayResult;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde_json::Value;
use tracing::warn;
use url::Url;

/// Adapter for OpenAI chat completions
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAIAdapter;

impl ProviderAdapter for OpenAIAdapter {
    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAI
    }

    fn build_payload(&self, body: &RequestBody, model: &str) -> VendorPayload {
        if let Some(text) = body.as_verbatim() {
            return VendorPayload::Verbatim(text.to_string());
        }
        let request = converter::to_openai_request(&body.to_canonical(), model);
        VendorPayload::Json(serde_json::to_value(request).unwrap_or_else(|_| Value::Object(Default::default())))
    }

    fn normalize(&self, payload: Value, model: &str) -> LlmResponse {
        let converted = serde_json::from_value::<OpenAIResponse>(payload.clone())
            .ok()
            .and_then(converter::from_openai_response);

        match converted {
            Some((canonical, usage)) => {
                LlmResponse::from_canonical_payload(LlmProvider::OpenAI, model, canonical, usage)
            }
            None => {
                warn!("Unrecognized openai response for model {}; passing payload through", model);
                LlmResponse::unrecognized(LlmProvider::OpenAI, model, payload)
            }
        }
    }

    fn endpoint(&self, api_key: &str, _model: &str, endpoints: &EndpointConfig) -> GatewayResult<Url> {
        if endpoints.uses_proxy(api_key) {
            parse_endpoint(&endpoints.openai_proxy_url)
        } else {
            parse_endpoint(&endpoints.openai_url)
        }
    }

    fn auth_headers(&self, api_key: &str) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            secret_header_value("authorization", &format!("Bearer {}", api_key))?,
        );
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proxy_prefix_selects_proxy_endpoint() {
        let endpoints = EndpointConfig::default();
        let proxied = OpenAIAdapter.endpoint("sk-emergent-abc", "gpt-4o", &endpoints).unwrap();
        assert_eq!(proxied.as_str(), "https://api.emergent.ai/v1/chat/completions");

        let direct = OpenAIAdapter.endpoint("sk-proj-abc", "gpt-4o", &endpoints).unwrap();
        assert_eq!(direct.as_str(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_bearer_header() {
        let headers = OpenAIAdapter.auth_headers("sk-test").unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_normalize_completion() {
        let payload = json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6}
        });
        let response = OpenAIAdapter.normalize(payload, "gpt-4o-mini");
        assert!(response.is_recognized());
        assert_eq!(response.text, "Hello");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(6));
        assert_eq!(response.payload["usage"]["prompt_tokens"], 5);
        assert_eq!(response.payload["model"], "gpt-4o-mini");
    }

    #[test]
    fn test_unexpected_shape_passes_through() {
        let payload = json!({"object": "list", "data": []});
        let response = OpenAIAdapter.normalize(payload.clone(), "gpt-4o");
        assert!(!response.is_recognized());
        assert_eq!(response.payload, payload);
        assert_eq!(response.text, "");
    }

    #[test]
    fn test_raw_object_is_translated() {
        let raw = RequestBody::Raw(json!({
            "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
            "generationConfig": {"maxOutputTokens": 64}
        }));
        let payload = OpenAIAdapter.build_payload(&raw, "gpt-4o");
        let body = payload.as_json().unwrap();
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
    }
}
