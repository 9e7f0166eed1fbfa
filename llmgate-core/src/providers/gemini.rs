//! Gemini provider
//!
//! Gemini's `generateContent` shape is the canonical shape, so requests and
//! responses pass through untouched. The API key travels in the query string.

use crate::config::EndpointConfig;
use crate::protocol::{Content, GenerateRequest, LlmProvider, LlmResponse, RequestBody, Usage};
use crate::providers::adapter::{parse_endpoint, token_count, ProviderAdapter, VendorPayload};
use crate::providers::error::{GatewayError, GatewayResult};
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::warn;
use url::Url;

/// Adapter for Google's Gemini API
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiAdapter;

impl ProviderAdapter for GeminiAdapter {
    fn provider(&self) -> LlmProvider {
        LlmProvider::Gemini
    }

    fn build_payload(&self, body: &RequestBody, _model: &str) -> VendorPayload {
        match body {
            RequestBody::Raw(Value::String(text)) => VendorPayload::Verbatim(text.clone()),
            RequestBody::Raw(value) => VendorPayload::Json(value.clone()),
            RequestBody::Canonical(request) if request.contents.is_empty() => {
                let mut guarded = request.clone();
                guarded.contents.push(Content::user(""));
                VendorPayload::Json(canonical_json(&guarded))
            }
            RequestBody::Canonical(request) => VendorPayload::Json(canonical_json(request)),
        }
    }

    fn normalize(&self, payload: Value, model: &str) -> LlmResponse {
        if !payload.get("candidates").is_some_and(Value::is_array) {
            warn!("Unrecognized gemini response for model {}; passing payload through", model);
            return LlmResponse::unrecognized(LlmProvider::Gemini, model, payload);
        }

        let usage = payload.get("usageMetadata").map(|meta| Usage {
            prompt_tokens: token_count(meta, "promptTokenCount"),
            completion_tokens: token_count(meta, "candidatesTokenCount"),
            total_tokens: token_count(meta, "totalTokenCount"),
        });
        LlmResponse::from_canonical_payload(LlmProvider::Gemini, model, payload, usage)
    }

    fn endpoint(&self, api_key: &str, model: &str, endpoints: &EndpointConfig) -> GatewayResult<Url> {
        let base = endpoints.gemini_base_url.trim_end_matches('/');
        let mut url = parse_endpoint(&format!("{}/models", base))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidEndpoint {
                url: base.to_string(),
                message: "cannot carry a model path".to_string(),
            })?
            .push(&format!("{}:generateContent", model));
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    fn auth_headers(&self, _api_key: &str) -> GatewayResult<HeaderMap> {
        Ok(HeaderMap::new())
    }
}

// Canonical requests hold only strings and numbers; serialization is infallible
fn canonical_json(request: &GenerateRequest) -> Value {
    serde_json::to_value(request).unwrap_or_else(|_| Value::Object(Default::default()))
}
