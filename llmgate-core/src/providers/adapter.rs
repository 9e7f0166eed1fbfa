//! Provider adapter trait
//!
//! One adapter per provider owns everything vendor-specific: payload
//! translation, endpoint selection, authentication headers and response
//! normalization. The retry controller only ever talks to this trait.

use crate::config::EndpointConfig;
use crate::http::OutboundRequest;
use crate::protocol::{GenerateRequest, LlmProvider, LlmResponse, RequestBody, ROLE_USER};
use crate::providers::error::{GatewayError, GatewayResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// A request body in a provider's wire format
#[derive(Debug, Clone, PartialEq)]
pub enum VendorPayload {
    /// Structured payload, serialized as JSON
    Json(Value),
    /// Pre-serialized body sent as is
    Verbatim(String),
}

impl VendorPayload {
    /// Serialize for the wire
    pub fn into_body(self) -> GatewayResult<String> {
        match self {
            VendorPayload::Json(value) => Ok(serde_json::to_string(&value)?),
            VendorPayload::Verbatim(text) => Ok(text),
        }
    }

    /// The structured payload, if any
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            VendorPayload::Json(value) => Some(value),
            VendorPayload::Verbatim(_) => None,
        }
    }
}

/// Core trait that every provider implements
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter speaks for
    fn provider(&self) -> LlmProvider;

    /// Translate a request body into the provider's wire format
    fn build_payload(&self, body: &RequestBody, model: &str) -> VendorPayload;

    /// Translate a successful provider payload into the canonical response
    fn normalize(&self, payload: Value, model: &str) -> LlmResponse;

    /// Endpoint for this key and model
    fn endpoint(&self, api_key: &str, model: &str, endpoints: &EndpointConfig) -> GatewayResult<Url>;

    /// Authentication and protocol headers
    fn auth_headers(&self, api_key: &str) -> GatewayResult<HeaderMap>;

    /// Build the complete HTTP request.
    ///
    /// Caller headers are applied last and override the defaults.
    fn prepare(
        &self,
        api_key: &str,
        model: &str,
        payload: VendorPayload,
        extra_headers: &HashMap<String, String>,
        endpoints: &EndpointConfig,
    ) -> GatewayResult<OutboundRequest> {
        let url = self.endpoint(api_key, model, endpoints)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(self.auth_headers(api_key)?);
        for (name, value) in extra_headers {
            headers.insert(header_name(name)?, header_value(name, value)?);
        }

        Ok(OutboundRequest::new(url, headers, payload.into_body()?))
    }
}

/// Parse a header name
pub(crate) fn header_name(name: &str) -> GatewayResult<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| GatewayError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Parse a header value
pub(crate) fn header_value(name: &str, value: &str) -> GatewayResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| GatewayError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Parse a header value that carries a credential
pub(crate) fn secret_header_value(name: &str, value: &str) -> GatewayResult<HeaderValue> {
    let mut value = HeaderValue::from_str(value).map_err(|_| GatewayError::InvalidHeader {
        name: name.to_string(),
        message: "credential contains characters not allowed in a header".to_string(),
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Parse a configured endpoint URL
pub(crate) fn parse_endpoint(url: &str) -> GatewayResult<Url> {
    Url::parse(url).map_err(|e| GatewayError::InvalidEndpoint {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// A chat-style message as OpenAI and Anthropic expect it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Flatten canonical turns into chat messages.
///
/// Turns without a `parts` array are dropped. An empty result becomes a
/// single empty user message, since both chat APIs reject an empty list.
pub(crate) fn chat_messages(
    request: &GenerateRequest,
    map_role: impl Fn(Option<&str>) -> String,
) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = request
        .contents
        .iter()
        .filter_map(|content| {
            content
                .joined_text()
                .map(|text| ChatMessage::new(map_role(content.role.as_deref()), text))
        })
        .collect();

    if messages.is_empty() {
        messages.push(ChatMessage::new(ROLE_USER, ""));
    }
    messages
}

/// Read `key` from a JSON object as an unsigned token count
pub(crate) fn token_count(usage: &Value, key: &str) -> u64 {
    usage.get(key).and_then(Value::as_u64).unwrap_or(0)
}

impl LlmProvider {
    /// The adapter that speaks this provider's wire format
    pub fn adapter(&self) -> &'static dyn ProviderAdapter {
        match self {
            LlmProvider::Gemini => &crate::providers::gemini::GeminiAdapter,
            LlmProvider::OpenAI => &crate::providers::openai::OpenAIAdapter,
            LlmProvider::Claude => &crate::providers::anthropic::ClaudeAdapter,
        }
    }
}
