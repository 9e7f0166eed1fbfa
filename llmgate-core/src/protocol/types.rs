//! Core protocol types for LLM generation calls
//!
//! The canonical request is the Gemini `generateContent` shape: it is the
//! lingua franca every other provider translates into and out of. The design
//! prioritizes:
//! - Lenient deserialization, so pre-shaped payloads from older callers parse
//! - Provider-independent responses with the normalized payload kept alongside
//! - A closed set of providers chosen once per call

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Role used for caller turns
pub const ROLE_USER: &str = "user";

/// Role used by Gemini for model turns
pub const ROLE_MODEL: &str = "model";

/// Role used by OpenAI and Anthropic for model turns
pub const ROLE_ASSISTANT: &str = "assistant";

// ============================================================================
// Providers
// ============================================================================

/// The LLM backends the gateway can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini `generateContent`
    Gemini,
    /// OpenAI chat completions
    OpenAI,
    /// Anthropic messages
    Claude,
}

impl LlmProvider {
    /// All providers
    pub const ALL: [LlmProvider; 3] = [LlmProvider::Gemini, LlmProvider::OpenAI, LlmProvider::Claude];

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Claude => "claude",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a provider name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown LLM provider '{0}'")]
pub struct ParseProviderError(pub String);

impl FromStr for LlmProvider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "openai" => Ok(LlmProvider::OpenAI),
            "claude" | "anthropic" => Ok(LlmProvider::Claude),
            other => Err(ParseProviderError(other.to_string())),
        }
    }
}

// ============================================================================
// Canonical request
// ============================================================================

/// One segment of a turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// A role-tagged turn made of one or more parts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
}

impl Content {
    /// Create a turn with a single text part
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            parts: Some(vec![Part::text(text)]),
        }
    }

    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ROLE_USER, text)
    }

    /// Create a model turn
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(ROLE_MODEL, text)
    }

    /// Newline-joined text of all parts; parts without text count as empty.
    ///
    /// Returns `None` when the turn carries no `parts` array at all.
    pub fn joined_text(&self) -> Option<String> {
        self.parts.as_ref().map(|parts| {
            parts
                .iter()
                .map(|p| p.text.as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }
}

/// Sampling parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl GenerationConfig {
    /// True when no parameter is set
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.max_output_tokens.is_none()
            && self.top_p.is_none()
            && self.top_k.is_none()
    }
}

/// Canonical generation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Ordered conversation turns
    #[serde(default)]
    pub contents: Vec<Content>,

    #[serde(default, skip_serializing_if = "GenerationConfig::is_empty")]
    pub generation_config: GenerationConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

impl GenerateRequest {
    /// Create an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a request with a single user turn
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::new().push_turn(ROLE_USER, prompt)
    }

    /// Append a turn
    pub fn push_turn(mut self, role: impl Into<String>, text: impl Into<String>) -> Self {
        self.contents.push(Content::new(role, text));
        self
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_instruction = Some(Content {
            role: None,
            parts: Some(vec![Part::text(prompt)]),
        });
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.generation_config.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.generation_config.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.generation_config.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.generation_config.top_k = Some(top_k);
        self
    }

    /// System prompt text, if one is set and non-empty
    pub fn system_prompt(&self) -> Option<String> {
        self.system_instruction
            .as_ref()
            .and_then(Content::joined_text)
            .filter(|text| !text.is_empty())
    }
}

/// Body handed to the gateway
///
/// `Raw` carries a payload that is already in Gemini's native shape. A raw JSON
/// string is sent verbatim to whichever provider is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Canonical(GenerateRequest),
    Raw(Value),
}

impl RequestBody {
    /// Read the body as a canonical request.
    ///
    /// Raw objects are read leniently and field by field: `contents`,
    /// `generationConfig` and `systemInstruction` each fall back on their own,
    /// so a mistyped sampling parameter never costs the conversation turns.
    pub fn to_canonical(&self) -> GenerateRequest {
        match self {
            RequestBody::Canonical(request) => request.clone(),
            RequestBody::Raw(value) => read_raw_request(value),
        }
    }

    /// Verbatim text for raw string bodies
    pub fn as_verbatim(&self) -> Option<&str> {
        match self {
            RequestBody::Raw(Value::String(text)) => Some(text),
            _ => None,
        }
    }
}

fn read_raw_request(value: &Value) -> GenerateRequest {
    let contents: Vec<Content> = match value.get("contents") {
        Some(Value::Array(turns)) => {
            let read: Vec<Content> = turns.iter().filter_map(read_raw_content).collect();
            if read.len() < turns.len() {
                tracing::warn!(
                    "Raw body: dropped {} of {} unreadable turns",
                    turns.len() - read.len(),
                    turns.len()
                );
            }
            read
        }
        Some(other) => {
            tracing::warn!("Raw body has {} contents instead of an array; no turns read", json_kind(other));
            Vec::new()
        }
        None => Vec::new(),
    };

    GenerateRequest {
        contents,
        generation_config: value
            .get("generationConfig")
            .map(read_raw_generation_config)
            .unwrap_or_default(),
        system_instruction: value.get("systemInstruction").and_then(read_raw_content),
    }
}

fn read_raw_content(value: &Value) -> Option<Content> {
    let turn = value.as_object()?;
    let role = turn.get("role").and_then(Value::as_str).map(str::to_string);
    let parts = turn.get("parts").and_then(Value::as_array).map(|parts| {
        parts
            .iter()
            .map(|part| Part {
                text: part.get("text").and_then(scalar_text),
            })
            .collect()
    });
    Some(Content { role, parts })
}

fn read_raw_generation_config(value: &Value) -> GenerationConfig {
    GenerationConfig {
        temperature: value.get("temperature").and_then(lenient_f64),
        max_output_tokens: value.get("maxOutputTokens").and_then(lenient_u32),
        top_p: value.get("topP").and_then(lenient_f64),
        top_k: value.get("topK").and_then(lenient_u32),
    }
}

/// Numbers, or strings holding a number
fn lenient_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Whole token counts; `2048.0` reads as 2048
fn lenient_u32(value: &Value) -> Option<u32> {
    lenient_f64(value)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<GenerateRequest> for RequestBody {
    fn from(request: GenerateRequest) -> Self {
        RequestBody::Canonical(request)
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Raw(value)
    }
}

// ============================================================================
// Canonical response
// ============================================================================

/// Token accounting normalized across providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Whether a provider payload matched the shape its translator expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// Translated into the canonical shape
    Normalized,
    /// Passed through untouched; carries no usable text
    Unrecognized,
}

/// Provider-independent generation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Newline-joined text of the first candidate
    pub text: String,

    pub provider: LlmProvider,

    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    /// Gemini-shaped payload, or the raw payload when unrecognized
    pub payload: Value,

    pub shape: ResponseShape,
}

impl LlmResponse {
    /// Build a response from a payload already in the canonical shape
    pub fn from_canonical_payload(
        provider: LlmProvider,
        model: impl Into<String>,
        payload: Value,
        usage: Option<Usage>,
    ) -> Self {
        let candidate = payload.get("candidates").and_then(|c| c.get(0));
        let text = candidate
            .and_then(|c| c.pointer("/content/parts"))
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        let finish_reason = candidate
            .and_then(|c| c.get("finishReason"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            text,
            provider,
            model: model.into(),
            usage,
            finish_reason,
            payload,
            shape: ResponseShape::Normalized,
        }
    }

    /// Wrap a payload that could not be translated
    pub fn unrecognized(provider: LlmProvider, model: impl Into<String>, payload: Value) -> Self {
        Self {
            text: String::new(),
            provider,
            model: model.into(),
            usage: None,
            finish_reason: None,
            payload,
            shape: ResponseShape::Unrecognized,
        }
    }

    /// True when the provider returned any text
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn is_recognized(&self) -> bool {
        self.shape == ResponseShape::Normalized
    }
}
