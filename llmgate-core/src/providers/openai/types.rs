//! OpenAI API types
//!
//! Wire types for the chat completions endpoint. Response types are lenient:
//! only the fields the gateway reads are declared.

use crate::providers::adapter::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAI chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    #[serde(default)]
    pub model: Option<String>,

    pub choices: Vec<OpenAIChoice>,

    /// Kept verbatim for the normalized payload
    #[serde(default)]
    pub usage: Option<Value>,
}

/// OpenAI choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    #[serde(default)]
    pub message: Option<OpenAIResponseMessage>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message inside a choice
#[derive(Debug, Deserialize)]
pub struct OpenAIResponseMessage {
    #[serde(default)]
    pub content: Option<OpenAIContent>,
}

/// OpenAI content (can be string or array of parts)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIContentPart>),
}

/// One element of an array-form message content
#[derive(Debug, Deserialize)]
pub struct OpenAIContentPart {
    #[serde(rename = "type", default)]
    pub part_type: Option<String>,

    #[serde(default)]
    pub text: Option<String>,
}

impl OpenAIContent {
    /// Plain text; array content keeps only `text` parts, newline-joined
    pub fn into_text(self) -> String {
        match self {
            OpenAIContent::Text(text) => text,
            OpenAIContent::Parts(parts) => parts
                .into_iter()
                .filter(|p| p.part_type.as_deref().map_or(true, |t| t == "text"))
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
