//! Protocol module for canonical LLM request/response structures
//!
//! These structures are the shape every gateway caller and every provider
//! translator agrees on. They are:
//! - Provider-agnostic
//! - Serializable in Gemini's native wire format
//! - Lenient when reading pre-shaped payloads

pub mod types;

pub use types::{
    Content, GenerateRequest, GenerationConfig, LlmProvider, LlmResponse, ParseProviderError,
    Part, RequestBody, ResponseShape, Usage, ROLE_ASSISTANT, ROLE_MODEL, ROLE_USER,
};
