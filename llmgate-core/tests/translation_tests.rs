//! Tests for request and response translation across providers

use llmgate_core::protocol::{Content, GenerateRequest, LlmProvider, RequestBody, ResponseShape};
use llmgate_core::providers::VendorPayload;
use serde_json::{json, Value};

fn payload_for(provider: LlmProvider, request: GenerateRequest) -> Value {
    match provider
        .adapter()
        .build_payload(&RequestBody::from(request), "test-model")
    {
        VendorPayload::Json(value) => value,
        VendorPayload::Verbatim(text) => panic!("expected structured payload, got {}", text),
    }
}

/// Wrap `text` in the response shape `provider` would send back
fn vendor_echo(provider: LlmProvider, text: &str) -> Value {
    match provider {
        LlmProvider::Gemini => json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}),
        LlmProvider::OpenAI => json!({"choices": [{"message": {"content": text}}]}),
        LlmProvider::Claude => json!({"content": [{"type": "text", "text": text}]}),
    }
}

/// Text the vendor would see as the last user turn
fn last_prompt(provider: LlmProvider, payload: &Value) -> String {
    let text = match provider {
        LlmProvider::Gemini => payload["contents"][0]["parts"][0]["text"].as_str(),
        LlmProvider::OpenAI | LlmProvider::Claude => payload["messages"]
            .as_array()
            .and_then(|messages| messages.last())
            .and_then(|m| m["content"].as_str()),
    };
    text.unwrap_or_default().to_string()
}

#[test]
fn test_round_trip_preserves_text() {
    let prompt = "Explain lifetimes\nwith one example";
    for provider in LlmProvider::ALL {
        let adapter = provider.adapter();
        let payload = payload_for(provider, GenerateRequest::from_prompt(prompt));
        let seen = last_prompt(provider, &payload);
        assert_eq!(seen, prompt, "{} request lost text", provider);

        let response = adapter.normalize(vendor_echo(provider, &seen), "test-model");
        assert_eq!(response.shape, ResponseShape::Normalized);
        assert_eq!(response.text, prompt, "{} response lost text", provider);
        assert_eq!(response.provider, provider);
    }
}

#[test]
fn test_multi_part_turns_are_newline_joined() {
    let request = GenerateRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: Some(vec![
                llmgate_core::protocol::Part::text("line one"),
                llmgate_core::protocol::Part { text: None },
                llmgate_core::protocol::Part::text("line three"),
            ]),
        }],
        ..Default::default()
    };

    for provider in [LlmProvider::OpenAI, LlmProvider::Claude] {
        let payload = payload_for(provider, request.clone());
        assert_eq!(payload["messages"][0]["content"], "line one\n\nline three");
    }
}

#[test]
fn test_empty_prompt_guard() {
    for provider in LlmProvider::ALL {
        let payload = payload_for(provider, GenerateRequest::new());
        let turns = match provider {
            LlmProvider::Gemini => &payload["contents"],
            LlmProvider::OpenAI | LlmProvider::Claude => &payload["messages"],
        };
        assert_eq!(
            turns.as_array().map(Vec::len),
            Some(1),
            "{} did not get exactly one turn",
            provider
        );
        assert_eq!(last_prompt(provider, &payload), "");
        assert_eq!(turns[0]["role"], "user");
    }
}

#[test]
fn test_raw_body_with_float_token_limit_keeps_prompt() {
    let raw = RequestBody::Raw(json!({
        "contents": [{"role": "user", "parts": [{"text": "Plan a Rust course"}]}],
        "generationConfig": {"temperature": 0.7, "maxOutputTokens": 2048.0}
    }));

    for provider in [LlmProvider::OpenAI, LlmProvider::Claude] {
        let payload = match provider.adapter().build_payload(&raw, "test-model") {
            VendorPayload::Json(value) => value,
            VendorPayload::Verbatim(text) => panic!("expected structured payload, got {}", text),
        };
        assert_eq!(payload["messages"], json!([{"role": "user", "content": "Plan a Rust course"}]));
        assert_eq!(payload["max_tokens"], 2048);
    }
}

#[test]
fn test_generation_config_mapping() {
    let request = GenerateRequest::from_prompt("x")
        .with_temperature(0.2)
        .with_max_output_tokens(256)
        .with_top_p(0.5)
        .with_top_k(10);

    let openai = payload_for(LlmProvider::OpenAI, request.clone());
    assert_eq!(openai["temperature"], 0.2);
    assert_eq!(openai["max_tokens"], 256);
    assert_eq!(openai["top_p"], 0.5);
    assert!(openai.get("top_k").is_none());

    let claude = payload_for(LlmProvider::Claude, request.clone());
    assert_eq!(claude["temperature"], 0.2);
    assert_eq!(claude["max_tokens"], 256);
    assert!(claude.get("top_p").is_none());

    let gemini = payload_for(LlmProvider::Gemini, request);
    assert_eq!(gemini["generationConfig"]["topK"], 10);
    assert_eq!(gemini["generationConfig"]["maxOutputTokens"], 256);
}

#[test]
fn test_raw_gemini_body_translated_for_other_providers() {
    let raw = RequestBody::Raw(json!({
        "contents": [
            {"role": "user", "parts": [{"text": "What is 2+2?"}]},
            {"role": "model", "parts": [{"text": "4"}]},
            {"role": "user", "parts": [{"text": "And 3+3?"}]}
        ],
        "systemInstruction": {"parts": [{"text": "Answer tersely"}]}
    }));

    let claude = LlmProvider::Claude.adapter().build_payload(&raw, "claude-3-haiku");
    let claude = claude.as_json().unwrap();
    assert_eq!(claude["system"], "Answer tersely");
    assert_eq!(claude["messages"][1], json!({"role": "assistant", "content": "4"}));

    let openai = LlmProvider::OpenAI.adapter().build_payload(&raw, "gpt-4o");
    let openai = openai.as_json().unwrap();
    assert_eq!(openai["messages"][0], json!({"role": "system", "content": "Answer tersely"}));
    assert_eq!(openai["messages"].as_array().unwrap().len(), 4);
}

#[test]
fn test_unrecognized_responses_pass_through() {
    let odd = json!({"status": "queued", "id": 42});
    for provider in LlmProvider::ALL {
        let response = provider.adapter().normalize(odd.clone(), "m");
        assert_eq!(response.shape, ResponseShape::Unrecognized);
        assert_eq!(response.payload, odd);
        assert_eq!(response.text, "");
        assert_eq!(response.usage, None);
    }
}
