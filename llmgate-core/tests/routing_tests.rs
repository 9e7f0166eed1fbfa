//! Tests for provider resolution

use llmgate_core::{resolve_provider, LlmProvider};
use test_case::test_case;

#[test_case("gpt-4o-mini" => LlmProvider::OpenAI ; "gpt prefix")]
#[test_case("gpt-3.5-turbo" => LlmProvider::OpenAI ; "legacy gpt")]
#[test_case("ft:openai-custom" => LlmProvider::OpenAI ; "openai marker")]
#[test_case("claude-3-5-sonnet" => LlmProvider::Claude ; "claude prefix")]
#[test_case("us.anthropic.claude-v2" => LlmProvider::Claude ; "anthropic marker")]
#[test_case("gemini-2.0-flash" => LlmProvider::Gemini ; "gemini")]
#[test_case("mistral-large" => LlmProvider::Gemini ; "unknown defaults to gemini")]
#[test_case("" => LlmProvider::Gemini ; "empty defaults to gemini")]
#[test_case("o1-preview" => LlmProvider::Gemini ; "no marker")]
#[test_case("Claude-3" => LlmProvider::Gemini ; "prefix match is case sensitive")]
fn test_inferred_provider(model: &str) -> LlmProvider {
    resolve_provider(None, model)
}

#[test_case(LlmProvider::Gemini, "gpt-4o")]
#[test_case(LlmProvider::OpenAI, "claude-3-haiku")]
#[test_case(LlmProvider::Claude, "gemini-pro")]
fn test_explicit_provider_always_wins(provider: LlmProvider, model: &str) {
    assert_eq!(resolve_provider(Some(provider), model), provider);
}

/// A model that mentions both vendors goes to OpenAI, which is checked first
#[test]
fn test_openai_checked_before_anthropic() {
    assert_eq!(
        resolve_provider(None, "anthropic-via-openai-proxy"),
        LlmProvider::OpenAI
    );
}
