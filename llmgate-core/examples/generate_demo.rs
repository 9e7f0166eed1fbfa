//! Gateway demo
//!
//! Sends one prompt through the gateway and prints the normalized result.
//! The provider is inferred from the model name unless LLMGATE_PROVIDER is set.
//!
//! Run with:
//!   LLMGATE_API_KEY=... LLMGATE_MODEL=gpt-4o-mini cargo run --example generate_demo -- "Your prompt"
//!
//! Set LLMGATE_CONFIG to a YAML file to override endpoints and retry settings,
//! and RUST_LOG=llmgate_core=debug to watch individual attempts.

use anyhow::{bail, Context, Result};
use llmgate_core::config::load_from_yaml;
use llmgate_core::{
    GatewayConfig, GenerateRequest, LlmGateway, LlmProvider, RetryOptions, SecretString,
};
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let api_key = SecretString::from(env::var("LLMGATE_API_KEY").context("LLMGATE_API_KEY must be set")?);
    let model = env::var("LLMGATE_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());
    let prompt = env::args()
        .nth(1)
        .unwrap_or_else(|| "Explain Rust ownership in two sentences.".to_string());

    let config = match env::var("LLMGATE_CONFIG") {
        Ok(path) => load_from_yaml(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => GatewayConfig::default(),
    };
    let gateway = LlmGateway::from_config(config)?;

    let request = GenerateRequest::from_prompt(prompt)
        .with_system_prompt("You are a concise teaching assistant.")
        .with_max_output_tokens(512);
    println!("model={} key={}", model, api_key.partial_redact());
    let mut options = RetryOptions::new(api_key, &model, request).with_deadline(Duration::from_secs(90));
    if let Ok(name) = env::var("LLMGATE_PROVIDER") {
        options = options.with_provider(name.parse::<LlmProvider>()?);
    }

    let result = gateway.call(options).await?;
    println!(
        "provider={} model={} attempts={} rate_limited={} waited={}ms",
        result.provider, result.model, result.attempts, result.was_rate_limited, result.total_delay_ms
    );

    match result.response {
        Some(response) => {
            if !response.is_recognized() {
                println!("Unrecognized payload: {}", response.payload);
            }
            println!("\n{}", response.text);
            if let Some(usage) = response.usage {
                println!(
                    "\ntokens: {} prompt + {} completion = {}",
                    usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                );
            }
            Ok(())
        }
        None => bail!(
            "call failed ({:?}, status {:?}): {}",
            result.failure,
            result.status,
            result.error_message.unwrap_or_default()
        ),
    }
}
