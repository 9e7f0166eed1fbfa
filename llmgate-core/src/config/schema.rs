//! Configuration schema structures with serde support

use super::error::ValidationError;
use crate::providers::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Current schema version
pub const CONFIG_VERSION: &str = "0.1";

/// Root configuration structure for the gateway
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: String,

    /// Provider endpoints and proxy selection
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Default retry behavior for calls that do not override it
    #[serde(default)]
    pub retry: RetryPolicy,

    /// HTTP client settings
    #[serde(default)]
    pub connection: ConnectionConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            endpoints: EndpointConfig::default(),
            retry: RetryPolicy::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Basic structural validation
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                super::error::ValidationErrorKind::InvalidVersion {
                    expected: CONFIG_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        self.endpoints.validate()?;
        self.connection.validate()?;

        if let Err(message) = self.retry.check() {
            return Err(ValidationError::out_of_range("retry", message));
        }

        Ok(())
    }
}

/// Where each provider is reached
///
/// OpenAI and Anthropic each have a direct endpoint and a proxy endpoint; the
/// proxy is used when the API key starts with `proxy_key_prefix`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Gemini API base; the model path is appended
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    #[serde(default = "default_openai_url")]
    pub openai_url: String,

    #[serde(default = "default_openai_proxy_url")]
    pub openai_proxy_url: String,

    #[serde(default = "default_anthropic_url")]
    pub anthropic_url: String,

    #[serde(default = "default_anthropic_proxy_url")]
    pub anthropic_proxy_url: String,

    /// Key prefix that routes OpenAI and Anthropic calls through the proxy
    #[serde(default = "default_proxy_key_prefix")]
    pub proxy_key_prefix: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: default_gemini_base_url(),
            openai_url: default_openai_url(),
            openai_proxy_url: default_openai_proxy_url(),
            anthropic_url: default_anthropic_url(),
            anthropic_proxy_url: default_anthropic_proxy_url(),
            proxy_key_prefix: default_proxy_key_prefix(),
        }
    }
}

impl EndpointConfig {
    /// Point every provider at one base URL, keeping the real path layout
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            gemini_base_url: format!("{}/v1beta", base),
            openai_url: format!("{}/v1/chat/completions", base),
            openai_proxy_url: format!("{}/proxy/v1/chat/completions", base),
            anthropic_url: format!("{}/v1/messages", base),
            anthropic_proxy_url: format!("{}/proxy/v1/messages", base),
            proxy_key_prefix: default_proxy_key_prefix(),
        }
    }

    /// True when the key should be routed through the proxy endpoints
    pub fn uses_proxy(&self, api_key: &str) -> bool {
        api_key.starts_with(&self.proxy_key_prefix)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.proxy_key_prefix.is_empty() {
            return Err(ValidationError::required("endpoints.proxy_key_prefix"));
        }

        let urls = [
            ("endpoints.gemini_base_url", &self.gemini_base_url),
            ("endpoints.openai_url", &self.openai_url),
            ("endpoints.openai_proxy_url", &self.openai_proxy_url),
            ("endpoints.anthropic_url", &self.anthropic_url),
            ("endpoints.anthropic_proxy_url", &self.anthropic_proxy_url),
        ];
        for (field, value) in urls {
            let parsed =
                url::Url::parse(value).map_err(|e| ValidationError::invalid_url(field, value, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ValidationError::invalid_value(
                    field,
                    "http or https URL",
                    parsed.scheme(),
                ));
            }
        }

        Ok(())
    }
}

/// Global connection settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum idle connections kept per host
    #[serde(default = "default_pool_size")]
    pub pool_max_idle_per_host: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            pool_max_idle_per_host: default_pool_size(),
            user_agent: default_user_agent(),
        }
    }
}

impl ConnectionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                "connection.connect_timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                "connection.request_timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ValidationError::required("connection.user_agent"));
        }
        Ok(())
    }
}

// Default value functions
fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_openai_proxy_url() -> String {
    "https://api.emergent.ai/v1/chat/completions".to_string()
}

fn default_anthropic_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_anthropic_proxy_url() -> String {
    "https://api.emergent.ai/v1/messages".to_string()
}

fn default_proxy_key_prefix() -> String {
    "sk-emergent-".to_string()
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_request_timeout() -> u64 {
    60_000
}

fn default_pool_size() -> usize {
    10
}

fn default_user_agent() -> String {
    concat!("llmgate/", env!("CARGO_PKG_VERSION")).to_string()
}
