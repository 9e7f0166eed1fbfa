//! Configuration validation utilities

use super::error::ValidationError;
use super::schema::GatewayConfig;
use tracing::warn;

/// Configuration validator with additional validation rules
pub struct ConfigValidator {
    /// Warn when a proxy endpoint is plain http
    warn_insecure_proxy: bool,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            warn_insecure_proxy: true,
        }
    }

    /// Validator that skips advisory warnings
    pub fn quiet() -> Self {
        Self {
            warn_insecure_proxy: false,
        }
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &GatewayConfig) -> Result<(), ValidationError> {
        // First run the built-in validation
        config.validate()?;

        self.validate_timeouts(config)?;
        if self.warn_insecure_proxy {
            self.check_proxy_transport(config);
        }

        Ok(())
    }

    /// The connect timeout must fit inside the request timeout
    fn validate_timeouts(&self, config: &GatewayConfig) -> Result<(), ValidationError> {
        let connection = &config.connection;
        if connection.connect_timeout_ms > connection.request_timeout_ms {
            return Err(ValidationError::out_of_range(
                "connection.connect_timeout_ms",
                format!(
                    "connect timeout {}ms exceeds request timeout {}ms",
                    connection.connect_timeout_ms, connection.request_timeout_ms
                ),
            )
            .with_context("requests would time out before the connection attempt does"));
        }
        Ok(())
    }

    /// Proxy keys are bearer credentials; flag proxies reached over plain http
    fn check_proxy_transport(&self, config: &GatewayConfig) {
        let endpoints = &config.endpoints;
        for (field, url) in [
            ("openai_proxy_url", &endpoints.openai_proxy_url),
            ("anthropic_proxy_url", &endpoints.anthropic_proxy_url),
        ] {
            if url.starts_with("http://") {
                warn!("endpoints.{} uses plain http: {}", field, url);
            }
        }
    }
}
