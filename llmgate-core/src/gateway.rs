//! Retry controller and public entry point
//!
//! `LlmGateway::call` resolves a provider, translates the request, and drives
//! the attempt loop:
//!
//! ```text
//! Attempting -> Success
//!            -> FatalFailure
//!            -> TransientFailure -> Backoff -> Attempting
//!                                -> Exhausted
//! ```
//!
//! Vendor and network failures never surface as `Err`; they are reported in
//! the returned [`RetryResult`]. `Err` is reserved for requests that could
//! not be issued at all.

use crate::config::{ConfigValidator, GatewayConfig, SecretString};
use crate::http::client::HttpClient;
use crate::http::error::classify_error;
use crate::http::{OutboundRequest, RawResponse, Transport};
use crate::protocol::{LlmProvider, LlmResponse, RequestBody};
use crate::providers::{
    resolve_provider, FailureKind, GatewayError, GatewayResult, ProviderAdapter, RetryPolicy,
};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything needed for one gateway call
#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub api_key: SecretString,

    /// Explicit provider; inferred from the model name when absent
    pub provider: Option<LlmProvider>,

    pub model: String,

    pub body: RequestBody,

    /// Overrides for the configured retry policy
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,

    /// Extra headers, applied after the provider's own
    pub headers: HashMap<String, String>,

    /// Wall-clock budget for the whole call, backoff included
    pub deadline: Option<Duration>,

    pub cancel: Option<CancellationToken>,
}

impl RetryOptions {
    pub fn new(
        api_key: impl Into<SecretString>,
        model: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            provider: None,
            model: model.into(),
            body: body.into(),
            max_retries: None,
            initial_delay_ms: None,
            backoff_multiplier: None,
            headers: HashMap::new(),
            deadline: None,
            cancel: None,
        }
    }

    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_initial_delay_ms(mut self, initial_delay_ms: u64) -> Self {
        self.initial_delay_ms = Some(initial_delay_ms);
        self
    }

    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = Some(backoff_multiplier);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Outcome of a gateway call
#[derive(Debug, Clone)]
pub struct RetryResult {
    /// Present exactly when a 2xx response was received
    pub response: Option<LlmResponse>,

    /// Last HTTP status; `Some(0)` when the transport failed, `None` when the
    /// call was interrupted
    pub status: Option<u16>,

    pub error_message: Option<String>,

    /// HTTP calls issued. Zero only when the deadline or cancellation fired
    /// before the first request went out.
    pub attempts: u32,

    /// True once any 429/503 led to a retry
    pub was_rate_limited: bool,

    pub provider: LlmProvider,

    pub model: String,

    pub failure: Option<FailureKind>,

    /// Time spent in completed backoff sleeps
    pub total_delay_ms: u64,
}

impl RetryResult {
    pub fn is_success(&self) -> bool {
        self.response.is_some()
    }
}

/// Why a suspension point was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Deadline,
    Cancelled,
}

/// Mutable bookkeeping for a single call
struct CallState {
    provider: LlmProvider,
    model: String,
    attempts: u32,
    was_rate_limited: bool,
    total_delay: Duration,
}

impl CallState {
    fn new(provider: LlmProvider, model: &str) -> Self {
        Self {
            provider,
            model: model.to_string(),
            attempts: 0,
            was_rate_limited: false,
            total_delay: Duration::ZERO,
        }
    }

    fn finish(
        self,
        response: Option<LlmResponse>,
        status: Option<u16>,
        error_message: Option<String>,
        failure: Option<FailureKind>,
    ) -> RetryResult {
        RetryResult {
            response,
            status,
            error_message,
            attempts: self.attempts,
            was_rate_limited: self.was_rate_limited,
            provider: self.provider,
            model: self.model,
            failure,
            total_delay_ms: u64::try_from(self.total_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn succeeded(self, response: LlmResponse, status: u16) -> RetryResult {
        self.finish(Some(response), Some(status), None, None)
    }

    fn failed(self, status: u16, message: String, failure: FailureKind) -> RetryResult {
        self.finish(None, Some(status), Some(message), Some(failure))
    }

    fn interrupted(self, interrupt: Interrupt, deadline: Option<Duration>) -> RetryResult {
        let (message, failure) = match interrupt {
            Interrupt::Deadline => (
                format!(
                    "{} request timed out after {}ms",
                    self.provider,
                    deadline.map_or(0, |d| d.as_millis())
                ),
                FailureKind::Timeout,
            ),
            Interrupt::Cancelled => (
                format!("{} request cancelled", self.provider),
                FailureKind::Cancelled,
            ),
        };
        self.finish(None, None, Some(message), Some(failure))
    }
}

/// Deadline and cancellation shared by every suspension point of a call
struct Interruption<'a> {
    deadline_at: Option<Instant>,
    cancel: Option<&'a CancellationToken>,
}

impl Interruption<'_> {
    /// Interrupt that has already happened, if any
    fn pending(&self) -> Option<Interrupt> {
        if self.cancel.is_some_and(CancellationToken::is_cancelled) {
            return Some(Interrupt::Cancelled);
        }
        if self.deadline_at.is_some_and(|at| Instant::now() >= at) {
            return Some(Interrupt::Deadline);
        }
        None
    }

    /// Run `fut` unless the deadline passes or the token fires first
    async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupt> {
        let deadline = async {
            match self.deadline_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        let cancelled = async {
            match self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(Interrupt::Cancelled),
            _ = deadline => Err(Interrupt::Deadline),
            output = fut => Ok(output),
        }
    }
}

/// The LLM gateway
#[derive(Clone)]
pub struct LlmGateway {
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
}

impl LlmGateway {
    /// Gateway with default configuration and HTTP client
    pub fn new() -> GatewayResult<Self> {
        Self::from_config(GatewayConfig::default())
    }

    /// Gateway with the given configuration and an HTTP client built from it
    pub fn from_config(config: GatewayConfig) -> GatewayResult<Self> {
        let client = HttpClient::with_config(&config.connection)?;
        Self::with_transport(config, Arc::new(client))
    }

    /// Gateway over a custom transport
    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn Transport>) -> GatewayResult<Self> {
        ConfigValidator::quiet().validate(&config)?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Legacy entry point that always targets Gemini
    pub async fn call_gemini(&self, options: RetryOptions) -> GatewayResult<RetryResult> {
        self.call(options.with_provider(LlmProvider::Gemini)).await
    }

    /// Call an LLM with automatic provider resolution and retries
    pub async fn call(&self, options: RetryOptions) -> GatewayResult<RetryResult> {
        if options.model.trim().is_empty() {
            return Err(GatewayError::MissingModel);
        }
        if options.api_key.is_empty() {
            return Err(GatewayError::MissingApiKey);
        }
        let policy = self.policy_for(&options)?;

        let provider = resolve_provider(options.provider, &options.model);
        let adapter = provider.adapter();
        let payload = adapter.build_payload(&options.body, &options.model);
        let request = adapter.prepare(
            options.api_key.expose_secret(),
            &options.model,
            payload,
            &options.headers,
            &self.config.endpoints,
        )?;

        info!(
            "Calling {} model {} (up to {} attempts)",
            provider,
            options.model,
            policy.total_attempts()
        );

        let interruption = Interruption {
            deadline_at: options.deadline.and_then(|d| Instant::now().checked_add(d)),
            cancel: options.cancel.as_ref(),
        };
        let result = self
            .execute(adapter, &options.model, request, &policy, &interruption, options.deadline)
            .await;

        match result.failure {
            None => info!(
                "{} call for model {} succeeded after {} attempt(s)",
                provider, options.model, result.attempts
            ),
            Some(failure) => info!(
                "{} call for model {} failed ({:?}) after {} attempt(s): status {:?}",
                provider, options.model, failure, result.attempts, result.status
            ),
        }
        Ok(result)
    }

    /// Retry policy for this call, with per-call overrides applied
    fn policy_for(&self, options: &RetryOptions) -> GatewayResult<RetryPolicy> {
        let mut policy = self.config.retry.clone();
        if let Some(max_retries) = options.max_retries {
            policy.max_retries = max_retries;
        }
        if let Some(initial_delay_ms) = options.initial_delay_ms {
            policy.initial_delay_ms = initial_delay_ms;
        }
        if let Some(multiplier) = options.backoff_multiplier {
            policy.backoff_multiplier = multiplier;
        }
        policy.check().map_err(GatewayError::InvalidRetryPolicy)?;
        Ok(policy)
    }

    /// The attempt loop
    async fn execute(
        &self,
        adapter: &dyn ProviderAdapter,
        model: &str,
        request: OutboundRequest,
        policy: &RetryPolicy,
        interruption: &Interruption<'_>,
        deadline: Option<Duration>,
    ) -> RetryResult {
        let provider = adapter.provider();
        let mut state = CallState::new(provider, model);
        let mut attempt: u32 = 0;

        loop {
            if let Some(interrupt) = interruption.pending() {
                return state.interrupted(interrupt, deadline);
            }

            let outbound = if attempt == 0 {
                request.clone()
            } else {
                request.next_attempt()
            };
            state.attempts = attempt + 1;
            debug!(
                "{} attempt {} for model {} [request_id: {}]",
                provider, state.attempts, model, outbound.request_id
            );

            let sent = match interruption.run(self.transport.send(outbound)).await {
                Ok(sent) => sent,
                Err(interrupt) => return state.interrupted(interrupt, deadline),
            };

            let delay = match sent {
                Ok(response) if response.is_success() => {
                    let status = response.status;
                    return state.succeeded(normalize_success(adapter, model, response), status);
                }
                Ok(response) => {
                    let status = response.status;
                    let message = classify_error(&response.body, status, provider);
                    let retryable = RetryPolicy::is_retryable_status(status);

                    if !(retryable && policy.has_budget_after(attempt)) {
                        let failure = if retryable && policy.total_attempts() > 1 {
                            FailureKind::RateLimitExhausted
                        } else {
                            FailureKind::Fatal
                        };
                        return state.failed(status, message, failure);
                    }

                    state.was_rate_limited = true;
                    let delay = policy
                        .calculate_delay(attempt, response.retry_after())
                        .saturating_add(policy.jitter());
                    warn!(
                        "{} rate limit hit for model {} (status {}). Retrying in {}ms...",
                        provider,
                        model,
                        status,
                        delay.as_millis()
                    );
                    delay
                }
                Err(err) => {
                    let message = err.to_string();
                    if !policy.has_budget_after(attempt) {
                        return state.failed(0, message, FailureKind::Network);
                    }

                    let delay = policy.backoff_delay(attempt).saturating_add(policy.jitter());
                    warn!(
                        "{} network error for model {}: {}. Retrying in {}ms...",
                        provider,
                        model,
                        message,
                        delay.as_millis()
                    );
                    delay
                }
            };

            if let Err(interrupt) = interruption.run(tokio::time::sleep(delay)).await {
                return state.interrupted(interrupt, deadline);
            }
            state.total_delay = state.total_delay.saturating_add(delay);
            attempt += 1;
        }
    }
}

/// Normalize a 2xx response; a body that is not JSON is kept as a string
fn normalize_success(adapter: &dyn ProviderAdapter, model: &str, response: RawResponse) -> LlmResponse {
    let payload = match serde_json::from_str::<Value>(&response.body) {
        Ok(payload) => payload,
        Err(_) => Value::String(response.body),
    };
    adapter.normalize(payload, model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::TransportError;
    use crate::protocol::GenerateRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Transport that counts calls and always fails to connect
    #[derive(Default)]
    struct Refusing {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Transport for Refusing {
        async fn send(&self, _request: OutboundRequest) -> Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Connect("connection refused".to_string()))
        }
    }

    fn gateway(transport: Arc<Refusing>) -> LlmGateway {
        LlmGateway::with_transport(GatewayConfig::default(), transport).unwrap()
    }

    #[tokio::test]
    async fn test_preflight_errors_issue_no_requests() {
        let transport = Arc::new(Refusing::default());
        let gateway = gateway(transport.clone());
        let body = GenerateRequest::from_prompt("hi");

        let err = gateway
            .call(RetryOptions::new("key", "  ", body.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingModel));

        let err = gateway
            .call(RetryOptions::new("", "gpt-4o", body.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingApiKey));

        let err = gateway
            .call(RetryOptions::new("key", "gpt-4o", body.clone()).with_backoff_multiplier(0.5))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRetryPolicy(_)));

        let err = gateway
            .call(RetryOptions::new("key", "gpt-4o", body).with_header("bad header", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidHeader { .. }));

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_uses_full_budget() {
        let transport = Arc::new(Refusing::default());
        let result = gateway(transport.clone())
            .call(RetryOptions::new("key", "gemini-2.0-flash", GenerateRequest::from_prompt("hi")))
            .await
            .unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.status, Some(0));
        assert_eq!(result.failure, Some(FailureKind::Network));
        assert!(!result.was_rate_limited);
        assert!(result.error_message.unwrap().contains("connection refused"));
        // 500 + 1000 plus up to 249ms of jitter each
        assert!(result.total_delay_ms >= 1500 && result.total_delay_ms < 2000);
    }

    #[tokio::test]
    async fn test_already_cancelled_issues_nothing() {
        let transport = Arc::new(Refusing::default());
        let token = CancellationToken::new();
        token.cancel();

        let result = gateway(transport.clone())
            .call(
                RetryOptions::new("key", "claude-3-haiku", GenerateRequest::from_prompt("hi"))
                    .with_cancellation(token),
            )
            .await
            .unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.attempts, 0);
        assert_eq!(result.failure, Some(FailureKind::Cancelled));
        assert_eq!(result.status, None);
        assert_eq!(result.error_message.as_deref(), Some("claude request cancelled"));
        assert_eq!(result.provider, LlmProvider::Claude);
    }

    #[test]
    fn test_policy_overrides() {
        let gateway = gateway(Arc::new(Refusing::default()));
        let options = RetryOptions::new("key", "gpt-4o", GenerateRequest::new())
            .with_max_retries(5)
            .with_initial_delay_ms(100);
        let policy = gateway.policy_for(&options).unwrap();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay_ms, 100);
        assert_eq!(policy.backoff_multiplier, 2.0);
    }
}
