//! HTTP client implementation using reqwest

use crate::config::ConnectionConfig;
use crate::http::{OutboundRequest, RawResponse, Transport, TransportError};
use crate::providers::error::GatewayError;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum response size (10MB)
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Maximum response size to prevent OOM
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, GatewayError> {
        Self::with_config(&ConnectionConfig::default())
    }

    /// Create a new HTTP client from connection settings
    pub fn with_config(config: &ConnectionConfig) -> Result<Self, GatewayError> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .build()
            .map_err(|e| GatewayError::Client(e.without_url().to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// Check response size to prevent OOM
    fn check_content_length(&self, response: &Response) -> Result<(), TransportError> {
        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_size {
                return Err(TransportError::ResponseTooLarge {
                    size: content_length as usize,
                    max: self.max_response_size,
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let request_id = request.request_id;
        debug!(
            "POST {} [request_id: {}]",
            request.redacted_url(),
            request_id
        );

        let response = self
            .client
            .post(request.url)
            .headers(request.headers)
            .header("X-Request-ID", request_id.to_string())
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                let err = TransportError::from(e);
                warn!("Request error [request_id: {}]: {}", request_id, err);
                err
            })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        self.check_content_length(&response)?;

        let body = response.text().await.map_err(|e| {
            TransportError::Body(format!("{} [request_id: {}]", e.without_url(), request_id))
        })?;

        if body.len() > self.max_response_size {
            return Err(TransportError::ResponseTooLarge {
                size: body.len(),
                max: self.max_response_size,
            });
        }

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
