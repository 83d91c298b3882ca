//! GraphQL HTTP transport and client.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::GraphqlClientError;
use crate::operation::{GraphqlQuery, GraphqlRequest, GraphqlResponse, Variables};
use crate::retry::RetryPolicy;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// GraphQL client metrics.
#[derive(Debug, Default)]
#[allow(clippy::struct_field_names)]
pub struct GraphqlClientMetrics {
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    requests_retried: AtomicU64,
}

impl GraphqlClientMetrics {
    /// Snapshot current metrics.
    #[must_use]
    pub fn snapshot(&self) -> GraphqlClientMetricsSnapshot {
        GraphqlClientMetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_error: self.requests_error.load(Ordering::Relaxed),
            requests_retried: self.requests_retried.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_field_names)]
pub struct GraphqlClientMetricsSnapshot {
    /// Total requests.
    pub requests_total: u64,
    /// Successful requests.
    pub requests_success: u64,
    /// Failed requests.
    pub requests_error: u64,
    /// Retries performed.
    pub requests_retried: u64,
}

/// GraphQL client configuration.
#[derive(Debug, Clone)]
pub struct GraphqlClientConfig {
    /// Default headers applied to every request.
    pub headers: HeaderMap,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry policy.
    pub retry: RetryPolicy,
}

impl Default for GraphqlClientConfig {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            headers,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// GraphQL client builder.
#[derive(Debug, Clone)]
pub struct GraphqlClientBuilder {
    endpoint: String,
    config: GraphqlClientConfig,
}

impl GraphqlClientBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            config: GraphqlClientConfig::default(),
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.config.headers.insert(name, value);
        self
    }

    /// Add a bearer token header.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        if let Ok(header) = HeaderValue::from_str(&value) {
            self.config
                .headers
                .insert(reqwest::header::AUTHORIZATION, header);
        }
        self
    }

    /// Set timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<GraphqlClient, GraphqlClientError> {
        GraphqlClient::with_config(self.endpoint, self.config)
    }
}

/// GraphQL client.
///
/// Cheap to clone; clones share the HTTP connection pool and metrics.
/// There is no other shared mutable state, so concurrent use from
/// independent callers is safe.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    endpoint: String,
    http: reqwest::Client,
    config: GraphqlClientConfig,
    metrics: Arc<GraphqlClientMetrics>,
}

impl GraphqlClient {
    /// Create a new client with default configuration.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self::with_config(endpoint.clone(), GraphqlClientConfig::default()).unwrap_or_else(|_| {
            Self::new_with_client(
                endpoint,
                reqwest::Client::new(),
                GraphqlClientConfig::default(),
            )
        })
    }

    /// Create a client with custom configuration.
    pub fn with_config(
        endpoint: impl Into<String>,
        config: GraphqlClientConfig,
    ) -> Result<Self, GraphqlClientError> {
        let http = reqwest::Client::builder()
            .default_headers(config.headers.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self::new_with_client(endpoint, http, config))
    }

    fn new_with_client(
        endpoint: impl Into<String>,
        http: reqwest::Client,
        config: GraphqlClientConfig,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            http,
            config,
            metrics: Arc::new(GraphqlClientMetrics::default()),
        }
    }

    /// Return client metrics snapshot.
    #[must_use]
    pub fn metrics(&self) -> GraphqlClientMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The retry policy in effect.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    /// Execute a query document with the given variables.
    ///
    /// Transport and JSON decode run under the retry policy; the returned
    /// response may still carry GraphQL errors.
    pub async fn execute(
        &self,
        query: &str,
        variables: &Variables,
    ) -> Result<GraphqlResponse<Value>, GraphqlClientError> {
        let request = GraphqlRequest::new(GraphqlQuery::new(query), variables.clone());
        self.execute_request(&request).await
    }

    /// Execute a query and return its data tree, treating a non-empty
    /// `errors` array as a permanent failure.
    pub async fn execute_data(
        &self,
        query: &str,
        variables: &Variables,
    ) -> Result<Value, GraphqlClientError> {
        let response = self.execute(query, variables).await?;
        response.into_data()
    }

    /// Execute an arbitrary request.
    pub async fn execute_request<V: Serialize>(
        &self,
        request: &GraphqlRequest<V>,
    ) -> Result<GraphqlResponse<Value>, GraphqlClientError> {
        let body = request.to_body()?;
        self.metrics.requests_total.fetch_add(1, Ordering::Relaxed);

        let mut attempts: u64 = 0;
        let result = self
            .config
            .retry
            .run(|| {
                attempts += 1;
                self.fetch(&body)
            })
            .await;
        if attempts > 1 {
            self.metrics
                .requests_retried
                .fetch_add(attempts - 1, Ordering::Relaxed);
        }
        let response = result?;

        if response.errors.is_empty() {
            self.metrics
                .requests_success
                .fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.requests_error.fetch_add(1, Ordering::Relaxed);
        }

        Ok(response)
    }

    /// One round trip: POST plus JSON decode, no retry.
    async fn fetch(&self, body: &[u8]) -> Result<GraphqlResponse<Value>, GraphqlClientError> {
        let bytes = self.send_once(body).await?;
        debug!(endpoint = %self.endpoint, bytes = bytes.len(), "GraphQL round trip complete");
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_once(&self, body_bytes: &[u8]) -> Result<Vec<u8>, GraphqlClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .body(body_bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = truncate_body(&bytes);
            self.metrics.requests_error.fetch_add(1, Ordering::Relaxed);
            return Err(GraphqlClientError::HttpStatus {
                status,
                body,
                retry_after,
            });
        }

        Ok(bytes.to_vec())
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get(RETRY_AFTER)?;
    let value = header.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    None
}

fn truncate_body(bytes: &[u8]) -> String {
    const MAX_LEN: usize = 4096;
    let mut body = String::from_utf8_lossy(bytes).to_string();
    if body.len() > MAX_LEN {
        // Back the cut point off to a char boundary so a multi-byte
        // character straddling the limit cannot panic the error path.
        let mut cut = MAX_LEN;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_passes_short_bodies_through() {
        assert_eq!(truncate_body(b"backend unavailable"), "backend unavailable");
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        // 1 + 3000 * 2 = 6001 bytes; byte 4096 falls inside a 2-byte char.
        let mut body = String::from("a");
        body.push_str(&"é".repeat(3000));

        let truncated = truncate_body(body.as_bytes());

        assert!(truncated.ends_with('…'));
        assert_eq!(truncated.len(), 4095 + '…'.len_utf8());
        assert!(body.starts_with(truncated.trim_end_matches('…')));
    }
}
