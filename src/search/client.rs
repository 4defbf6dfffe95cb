//! Search API client
//!
//! Sends search requests with the current bearer token, retrying through the
//! token provider on authorization failures, and normalizes the response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::StatusCode;

use crate::config::search::{MAX_ATTEMPTS, SEARCH_TIMEOUT_SECS};
use crate::config::Config;
use crate::error::{Result, SearchError, SearchMcpError, ValidationError};
use crate::search::auth::TokenProvider;
use crate::search::retry::{AttemptState, CallOutcome, RetryMachine};
use crate::search::scope::build_request;
use crate::search::types::{SearchApiResponse, SearchPayload, SearchQuery, SearchRequest, SearchResult};

/// Search API client
pub struct SearchGateway {
    /// HTTP client
    http_client: reqwest::Client,

    /// Search endpoint URL
    search_endpoint: String,

    /// Client id, used for tokens and as the website id
    client_id: String,

    /// Client shortcode
    client_shortcode: String,

    /// Token provider
    tokens: Arc<TokenProvider>,

    /// Retry bound
    retry: RetryMachine,

    /// Timeout for one search call
    timeout: Duration,
}

impl SearchGateway {
    /// Create a new search gateway
    pub fn new(
        search_endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_shortcode: impl Into<String>,
        tokens: Arc<TokenProvider>,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            search_endpoint: search_endpoint.into(),
            client_id: client_id.into(),
            client_shortcode: client_shortcode.into(),
            tokens,
            retry: RetryMachine::new(MAX_ATTEMPTS),
            timeout: Duration::from_secs(SEARCH_TIMEOUT_SECS),
        }
    }

    /// Create a search gateway from configuration
    pub fn from_config(config: &Config, tokens: Arc<TokenProvider>) -> Self {
        Self::new(
            config.search_endpoint.clone(),
            config.client_id.clone(),
            config.client_shortcode.clone(),
            tokens,
        )
    }

    /// Override the timeout applied to each search call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Client id this gateway searches for
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Build the request envelope for a query without sending it
    pub fn build_request(&self, query: &SearchQuery) -> SearchRequest {
        build_request(query, &self.client_id, &self.client_shortcode)
    }

    /// Run a search
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        if query.size == 0 {
            return Err(ValidationError::InvalidParameter {
                name: "size".to_string(),
                message: "must be greater than 0".to_string(),
            }
            .into());
        }

        tracing::info!("Searching for '{}' on website {}", query.query, self.client_id);
        let request = self.build_request(query);

        let started = Instant::now();
        let payload = self.send_with_retry(&request).await.map_err(|e| {
            tracing::error!("Search failed: {}", e);
            e
        })?;

        let mut result = SearchResult::from_payload(payload, query.start, query.size, 0);
        result.execution_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            "Search for '{}' returned {} of {} results in {}ms",
            query.query,
            result.results.len(),
            result.pagination.total_results,
            result.execution_time_ms
        );

        Ok(result)
    }

    /// Drive the retry state machine to completion
    async fn send_with_retry(&self, request: &SearchRequest) -> Result<SearchPayload> {
        let mut state = self.retry.start();

        loop {
            state = match state {
                AttemptState::NeedToken { attempt } => {
                    let token = self.tokens.get_token(&self.client_id).await;
                    self.retry.on_token(attempt, token)
                }
                AttemptState::Calling { attempt, token } => {
                    tracing::debug!(
                        "Sending search request (attempt {}): {}",
                        attempt,
                        serde_json::to_string(request).unwrap_or_default()
                    );
                    let outcome = self.send_once(request, &token).await;
                    self.retry.on_outcome(attempt, outcome)
                }
                AttemptState::RetryableFailure { attempt } => {
                    tracing::warn!(
                        "Received 401 Unauthorized from search API (attempt {}/{}), invalidating token",
                        attempt,
                        self.retry.max_attempts()
                    );
                    self.tokens.invalidate(&self.client_id).await;
                    self.retry.on_retryable(attempt)
                }
                AttemptState::Success(payload) => return Ok(payload),
                AttemptState::FatalFailure(e) => return Err(e),
            };
        }
    }

    /// Make one outbound search call
    async fn send_once(&self, request: &SearchRequest, token: &str) -> CallOutcome<SearchPayload> {
        let response = match self
            .http_client
            .post(&self.search_endpoint)
            .bearer_auth(token)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return CallOutcome::Failed(self.request_error(e)),
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return CallOutcome::Unauthorized;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return CallOutcome::Failed(
                SearchError::Status {
                    status: status.as_u16(),
                    body,
                }
                .into(),
            );
        }

        let data: SearchApiResponse = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                return CallOutcome::Failed(
                    SearchError::InvalidResponse {
                        message: e.to_string(),
                    }
                    .into(),
                )
            }
        };

        match data.payload {
            Some(payload) => CallOutcome::Success(payload),
            None => CallOutcome::Failed(SearchError::MissingPayload.into()),
        }
    }

    fn request_error(&self, err: reqwest::Error) -> SearchMcpError {
        if err.is_timeout() {
            SearchError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
            .into()
        } else {
            SearchError::RequestFailed {
                message: err.to_string(),
            }
            .into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_size_rejected_without_network() {
        let tokens = Arc::new(TokenProvider::new("http://127.0.0.1:9/token", "secret"));
        let gateway = SearchGateway::new("http://127.0.0.1:9/search", "client", "sc", tokens);

        let query = SearchQuery {
            query: "shirts".to_string(),
            size: 0,
            ..Default::default()
        };
        let err = gateway.search(&query).await.unwrap_err();
        assert!(matches!(err, SearchMcpError::Validation(_)));
    }

    #[test]
    fn test_build_request_uses_client_settings() {
        let tokens = Arc::new(TokenProvider::new("http://127.0.0.1:9/token", "secret"));
        let gateway = SearchGateway::new("http://127.0.0.1:9/search", "MyClient", "shop", tokens);

        let request = gateway.build_request(&SearchQuery {
            query: "tyres".to_string(),
            start: 10,
            size: 15,
            ..Default::default()
        });
        assert_eq!(request.website_id, "myclient");
        assert_eq!(request.client, "shop");
        assert_eq!(request.start, 10);
        assert_eq!(request.size, 15);
    }
}
