//! Client-credentials authentication for the Search API
//!
//! Handles:
//! - Exchanging client id and secret for a bearer token
//! - Caching tokens per client id until shortly before they expire
//! - Evicting a token after the search API rejects it

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::search::{AUTH_TIMEOUT_SECS, DEFAULT_TOKEN_LIFETIME_SECS, TOKEN_SAFETY_MARGIN_SECS};
use crate::config::Config;
use crate::error::{AuthError, Result};

/// Source of the current time in Unix seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A cached bearer credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Access token
    pub token: String,

    /// Token type (usually "Bearer")
    pub kind: String,

    /// Unix seconds after which the token is no longer used; already
    /// includes the safety margin
    pub expires_at: i64,
}

impl Credential {
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expires_at > now
    }
}

/// Credentials keyed by client id
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: RwLock<HashMap<String, Credential>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a credential for the client if one is cached
    pub async fn get(&self, client_id: &str) -> Option<Credential> {
        self.entries.read().await.get(client_id).cloned()
    }

    /// Store a credential, replacing any existing one
    pub async fn insert(&self, client_id: &str, credential: Credential) {
        self.entries
            .write()
            .await
            .insert(client_id.to_string(), credential);
    }

    /// Remove the credential for a client, returning whether one existed
    pub async fn invalidate(&self, client_id: &str) -> bool {
        self.entries.write().await.remove(client_id).is_some()
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Token response from the auth endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default = "default_token_type")]
    token_type: String,
}

/// Obtains and caches bearer tokens from the auth endpoint
pub struct TokenProvider {
    /// HTTP client
    http_client: reqwest::Client,

    /// Token endpoint URL
    auth_endpoint: String,

    /// Client secret, omitted from the exchange when empty
    client_secret: String,

    /// Cached credentials
    cache: Arc<TokenCache>,

    /// Time source for expiry checks
    clock: Arc<dyn Clock>,

    /// Timeout for one exchange
    timeout: Duration,
}

impl TokenProvider {
    /// Create a token provider with its own cache and the wall clock
    pub fn new(auth_endpoint: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::with_store(
            auth_endpoint,
            client_secret,
            Arc::new(TokenCache::new()),
            Arc::new(SystemClock),
        )
    }

    /// Create a token provider from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.auth_endpoint.clone(), config.client_secret.clone())
    }

    /// Create a token provider with an injected cache and clock
    pub fn with_store(
        auth_endpoint: impl Into<String>,
        client_secret: impl Into<String>,
        cache: Arc<TokenCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            auth_endpoint: auth_endpoint.into(),
            client_secret: client_secret.into(),
            cache,
            clock,
            timeout: Duration::from_secs(AUTH_TIMEOUT_SECS),
        }
    }

    /// Override the timeout applied to each exchange
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get a valid access token, exchanging credentials if necessary
    pub async fn get_token(&self, client_id: &str) -> Result<String> {
        if client_id.is_empty() {
            return Err(AuthError::MissingClientId.into());
        }

        let now = self.clock.now();
        if let Some(credential) = self.cache.get(client_id).await {
            if credential.is_valid_at(now) {
                return Ok(credential.token);
            }
        }

        tracing::info!("Fetching new auth token for client {}", client_id);
        let credential = self.exchange(client_id, now).await.map_err(|e| {
            tracing::error!("Auth token request failed: {}", e);
            e
        })?;

        let token = credential.token.clone();
        self.cache.insert(client_id, credential).await;
        Ok(token)
    }

    /// Evict the cached token for a client
    pub async fn invalidate(&self, client_id: &str) {
        if self.cache.invalidate(client_id).await {
            tracing::debug!("Invalidated cached token for client {}", client_id);
        }
    }

    /// Run one client-credentials exchange
    async fn exchange(&self, client_id: &str, now: i64) -> std::result::Result<Credential, AuthError> {
        let mut form = vec![
            ("client_id", client_id),
            ("grant_type", "client_credentials"),
        ];
        if !self.client_secret.is_empty() {
            form.push(("client_secret", self.client_secret.as_str()));
        }

        let response = self
            .http_client
            .post(&self.auth_endpoint)
            .form(&form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected { status, body });
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            AuthError::InvalidResponse {
                message: e.to_string(),
            }
        })?;

        let token = token_response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        let lifetime = token_response
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Ok(Credential {
            token,
            kind: token_response.token_type,
            expires_at: now
                .saturating_add(lifetime)
                .saturating_sub(TOKEN_SAFETY_MARGIN_SECS),
        })
    }

    fn request_error(&self, err: reqwest::Error) -> AuthError {
        if err.is_timeout() {
            AuthError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            AuthError::RequestFailed {
                message: err.to_string(),
            }
        }
    }
}
