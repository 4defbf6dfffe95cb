//! Configuration management for the Product Search MCP Server
//!
//! Handles environment variables and configuration loading.

use crate::error::{ConfigError, Result};

/// Configuration for the Product Search MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Client-credentials token endpoint
    pub auth_endpoint: String,

    /// Search API endpoint
    pub search_endpoint: String,

    /// Client ID used for authentication and as the website id
    pub client_id: String,

    /// Client shortcode identifying the catalog
    pub client_shortcode: String,

    /// Client secret for authentication
    pub client_secret: String,

    /// HTTP transport bind host
    pub host: String,

    /// HTTP transport bind port
    pub port: u16,

    /// Path the HTTP transport accepts JSON-RPC messages on
    pub message_path: String,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            value(key).ok_or_else(|| ConfigError::MissingEnvVar {
                var: key.to_string(),
            })
        };

        let port = match value("PORT") {
            Some(p) => p.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                var: "PORT".to_string(),
                message: e.to_string(),
            })?,
            None => defaults::PORT,
        };

        Ok(Self {
            auth_endpoint: required("AUTH_ENDPOINT")?,
            search_endpoint: required("SEARCH_API_ENDPOINT")?,
            client_id: required("CLIENT_ID")?,
            client_shortcode: required("CLIENT_SHORTCODE")?,
            client_secret: required("CLIENT_SECRET")?,
            host: value("HOST").unwrap_or_else(|| defaults::HOST.to_string()),
            port,
            message_path: value("MESSAGE_PATH").unwrap_or_else(|| defaults::MESSAGE_PATH.to_string()),
        })
    }

    /// Website id sent to the search API
    pub fn website_id(&self) -> String {
        self.client_id.to_lowercase()
    }

    /// Socket address string for the HTTP transport
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Server defaults
pub mod defaults {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 3000;
    pub const MESSAGE_PATH: &str = "/mcp/messages/";
}

/// Search API constants
pub mod search {
    /// Seconds subtracted from a token's declared lifetime
    pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 300;

    /// Lifetime assumed when the token endpoint omits `expires_in`
    pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

    pub const AUTH_TIMEOUT_SECS: u64 = 10;
    pub const SEARCH_TIMEOUT_SECS: u64 = 15;

    /// Attempts made before giving up on repeated 401 responses
    pub const MAX_ATTEMPTS: u32 = 3;

    pub const DEFAULT_PAGE_SIZE: u32 = 20;
}
