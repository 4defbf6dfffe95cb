//! Error types for the Product Search MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the Product Search MCP Server
#[derive(Error, Debug)]
pub enum SearchMcpError {
    /// Token exchange errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Search API errors
    #[error("Search API error: {0}")]
    Search(#[from] SearchError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client-credentials exchange errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Client ID is required")]
    MissingClientId,

    #[error("Token request failed: {message}")]
    RequestFailed { message: String },

    #[error("Token request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Token response could not be decoded: {message}")]
    InvalidResponse { message: String },

    #[error("Token response did not contain an access token")]
    MissingAccessToken,
}

/// Search API errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {message}")]
    RequestFailed { message: String },

    #[error("Search request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Search API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Search response could not be decoded: {message}")]
    InvalidResponse { message: String },

    #[error("Search response did not contain a payload")]
    MissingPayload,

    #[error("Search failed after {attempts} attempts due to authorization errors")]
    AuthorizationRetryExhausted { attempts: u32 },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid parameter: {name} - {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] validator::ValidationErrors),
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Unknown resource: {uri}")]
    UnknownResource { uri: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },
}

/// Result type alias for Product Search MCP operations
pub type Result<T> = std::result::Result<T, SearchMcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::MissingEnvVar {
            var: "CLIENT_SECRET".to_string(),
        };
        assert!(err.to_string().contains("CLIENT_SECRET"));
    }

    #[test]
    fn test_error_conversion() {
        let auth_err = AuthError::MissingAccessToken;
        let err: SearchMcpError = auth_err.into();
        assert!(matches!(err, SearchMcpError::Auth(_)));
    }

    #[test]
    fn test_retry_exhausted_message() {
        let err: SearchMcpError = SearchError::AuthorizationRetryExhausted { attempts: 3 }.into();
        assert!(err.to_string().contains("after 3 attempts"));
    }
}
