//! HTTP transport
//!
//! Accepts one JSON-RPC message per POST on the configured message path and
//! replies with the JSON-RPC response, or `202 Accepted` for notifications.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use crate::error::{McpError, Result};
use crate::mcp::server::McpServer;

/// Build the router serving `server` on `message_path`
pub fn router(server: Arc<McpServer>, message_path: &str) -> Router {
    let path = if message_path.starts_with('/') {
        message_path.to_string()
    } else {
        format!("/{}", message_path)
    };

    Router::new()
        .route(&path, post(handle_message))
        .with_state(server)
}

async fn handle_message(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Serve until the listener fails
pub async fn serve(server: Arc<McpServer>, addr: &str, message_path: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting MCP Search Server on http://{}{}", addr, message_path);

    axum::serve(listener, router(server, message_path))
        .await
        .map_err(|e| McpError::TransportError {
            message: e.to_string(),
        })?;

    Ok(())
}
