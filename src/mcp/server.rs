//! MCP Server implementation
//!
//! Dispatches JSON-RPC messages to the tool and resource handlers and runs
//! the stdio transport.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::config::Config;
use crate::error::Result;
use crate::mcp::resources::ResourceHandler;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;
use crate::search::client::SearchGateway;

/// MCP Server info
const SERVER_NAME: &str = "MCP Search Server";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for product search
pub struct McpServer {
    /// Tool handler
    tool_handler: ToolHandler,

    /// Resource handler
    resource_handler: ResourceHandler,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(gateway: Arc<SearchGateway>, config: &Config) -> Self {
        Self {
            tool_handler: ToolHandler::new(gateway),
            resource_handler: ResourceHandler::new(config.website_id(), config.client_shortcode.clone()),
        }
    }

    /// Run the server on stdio
    pub async fn run_stdio(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        tracing::info!("MCP server listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line).await {
                let mut response_str = serde_json::to_string(&response)?;
                response_str.push('\n');
                stdout.write_all(response_str.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle an incoming JSON-RPC message
    ///
    /// Returns `None` for notifications.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(None, JsonRpcError::parse_error(e.to_string())));
            }
        };

        self.handle_request(request).await
    }

    /// Handle a parsed JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!("Handling {}", request.method);

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(),
            methods::INITIALIZED => return None,
            methods::PING => Ok(serde_json::json!({})),
            methods::LIST_TOOLS => self.handle_list_tools(),
            methods::CALL_TOOL => Ok(self.handle_call_tool(&request).await),
            methods::LIST_RESOURCES => self.handle_list_resources(),
            methods::READ_RESOURCE => self.handle_read_resource(&request),
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        if request.is_notification() {
            return None;
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::error(request.id, error),
        })
    }

    /// Handle initialize request
    fn handle_initialize(&self) -> std::result::Result<Value, JsonRpcError> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
                resources: Some(ResourcesCapability::default()),
            },
        };

        to_result(&result)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> std::result::Result<Value, JsonRpcError> {
        to_result(&ListToolsResult {
            tools: self.tool_handler.list_tools(),
        })
    }

    /// Handle call tool request
    ///
    /// Tool failures are reported inside the result, not as JSON-RPC errors.
    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> Value {
        let result = match request.params.as_ref() {
            Some(p) => match serde_json::from_value::<CallToolParams>(p.clone()) {
                Ok(params) => self.tool_handler.call_tool(&params.name, params.arguments).await,
                Err(e) => CallToolResult::error(format!("Invalid tool parameters: {}", e)),
            },
            None => CallToolResult::error("Missing tool parameters"),
        };

        serde_json::to_value(&result).unwrap_or_else(|e| {
            serde_json::json!({
                "content": [{"type": "text", "text": format!("Error: {}", e)}],
                "isError": true
            })
        })
    }

    /// Handle list resources request
    fn handle_list_resources(&self) -> std::result::Result<Value, JsonRpcError> {
        to_result(&ListResourcesResult {
            resources: self.resource_handler.list_resources(),
        })
    }

    /// Handle read resource request
    fn handle_read_resource(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: ReadResourceParams = request
            .params
            .clone()
            .ok_or_else(|| JsonRpcError::invalid_params("Missing resource uri"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
            })?;

        let content = self
            .resource_handler
            .read_resource(&params.uri)
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;

        to_result(&ReadResourceResult {
            contents: vec![content],
        })
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::auth::TokenProvider;
    use serde_json::json;

    fn server() -> McpServer {
        let config = Config::from_lookup(|key| {
            let value = match key {
                "AUTH_ENDPOINT" => "http://127.0.0.1:9/token",
                "SEARCH_API_ENDPOINT" => "http://127.0.0.1:9/search",
                "CLIENT_ID" => "Client",
                "CLIENT_SHORTCODE" => "sc",
                "CLIENT_SECRET" => "secret",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap();
        let tokens = Arc::new(TokenProvider::from_config(&config));
        let gateway = Arc::new(SearchGateway::from_config(&config, tokens));
        McpServer::new(gateway, &config)
    }

    #[test]
    fn test_server_info() {
        assert_eq!(SERVER_NAME, "MCP Search Server");
    }

    #[tokio::test]
    async fn test_initialize_advertises_tools_and_resources() {
        let server = server();
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn test_initialized_notification() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":"a","method":"prompts/list"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
        assert_eq!(response.id, Some(RequestId::String("a".to_string())));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = server().handle_message("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_list_tools() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap();
        let names: Vec<String> = response.result.unwrap()["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["search", "filtered_search", "sorted_search"]);
    }

    #[tokio::test]
    async fn test_call_unknown_tool_is_tool_error() {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "delete_everything", "arguments": {}}
        });
        let response = server().handle_message(&request.to_string()).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_read_resource() {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "resources/read",
            "params": {"uri": "resource://search/docs"}
        });
        let response = server().handle_message(&request.to_string()).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["contents"][0]["mimeType"], "application/json");
    }

    #[tokio::test]
    async fn test_read_unknown_resource() {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "resources/read",
            "params": {"uri": "resource://nope"}
        });
        let response = server().handle_message(&request.to_string()).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }
}
