//! MCP Tool definitions and handlers
//!
//! Defines the search tools and their implementations.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::config::search::DEFAULT_PAGE_SIZE;
use crate::error::{McpError, Result, SearchMcpError, ValidationError};
use crate::mcp::types::{CallToolResult, Tool};
use crate::search::client::SearchGateway;
use crate::search::types::{FilterSpec, SearchQuery, SortSpec};

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Arguments for `search`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct SearchArgs {
    /// The search query text (e.g. "blue shirts", "tires", "dress")
    pub query: String,

    /// Starting position for pagination (0-based index)
    #[serde(default)]
    pub start: u32,

    /// Number of results to return per page
    #[serde(default = "default_size")]
    #[validate(range(min = 1))]
    pub size: u32,

    /// Optional filters to narrow search results, e.g.
    /// {"field": "color", "value": "blue", "operator": "eq"} or
    /// {"field": "price", "value": {"min": 20, "max": 100}, "operator": "range"}
    #[serde(default)]
    pub filters: Option<Vec<FilterSpec>>,
}

/// Arguments for `filtered_search`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct FilteredSearchArgs {
    /// The search query text (can be empty when filtering only)
    pub query: String,

    /// Filters to narrow search results (at least one)
    #[validate(length(min = 1))]
    pub filters: Vec<FilterSpec>,

    /// Starting position for pagination (0-based index)
    #[serde(default)]
    pub start: u32,

    /// Number of results to return per page
    #[serde(default = "default_size")]
    #[validate(range(min = 1))]
    pub size: u32,
}

/// Arguments for `sorted_search`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct SortedSearchArgs {
    /// The search query text (can be empty when filtering only)
    pub query: String,

    /// Sort specifications, primary key first, e.g.
    /// {"field": "price", "order": "asc", "type": "number"}
    #[validate(length(min = 1))]
    pub sort: Vec<SortSpec>,

    /// Starting position for pagination (0-based index)
    #[serde(default)]
    pub start: u32,

    /// Number of results to return per page
    #[serde(default = "default_size")]
    #[validate(range(min = 1))]
    pub size: u32,

    /// Optional filters, same format as the search tool
    #[serde(default)]
    pub filters: Option<Vec<FilterSpec>>,
}

/// Tool handler
pub struct ToolHandler {
    gateway: Arc<SearchGateway>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(gateway: Arc<SearchGateway>) -> Self {
        Self { gateway }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            tool_def::<SearchArgs>("search", "Execute a product search with optional filters"),
            tool_def::<FilteredSearchArgs>("filtered_search", "Search products with specific filters"),
            tool_def::<SortedSearchArgs>("sorted_search", "Search products with custom sorting options"),
        ]
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        let query = match name {
            "search" => parse_args::<SearchArgs>(args).map(|a| SearchQuery {
                query: a.query,
                start: a.start,
                size: a.size,
                filters: a.filters.unwrap_or_default(),
                sort: Vec::new(),
            }),
            "filtered_search" => parse_args::<FilteredSearchArgs>(args).map(|a| SearchQuery {
                query: a.query,
                start: a.start,
                size: a.size,
                filters: a.filters,
                sort: Vec::new(),
            }),
            "sorted_search" => parse_args::<SortedSearchArgs>(args).map(|a| SearchQuery {
                query: a.query,
                start: a.start,
                size: a.size,
                filters: a.filters.unwrap_or_default(),
                sort: a.sort,
            }),
            _ => Err(McpError::UnknownTool {
                name: name.to_string(),
            }
            .into()),
        };

        let query = match query {
            Ok(q) => q,
            Err(e) => return CallToolResult::error(e.to_string()),
        };

        tracing::info!(
            "Tool {} called for '{}' ({} filters, {} sort keys)",
            name,
            query.query,
            query.filters.len(),
            query.sort.len()
        );

        match self.gateway.search(&query).await {
            Ok(result) => match serde_json::to_string_pretty(&result) {
                Ok(text) => CallToolResult::text(text),
                Err(e) => CallToolResult::error(e.to_string()),
            },
            Err(e) => CallToolResult::error(format!("Search operation failed: {}", e)),
        }
    }
}

/// Deserialize and validate tool arguments
fn parse_args<T>(args: Value) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let args: T = serde_json::from_value(args).map_err(|e| {
        SearchMcpError::Mcp(McpError::InvalidParams {
            message: e.to_string(),
        })
    })?;
    args.validate().map_err(ValidationError::from)?;
    Ok(args)
}

fn tool_def<T: JsonSchema>(name: &str, description: &str) -> Tool {
    let schema = schemars::schema_for!(T);
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"})),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_args_defaults() {
        let args: SearchArgs = parse_args(json!({"query": "dress"})).unwrap();
        assert_eq!(args.start, 0);
        assert_eq!(args.size, 20);
        assert!(args.filters.is_none());
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = parse_args::<SearchArgs>(json!({"query": "dress", "size": 0})).unwrap_err();
        assert!(matches!(err, SearchMcpError::Validation(_)));
    }

    #[test]
    fn test_negative_start_rejected() {
        let err = parse_args::<SearchArgs>(json!({"query": "dress", "start": -1})).unwrap_err();
        assert!(matches!(err, SearchMcpError::Mcp(McpError::InvalidParams { .. })));
    }

    #[test]
    fn test_filtered_search_requires_a_filter() {
        let err = parse_args::<FilteredSearchArgs>(json!({"query": "", "filters": []})).unwrap_err();
        assert!(matches!(err, SearchMcpError::Validation(_)));

        let missing = parse_args::<FilteredSearchArgs>(json!({"query": ""}));
        assert!(missing.is_err());
    }

    #[test]
    fn test_sorted_search_requires_sort() {
        let err = parse_args::<SortedSearchArgs>(json!({"query": "laptop", "sort": []})).unwrap_err();
        assert!(matches!(err, SearchMcpError::Validation(_)));

        let ok: SortedSearchArgs = parse_args(json!({
            "query": "laptop",
            "sort": [{"field": "price", "order": "asc", "type": "number"}]
        }))
        .unwrap();
        assert_eq!(ok.sort.len(), 1);
    }

    #[test]
    fn test_tool_schemas_are_objects() {
        for tool in [
            tool_def::<SearchArgs>("search", ""),
            tool_def::<FilteredSearchArgs>("filtered_search", ""),
            tool_def::<SortedSearchArgs>("sorted_search", ""),
        ] {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["properties"]["query"].is_object());
        }

        let sorted = tool_def::<SortedSearchArgs>("sorted_search", "");
        let required = sorted.input_schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("sort")));
        assert!(required.contains(&json!("query")));
    }
}
