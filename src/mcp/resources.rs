//! MCP resources
//!
//! Static JSON documents describing the search tools, their response
//! shape, and example invocations.

use serde_json::{json, Value};

use crate::error::{McpError, Result};
use crate::mcp::types::{Resource, ResourceContent};
use crate::search::types::SearchResult;

pub const DOCS_URI: &str = "resource://search/docs";
pub const RESPONSE_SCHEMA_URI: &str = "resource://search/response-schema";
pub const EXAMPLES_URI: &str = "resource://search/examples";

const JSON_MIME: &str = "application/json";

/// Serves the documentation resources
pub struct ResourceHandler {
    website_id: String,
    client_shortcode: String,
}

impl ResourceHandler {
    pub fn new(website_id: impl Into<String>, client_shortcode: impl Into<String>) -> Self {
        Self {
            website_id: website_id.into(),
            client_shortcode: client_shortcode.into(),
        }
    }

    /// List all available resources
    pub fn list_resources(&self) -> Vec<Resource> {
        vec![
            resource_def(DOCS_URI, "Search Documentation", "Documentation for the product search API"),
            resource_def(
                RESPONSE_SCHEMA_URI,
                "Search Response Schema",
                "Schema describing the format of search response",
            ),
            resource_def(EXAMPLES_URI, "Search Examples", "Examples of different search patterns"),
        ]
    }

    /// Read a resource by URI
    pub fn read_resource(&self, uri: &str) -> Result<ResourceContent> {
        let body = match uri {
            DOCS_URI => self.docs(),
            RESPONSE_SCHEMA_URI => response_schema()?,
            EXAMPLES_URI => examples(),
            _ => {
                return Err(McpError::UnknownResource {
                    uri: uri.to_string(),
                }
                .into())
            }
        };

        Ok(ResourceContent {
            uri: uri.to_string(),
            mime_type: Some(JSON_MIME.to_string()),
            text: serde_json::to_string_pretty(&body)?,
        })
    }

    fn docs(&self) -> Value {
        json!({
            "name": "search",
            "description": "Execute a product search against the Search API with optional filters",
            "parameters": {
                "query": {
                    "type": "string",
                    "description": "The search query string (e.g., 'blue shirts', 'tires')"
                },
                "start": {
                    "type": "integer",
                    "description": "Starting position for results (0-based)",
                    "default": 0
                },
                "size": {
                    "type": "integer",
                    "description": "Number of results per page",
                    "default": 20
                },
                "filters": {
                    "type": "array",
                    "description": "Optional filters to narrow search results",
                    "items": {
                        "type": "object",
                        "properties": {
                            "field": {
                                "type": "string",
                                "description": "Field name to filter on (e.g., 'color', 'price', 'product_category')"
                            },
                            "value": {
                                "type": ["string", "number", "object"],
                                "description": "String/number for equality or gte/lte, object with min/max for range"
                            },
                            "operator": {
                                "type": "string",
                                "enum": ["eq", "range", "gte", "lte"],
                                "description": "'eq' for equality, 'range' for min/max, 'gte'/'lte' for a single bound",
                                "default": "eq"
                            }
                        },
                        "required": ["field", "value"]
                    }
                }
            },
            "tools": {
                "search": {
                    "description": "Basic search with optional filters",
                    "parameters": ["query", "start", "size", "filters"]
                },
                "filtered_search": {
                    "description": "Search with mandatory filters",
                    "parameters": ["query", "filters", "start", "size"]
                },
                "sorted_search": {
                    "description": "Search with custom sorting options",
                    "parameters": ["query", "sort", "start", "size", "filters"]
                }
            },
            "sorting": {
                "description": "Sorting specifications for sorted_search tool",
                "sort_spec": {
                    "field": {
                        "type": "string",
                        "description": "Field name to sort by (e.g., 'price', 'popularity')"
                    },
                    "order": {
                        "type": "string",
                        "enum": ["asc", "desc"],
                        "default": "desc"
                    },
                    "type": {
                        "type": "string",
                        "enum": ["number", "text", "date"],
                        "default": "number"
                    }
                },
                "sort_examples": [
                    {"description": "Sort by price (lowest first)", "sort": {"field": "price", "order": "asc", "type": "number"}},
                    {"description": "Sort by popularity (highest first)", "sort": {"field": "popularity", "order": "desc", "type": "number"}},
                    {"description": "Sort by name (alphabetical)", "sort": {"field": "title", "order": "asc", "type": "text"}}
                ]
            },
            "internal_configuration": {
                "website_id": self.website_id,
                "client_shortcode": self.client_shortcode
            },
            "filter_examples": [
                {"description": "Filter by color (equality)", "filter": {"field": "color", "value": "blue", "operator": "eq"}},
                {"description": "Filter by category (equality)", "filter": {"field": "product_category", "value": "Clothing > Shirts", "operator": "eq"}},
                {"description": "Filter by price range", "filter": {"field": "price", "value": {"min": 20, "max": 100}, "operator": "range"}},
                {"description": "Minimum rating", "filter": {"field": "rating", "value": 4, "operator": "gte"}}
            ]
        })
    }
}

fn resource_def(uri: &str, name: &str, description: &str) -> Resource {
    Resource {
        uri: uri.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        mime_type: Some(JSON_MIME.to_string()),
    }
}

fn response_schema() -> Result<Value> {
    Ok(serde_json::to_value(schemars::schema_for!(SearchResult))?)
}

fn examples() -> Value {
    json!({
        "basic_search": {
            "description": "Basic product search",
            "tool": "search",
            "parameters": {"query": "blue shirt", "start": 0, "size": 20}
        },
        "paginated_search": {
            "description": "Second page of tyre results",
            "tool": "search",
            "parameters": {"query": "tyres tires wheels", "start": 15, "size": 15}
        },
        "filtered_category_search": {
            "description": "Search for products in a specific category",
            "tool": "filtered_search",
            "parameters": {
                "query": "",
                "filters": [{"field": "product_category", "value": "Clothing > Shirts", "operator": "eq"}],
                "start": 0,
                "size": 20
            }
        },
        "price_range_search": {
            "description": "Search for products within a price range",
            "tool": "filtered_search",
            "parameters": {
                "query": "dress",
                "filters": [{"field": "price", "value": {"min": 29.99, "max": 99.99}, "operator": "range"}],
                "start": 0,
                "size": 20
            }
        },
        "sorted_price_search": {
            "description": "Search for products sorted by price (lowest first)",
            "tool": "sorted_search",
            "parameters": {
                "query": "laptop",
                "sort": [{"field": "price", "order": "asc", "type": "number"}],
                "start": 0,
                "size": 20
            }
        },
        "sorted_filtered_search": {
            "description": "Search with both filters and custom sorting",
            "tool": "sorted_search",
            "parameters": {
                "query": "sneakers",
                "sort": [{"field": "popularity", "order": "desc", "type": "number"}],
                "filters": [
                    {"field": "brand", "value": "Nike", "operator": "eq"},
                    {"field": "price", "value": {"min": 50, "max": 150}, "operator": "range"}
                ],
                "start": 0,
                "size": 20
            }
        },
        "multiple_sort_fields": {
            "description": "Search with primary and secondary ordering",
            "tool": "sorted_search",
            "parameters": {
                "query": "shoes",
                "sort": [
                    {"field": "price", "order": "asc", "type": "number"},
                    {"field": "rating", "order": "desc", "type": "number"}
                ],
                "start": 0,
                "size": 20
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> ResourceHandler {
        ResourceHandler::new("acme-store", "acme")
    }

    #[test]
    fn test_list_resources() {
        let uris: Vec<String> = handler().list_resources().into_iter().map(|r| r.uri).collect();
        assert_eq!(uris, vec![DOCS_URI, RESPONSE_SCHEMA_URI, EXAMPLES_URI]);
    }

    #[test]
    fn test_docs_include_configuration() {
        let content = handler().read_resource(DOCS_URI).unwrap();
        let docs: Value = serde_json::from_str(&content.text).unwrap();
        assert_eq!(docs["internal_configuration"]["website_id"], "acme-store");
        assert_eq!(docs["internal_configuration"]["client_shortcode"], "acme");
    }

    #[test]
    fn test_response_schema_describes_pagination() {
        let content = handler().read_resource(RESPONSE_SCHEMA_URI).unwrap();
        assert!(content.text.contains("pagination"));
        assert!(content.text.contains("execution_time_ms"));
    }

    #[test]
    fn test_examples_use_known_tools() {
        let content = handler().read_resource(EXAMPLES_URI).unwrap();
        let examples: Value = serde_json::from_str(&content.text).unwrap();
        for (_, example) in examples.as_object().unwrap() {
            let tool = example["tool"].as_str().unwrap();
            assert!(["search", "filtered_search", "sorted_search"].contains(&tool));
        }
    }

    #[test]
    fn test_unknown_resource() {
        assert!(handler().read_resource("resource://search/nope").is_err());
    }
}
