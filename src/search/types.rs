//! Search API type definitions
//!
//! Tool-facing filter/sort inputs, the provider request envelope, the
//! provider response, and the normalized result returned to callers.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Filter operator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Exact match
    #[default]
    Eq,
    /// Object value with `min` and/or `max`
    Range,
    /// Lower bound
    Gte,
    /// Upper bound
    Lte,
}

/// A single caller-supplied filter
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FilterSpec {
    /// Field name to filter on (e.g. "color", "price", "product_category")
    pub field: String,

    /// String/number for equality, or an object with min/max for ranges
    pub value: Value,

    /// Filter operator
    #[serde(default)]
    pub operator: FilterOperator,
}

impl FilterSpec {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator: FilterOperator::Eq,
        }
    }

    pub fn with_operator(field: impl Into<String>, value: impl Into<Value>, operator: FilterOperator) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Type of the field being sorted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortType {
    #[default]
    Number,
    Text,
    Date,
}

/// A single sort key
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SortSpec {
    /// Field name to sort by (e.g. "price", "popularity")
    pub field: String,

    #[serde(default)]
    pub order: SortOrder,

    #[serde(default, rename = "type")]
    pub sort_type: SortType,
}

/// Order/type descriptor sent for one sort field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortDescriptor {
    pub order: SortOrder,

    #[serde(rename = "type")]
    pub sort_type: SortType,
}

/// Normalized search parameters
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    pub start: u32,
    pub size: u32,
    pub filters: Vec<FilterSpec>,
    pub sort: Vec<SortSpec>,
}

/// Request envelope posted to the search API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    pub q: String,
    pub website_id: String,
    pub client: String,
    pub size: u32,
    pub start: u32,
    pub scope: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_fields: Option<Vec<std::collections::BTreeMap<String, SortDescriptor>>>,
}

/// Top-level search API response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchApiResponse {
    #[serde(default)]
    pub payload: Option<SearchPayload>,
}

/// Search API payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPayload {
    #[serde(default)]
    pub results: Vec<Value>,

    #[serde(default, deserialize_with = "lenient_count")]
    pub total_results: u64,

    #[serde(default)]
    pub aggregations: Option<Value>,

    #[serde(default)]
    pub suggestions: Option<Suggestions>,

    #[serde(default)]
    pub redirect_url: Option<Value>,
}

/// Accept any JSON number or null as a count, truncating fractions and
/// clamping negatives to zero
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = Option::<Number>::deserialize(deserializer)?.map(|n| {
        n.as_u64().unwrap_or_else(|| match n.as_f64() {
            Some(f) if f.is_finite() && f > 0.0 => f as u64,
            _ => 0,
        })
    });
    Ok(count.unwrap_or_default())
}

/// Suggestions block of the search payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Suggestions {
    #[serde(default)]
    pub fuzzy_suggestions: Vec<String>,
}

/// Pagination info derived from the request and total hit count
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PaginationInfo {
    /// Current page number (1-based)
    pub current_page: u64,

    /// Total number of pages (at least 1)
    pub total_pages: u64,

    /// Total number of results
    pub total_results: u64,

    /// Number of results per page
    pub page_size: u64,
}

impl PaginationInfo {
    /// Compute pagination for a zero-based `start` offset
    ///
    /// `page_size` must be non-zero.
    pub fn compute(start: u32, page_size: u32, total_results: u64) -> Self {
        let page_size = u64::from(page_size);
        Self {
            current_page: u64::from(start) / page_size + 1,
            total_pages: total_results.div_ceil(page_size).max(1),
            total_results,
            page_size,
        }
    }
}

/// Normalized search result
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SearchResult {
    /// Product results; properties vary with no enforced schema
    pub results: Vec<Value>,

    pub pagination: PaginationInfo,

    /// Aggregation information for filtering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Value>,

    /// Search suggestions if the query has few results
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// URL information for redirects on specific queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<Value>,

    /// Time taken to execute the search in milliseconds
    pub execution_time_ms: u64,
}

impl SearchResult {
    /// Build a result from a provider payload
    pub fn from_payload(payload: SearchPayload, start: u32, size: u32, execution_time_ms: u64) -> Self {
        Self {
            pagination: PaginationInfo::compute(start, size, payload.total_results),
            results: payload.results,
            aggregations: payload.aggregations,
            suggestions: payload
                .suggestions
                .map(|s| s.fuzzy_suggestions)
                .unwrap_or_default(),
            redirect_url: payload.redirect_url,
            execution_time_ms,
        }
    }
}
