//! Request shaping
//!
//! Translates caller filters and sort keys into the search API's `scope`
//! mapping and `sort_fields` list, and assembles the request envelope.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::search::types::{
    FilterOperator, FilterSpec, SearchQuery, SearchRequest, SortDescriptor, SortSpec,
};

/// Build the scope mapping from a list of filters
///
/// `eq` sets the field directly. `range`, `gte` and `lte` always produce an
/// object holding `min` and/or `max`; later bounds for the same key win.
pub fn build_scope(filters: &[FilterSpec]) -> Map<String, Value> {
    let mut scope = Map::new();

    for filter in filters {
        match filter.operator {
            FilterOperator::Eq => {
                scope.insert(filter.field.clone(), filter.value.clone());
            }
            FilterOperator::Range => {
                let bounds: Vec<(&str, Value)> = match filter.value.as_object() {
                    Some(value) => ["min", "max"]
                        .into_iter()
                        .filter_map(|key| value.get(key).map(|bound| (key, bound.clone())))
                        .collect(),
                    None => {
                        tracing::warn!(
                            "Range filter on '{}' has a non-object value, ignoring bounds",
                            filter.field
                        );
                        Vec::new()
                    }
                };
                merge_bounds(&mut scope, &filter.field, bounds);
            }
            FilterOperator::Gte => {
                merge_bounds(&mut scope, &filter.field, [("min", filter.value.clone())]);
            }
            FilterOperator::Lte => {
                merge_bounds(&mut scope, &filter.field, [("max", filter.value.clone())]);
            }
        }
    }

    scope
}

/// Merge bounds into a field's object, replacing any scalar already there
fn merge_bounds<'a, I>(scope: &mut Map<String, Value>, field: &str, bounds: I)
where
    I: IntoIterator<Item = (&'a str, Value)>,
{
    let mut merged = match scope.remove(field) {
        Some(Value::Object(existing)) => existing,
        _ => Map::new(),
    };

    for (key, value) in bounds {
        merged.insert(key.to_string(), value);
    }

    scope.insert(field.to_string(), Value::Object(merged));
}

/// Build the ordered sort field list, primary key first
pub fn build_sort_fields(sort: &[SortSpec]) -> Vec<BTreeMap<String, SortDescriptor>> {
    sort.iter()
        .map(|spec| {
            BTreeMap::from([(
                spec.field.clone(),
                SortDescriptor {
                    order: spec.order,
                    sort_type: spec.sort_type,
                },
            )])
        })
        .collect()
}

/// Assemble the request envelope for one search call
pub fn build_request(query: &SearchQuery, client_id: &str, client_shortcode: &str) -> SearchRequest {
    let scope = build_scope(&query.filters);
    if !scope.is_empty() {
        let generated = Value::Object(scope.clone());
        tracing::debug!("Generated scope from filters: {}", generated);
    }

    let sort_fields = if query.sort.is_empty() {
        None
    } else {
        Some(build_sort_fields(&query.sort))
    };

    SearchRequest {
        q: query.query.clone(),
        website_id: client_id.to_lowercase(),
        client: client_shortcode.to_string(),
        size: query.size,
        start: query.start,
        scope,
        sort_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::{SortOrder, SortType};
    use serde_json::json;

    #[test]
    fn test_eq_filter_maps_directly() {
        let scope = build_scope(&[
            FilterSpec::eq("color", "blue"),
            FilterSpec::eq("in_stock", true),
            FilterSpec::eq("rating", 4),
        ]);
        assert_eq!(scope["color"], json!("blue"));
        assert_eq!(scope["in_stock"], json!(true));
        assert_eq!(scope["rating"], json!(4));
    }

    #[test]
    fn test_range_object() {
        let scope = build_scope(&[FilterSpec::with_operator(
            "price",
            json!({"min": 20, "max": 100}),
            FilterOperator::Range,
        )]);
        assert_eq!(Value::Object(scope), json!({"price": {"min": 20, "max": 100}}));
    }

    #[test]
    fn test_range_only_keeps_supplied_bounds() {
        let scope = build_scope(&[FilterSpec::with_operator(
            "price",
            json!({"max": 50, "currency": "AUD"}),
            FilterOperator::Range,
        )]);
        assert_eq!(scope["price"], json!({"max": 50}));
    }

    #[test]
    fn test_gte_and_lte_are_top_level_operators() {
        let scope = build_scope(&[
            FilterSpec::with_operator("price", 10, FilterOperator::Gte),
            FilterSpec::with_operator("price", 90, FilterOperator::Lte),
        ]);
        assert_eq!(scope["price"], json!({"min": 10, "max": 90}));
    }

    #[test]
    fn test_range_and_bound_operators_merge() {
        let scope = build_scope(&[
            FilterSpec::with_operator("price", json!({"min": 20}), FilterOperator::Range),
            FilterSpec::with_operator("price", 80, FilterOperator::Lte),
        ]);
        assert_eq!(scope["price"], json!({"min": 20, "max": 80}));
    }

    #[test]
    fn test_later_bound_overwrites() {
        let scope = build_scope(&[
            FilterSpec::with_operator("price", json!({"min": 20, "max": 100}), FilterOperator::Range),
            FilterSpec::with_operator("price", 30, FilterOperator::Gte),
        ]);
        assert_eq!(scope["price"], json!({"min": 30, "max": 100}));
    }

    #[test]
    fn test_range_replaces_scalar() {
        let scope = build_scope(&[
            FilterSpec::eq("price", 25),
            FilterSpec::with_operator("price", 10, FilterOperator::Gte),
        ]);
        assert_eq!(scope["price"], json!({"min": 10}));
    }

    #[test]
    fn test_range_with_scalar_value_yields_empty_bounds() {
        let scope = build_scope(&[FilterSpec::with_operator("price", 25, FilterOperator::Range)]);
        assert_eq!(scope["price"], json!({}));
    }

    #[test]
    fn test_sort_fields_preserve_order() {
        let sort = vec![
            SortSpec {
                field: "price".to_string(),
                order: SortOrder::Asc,
                sort_type: SortType::Number,
            },
            SortSpec {
                field: "title".to_string(),
                order: SortOrder::Desc,
                sort_type: SortType::Text,
            },
        ];
        let fields = serde_json::to_value(build_sort_fields(&sort)).unwrap();
        assert_eq!(
            fields,
            json!([
                {"price": {"order": "asc", "type": "number"}},
                {"title": {"order": "desc", "type": "text"}}
            ])
        );
    }

    #[test]
    fn test_request_envelope() {
        let query = SearchQuery {
            query: "blue shirts".to_string(),
            start: 0,
            size: 20,
            ..Default::default()
        };
        let request = build_request(&query, "ACME-Store", "acme");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["q"], "blue shirts");
        assert_eq!(json["website_id"], "acme-store");
        assert_eq!(json["client"], "acme");
        assert_eq!(json["size"], 20);
        assert_eq!(json["start"], 0);
        assert_eq!(json["scope"], json!({}));
        assert!(json.get("sort_fields").is_none());
    }

    #[test]
    fn test_request_envelope_is_deterministic() {
        let query = SearchQuery {
            query: "shoes".to_string(),
            start: 10,
            size: 5,
            filters: vec![
                FilterSpec::eq("brand", "Nike"),
                FilterSpec::with_operator("price", json!({"min": 50, "max": 150}), FilterOperator::Range),
            ],
            sort: vec![SortSpec {
                field: "popularity".to_string(),
                order: SortOrder::Desc,
                sort_type: SortType::Number,
            }],
        };
        let first = serde_json::to_string(&build_request(&query, "id", "sc")).unwrap();
        let second = serde_json::to_string(&build_request(&query, "id", "sc")).unwrap();
        assert_eq!(first, second);
    }
}
