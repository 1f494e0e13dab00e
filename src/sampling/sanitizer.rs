//! Payload sanitizer for sampled graph data
//!
//! Sampled paths carry whole node and relationship property maps. Long lists in
//! there (embeddings, bulk arrays) cost prompt space without telling the model
//! anything about the graph's shape, so they are stripped before prompting.

use serde_json::{Map, Value};

/// Lists with this many elements or more are dropped
pub const DEFAULT_MAX_LIST_LEN: usize = 56;

/// Recursively drop oversized lists from `value`.
///
/// - Objects are sanitized key by key; a key whose value collapses is removed,
///   null values in objects are kept as-is.
/// - Lists shorter than `max_list_len` are sanitized element-wise; elements that
///   collapse (oversized nested lists, nulls) are removed.
/// - Scalars pass through.
///
/// Returns `None` when `value` itself collapses (an oversized list or a bare null).
pub fn sanitize_value(value: &Value, max_list_len: usize) -> Option<Value> {
    match value {
        Value::Object(map) => Some(Value::Object(sanitize_object(map, max_list_len))),
        Value::Array(items) if items.len() >= max_list_len => None,
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| sanitize_value(item, max_list_len))
                .collect(),
        )),
        Value::Null => None,
        scalar => Some(scalar.clone()),
    }
}

fn sanitize_object(map: &Map<String, Value>, max_list_len: usize) -> Map<String, Value> {
    map.iter()
        .filter_map(|(key, value)| match value {
            Value::Null => Some((key.clone(), Value::Null)),
            _ => sanitize_value(value, max_list_len).map(|v| (key.clone(), v)),
        })
        .collect()
}

/// Sanitize a list of result rows, never collapsing the outer list.
pub fn sanitize_rows(rows: Vec<Map<String, Value>>, max_list_len: usize) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| Value::Object(sanitize_object(row, max_list_len)))
            .collect(),
    )
}
