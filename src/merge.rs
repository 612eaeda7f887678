//! Deep merge of configuration trees.
//!
//! Implements field-by-field merging where the later tier overrides the
//! earlier one. Arrays are replaced entirely, never merged element-wise.

use serde_json::Value;

use crate::value::empty_tree;

/// Deep merge two trees, with `source` taking precedence over `target`.
///
/// Neither input is touched; the result is a fresh tree.
///
/// - Objects are merged recursively: keys in `source` override keys in `target`
/// - Arrays in `source` replace whatever `target` held, wholesale
/// - Strings, numbers and booleans in `source` replace `target`
/// - A null in `source` keeps the `target` value (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use tierconf::deep_merge;
///
/// let target = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "features": ["a", "b"]
/// });
/// let source = json!({
///     "server": { "port": 9000 },
///     "features": ["c"]
/// });
/// let result = deep_merge(&target, &source);
/// assert_eq!(result, json!({
///     "server": { "port": 9000, "host": "localhost" },
///     "features": ["c"]
/// }));
/// ```
pub fn deep_merge(target: &Value, source: &Value) -> Value {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            let mut merged = target_map.clone();
            for (key, source_value) in source_map {
                let value = match (merged.get(key), source_value) {
                    (_, Value::Null) => continue,
                    (_, Value::Array(_)) => source_value.clone(),
                    (Some(target_value), _) => deep_merge(target_value, source_value),
                    (None, _) => source_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        (target, Value::Null) => target.clone(),
        (_, source) => source.clone(),
    }
}

/// Merge multiple trees in order, with later trees taking precedence.
///
/// Folds `deep_merge` over the list starting from an empty mapping.
pub fn deep_merge_all<'a>(values: impl IntoIterator<Item = &'a Value>) -> Value {
    values
        .into_iter()
        .fold(empty_tree(), |acc, value| deep_merge(&acc, value))
}
