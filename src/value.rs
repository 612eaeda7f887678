//! Config tree helpers.
//!
//! The tree is a plain `serde_json::Value`: readers emit tagged `Array` and
//! `Object` nodes, so list-vs-map never has to be guessed from the keys.

use serde_json::{Map, Number, Value};

/// A resolved configuration tree.
pub type ConfigTree = Value;

/// An empty mapping, the starting point of every merge.
pub fn empty_tree() -> Value {
    Value::Object(Map::new())
}

/// Coerce a raw string from the environment or the command line.
///
/// - `true` / `false` (any case) become booleans
/// - integers, decimals, exponents and `0x` hex become numbers
/// - everything else stays a string
pub fn coerce_scalar(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    match parse_number(raw) {
        Some(number) => Value::Number(number),
        None => Value::String(raw.to_string()),
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    if raw.is_empty() || raw.trim() != raw {
        return None;
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Some(int.into());
    }

    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
        // `from_str_radix` would accept a second sign after the prefix
        && !hex.starts_with(['+', '-'])
        && let Ok(int) = i64::from_str_radix(hex, 16)
    {
        let int = if negative { int.checked_neg()? } else { int };
        return Some(int.into());
    }

    // f64 parsing accepts "inf" and "nan"; those stay strings.
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

/// Write `value` at a dotted path, creating intermediate mappings.
///
/// Scalars standing in the way of the path are replaced by mappings.
/// Empty segments are skipped; a path with no segments is a no-op.
pub fn insert_path(tree: &mut Value, dotted: &str, value: Value) {
    let segments: Vec<&str> = dotted.split('.').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    if !tree.is_object() {
        *tree = empty_tree();
    }

    let mut current = tree;
    for segment in parents {
        let Value::Object(map) = current else {
            return;
        };
        let child = map.entry(segment.to_string()).or_insert_with(empty_tree);
        if !child.is_object() {
            *child = empty_tree();
        }
        current = child;
    }

    if let Value::Object(map) = current {
        map.insert(last.to_string(), value);
    }
}

/// Dotted paths of every leaf under `tree`.
///
/// Arrays count as leaves: they are replaced wholesale, never addressed
/// element by element.
pub fn leaf_paths(tree: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_leaves(tree, String::new(), &mut paths);
    paths
}

fn collect_leaves(value: &Value, prefix: String, paths: &mut Vec<String>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                collect_leaves(child, path, paths);
            }
        }
        _ if !prefix.is_empty() => paths.push(prefix),
        _ => {}
    }
}

/// Short type name used in diagnostics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_booleans_case_insensitive() {
        assert_eq!(coerce_scalar("true"), json!(true));
        assert_eq!(coerce_scalar("TRUE"), json!(true));
        assert_eq!(coerce_scalar("False"), json!(false));
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(coerce_scalar("8080"), json!(8080));
        assert_eq!(coerce_scalar("-12"), json!(-12));
        assert_eq!(coerce_scalar("1.5"), json!(1.5));
        assert_eq!(coerce_scalar("1e3"), json!(1000.0));
        assert_eq!(coerce_scalar("0x10"), json!(16));
    }

    #[test]
    fn test_coerce_leaves_strings_alone() {
        assert_eq!(coerce_scalar("localhost"), json!("localhost"));
        assert_eq!(coerce_scalar(""), json!(""));
        assert_eq!(coerce_scalar(" 42"), json!(" 42"));
        assert_eq!(coerce_scalar("inf"), json!("inf"));
        assert_eq!(coerce_scalar("NaN"), json!("NaN"));
        assert_eq!(coerce_scalar("yes"), json!("yes"));
    }

    #[test]
    fn test_coerce_hex_sign_only_before_prefix() {
        assert_eq!(coerce_scalar("-0x10"), json!(-16));
        assert_eq!(coerce_scalar("0x-5"), json!("0x-5"));
        assert_eq!(coerce_scalar("0x+5"), json!("0x+5"));
        assert_eq!(coerce_scalar("-0x-8000000000000000"), json!("-0x-8000000000000000"));
        assert_eq!(coerce_scalar("0x8000000000000000"), json!("0x8000000000000000"));
    }

    #[test]
    fn test_insert_path_creates_nesting() {
        let mut tree = empty_tree();
        insert_path(&mut tree, "db.host", json!("localhost"));
        insert_path(&mut tree, "db.port", json!(5432));
        assert_eq!(tree, json!({"db": {"host": "localhost", "port": 5432}}));
    }

    #[test]
    fn test_insert_path_replaces_scalar_in_the_way() {
        let mut tree = json!({"server": "on"});
        insert_path(&mut tree, "server.port", json!(80));
        assert_eq!(tree, json!({"server": {"port": 80}}));
    }

    #[test]
    fn test_insert_path_skips_empty_segments() {
        let mut tree = empty_tree();
        insert_path(&mut tree, ".a..b.", json!(1));
        insert_path(&mut tree, "", json!(2));
        assert_eq!(tree, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_leaf_paths() {
        let tree = json!({"a": {"b": 1, "c": [1, 2]}, "d": "x", "e": {}});
        let mut paths = leaf_paths(&tree);
        paths.sort();
        assert_eq!(paths, vec!["a.b", "a.c", "d", "e"]);
    }
}
