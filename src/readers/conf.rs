//! Reader for the flat `config` format.
//!
//! One `key = value` per line. Dotted keys nest (`db.host = x`), `#` starts
//! a comment line, `[a, b]` is a list. Quoted values stay strings; bare
//! values are coerced to booleans and numbers.

use serde_json::Value;
use std::path::Path;

use super::{ReadError, Reader, into_document, read_to_string, split_assignment, unquote};
use crate::format::Format;
use crate::value::{coerce_scalar, empty_tree, insert_path};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfReader;

impl Reader for ConfReader {
    fn read(&self, path: &Path) -> Result<Option<Value>, ReadError> {
        let contents = read_to_string(path)?;
        let tree = parse_conf(&contents).map_err(|(line, message)| {
            ReadError::parse(Format::Config, path, format!("line {}: {}", line, message))
        })?;
        into_document(Format::Config, path, tree)
    }
}

fn parse_conf(contents: &str) -> Result<Value, (usize, String)> {
    let mut tree = empty_tree();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, raw_value) = split_assignment(line)
            .ok_or_else(|| (idx + 1, format!("expected 'key = value', got '{}'", line)))?;
        insert_path(&mut tree, key, parse_value(raw_value));
    }

    Ok(tree)
}

fn parse_value(raw: &str) -> Value {
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let inner = inner.trim();
        if inner.is_empty() {
            return Value::Array(Vec::new());
        }
        return Value::Array(inner.split(',').map(|item| parse_scalar(item.trim())).collect());
    }
    parse_scalar(raw)
}

fn parse_scalar(raw: &str) -> Value {
    match unquote(raw) {
        Some(s) => Value::String(s.to_string()),
        None => coerce_scalar(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dotted_keys_nest() {
        let tree = parse_conf(
            r#"
# service settings
db.host = localhost
db.port = 5432
debug = false
"#,
        )
        .unwrap();
        assert_eq!(
            tree,
            json!({"db": {"host": "localhost", "port": 5432}, "debug": false})
        );
    }

    #[test]
    fn test_lists() {
        let tree = parse_conf("hosts = [a, \"b\", 3]\nempty = []").unwrap();
        assert_eq!(tree, json!({"hosts": ["a", "b", 3], "empty": []}));
    }

    #[test]
    fn test_missing_assignment_is_error() {
        let err = parse_conf("ok = 1\nwhat\n").unwrap_err();
        assert_eq!(err.0, 2);
    }
}
