//! TOML reader.

use serde_json::{Map, Value};
use std::path::Path;

use super::{ReadError, Reader, into_document, read_to_string};
use crate::format::Format;

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlReader;

impl Reader for TomlReader {
    fn read(&self, path: &Path) -> Result<Option<Value>, ReadError> {
        let contents = read_to_string(path)?;
        let table: toml::Table = toml::from_str(&contents)
            .map_err(|e| ReadError::parse(Format::Toml, path, e.to_string()))?;
        into_document(Format::Toml, path, toml_to_json(toml::Value::Table(table)))
    }
}

/// Convert a TOML value to a JSON value. Datetimes become strings.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            let map: Map<String, Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            Value::Object(map)
        }
    }
}
