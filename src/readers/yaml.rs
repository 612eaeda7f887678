//! YAML reader.

use serde_json::Value;
use std::path::Path;

use super::{ReadError, Reader, into_document, read_to_string};
use crate::format::Format;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlReader;

impl Reader for YamlReader {
    fn read(&self, path: &Path) -> Result<Option<Value>, ReadError> {
        let contents = read_to_string(path)?;
        if is_blank_document(&contents) {
            return Ok(None);
        }
        let value: Value = serde_yaml::from_str(&contents)
            .map_err(|e| ReadError::parse(Format::Yaml, path, e.to_string()))?;
        into_document(Format::Yaml, path, value)
    }
}

/// Empty, comment-only, or bare `---` documents carry no data.
fn is_blank_document(contents: &str) -> bool {
    contents.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}
