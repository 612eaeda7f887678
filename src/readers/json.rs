//! JSON reader.

use serde_json::Value;
use std::path::Path;

use super::{ReadError, Reader, into_document, read_to_string};
use crate::format::Format;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReader;

impl Reader for JsonReader {
    fn read(&self, path: &Path) -> Result<Option<Value>, ReadError> {
        let contents = read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(&contents)
            .map_err(|e| ReadError::parse(Format::Json, path, e.to_string()))?;
        into_document(Format::Json, path, value)
    }
}
