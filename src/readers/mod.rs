//! Format readers.
//!
//! A reader turns one file into a config tree. The resolution pipeline only
//! decides which file goes to which reader; it never parses content itself.

mod conf;
mod ini;
mod json;
mod toml;
mod yaml;

pub use conf::ConfReader;
pub use ini::IniReader;
pub use json::JsonReader;
pub use self::toml::TomlReader;
pub use yaml::YamlReader;

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::format::Format;
use crate::value::type_name;

/// Why a file could not be turned into a tree.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} parse error in {}: {message}", path.display())]
    Parse {
        format: Format,
        path: PathBuf,
        message: String,
    },

    #[error("no reader registered for {format} ({})", path.display())]
    NoReader { format: Format, path: PathBuf },
}

impl ReadError {
    pub fn parse(format: Format, path: &Path, message: impl Into<String>) -> Self {
        ReadError::Parse {
            format,
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Converts one file format into a config tree.
///
/// `Ok(Some(tree))` on success, `Ok(None)` for a valid but empty document,
/// `Err` when the file cannot be read or parsed.
pub trait Reader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Option<Value>, ReadError>;
}

/// Readers keyed by format.
pub struct ReaderRegistry {
    readers: HashMap<Format, Box<dyn Reader>>,
}

impl ReaderRegistry {
    /// A registry with no readers at all.
    pub fn empty() -> Self {
        Self {
            readers: HashMap::new(),
        }
    }

    /// Register a reader, replacing any previous one for `format`.
    pub fn register(mut self, format: Format, reader: impl Reader + 'static) -> Self {
        self.readers.insert(format, Box::new(reader));
        self
    }

    pub fn supports(&self, format: Format) -> bool {
        self.readers.contains_key(&format)
    }

    /// Read `path` with the reader registered for `format`.
    pub fn read(&self, format: Format, path: &Path) -> Result<Option<Value>, ReadError> {
        match self.readers.get(&format) {
            Some(reader) => reader.read(path),
            None => Err(ReadError::NoReader {
                format,
                path: path.to_path_buf(),
            }),
        }
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::empty()
            .register(Format::Toml, TomlReader)
            .register(Format::Json, JsonReader)
            .register(Format::Yaml, YamlReader)
            .register(Format::Ini, IniReader)
            .register(Format::Config, ConfReader)
    }
}

impl std::fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<&str> = self.readers.keys().map(|f| f.as_str()).collect();
        formats.sort_unstable();
        f.debug_struct("ReaderRegistry")
            .field("formats", &formats)
            .finish()
    }
}

fn read_to_string(path: &Path) -> Result<String, ReadError> {
    std::fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Normalize a parsed document: null and empty tables are empty documents,
/// anything other than a table at the root is rejected.
fn into_document(format: Format, path: &Path, value: Value) -> Result<Option<Value>, ReadError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(Value::Object(map))),
        other => Err(ReadError::parse(
            format,
            path,
            format!("expected a table at the document root, got {}", type_name(&other)),
        )),
    }
}

/// Split a `key = value` (or `key: value`) line. Returns trimmed parts.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(['=', ':'])?;
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[idx + 1..].trim()))
}

/// Strip one level of matching single or double quotes.
fn unquote(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return Some(&raw[1..raw.len() - 1]);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    struct FixedReader(Value);

    impl Reader for FixedReader {
        fn read(&self, _path: &Path) -> Result<Option<Value>, ReadError> {
            Ok(Some(self.0.clone()))
        }
    }

    #[test]
    fn test_default_registry_supports_all_formats() {
        let registry = ReaderRegistry::default();
        for format in [Format::Toml, Format::Json, Format::Yaml, Format::Ini, Format::Config] {
            assert!(registry.supports(format));
        }
    }

    #[test]
    fn test_register_replaces_reader() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "a = 1").unwrap();

        let registry = ReaderRegistry::default().register(Format::Toml, FixedReader(json!({"b": 2})));
        assert_eq!(registry.read(Format::Toml, &path).unwrap(), Some(json!({"b": 2})));
    }

    #[test]
    fn test_missing_reader_is_an_error() {
        let registry = ReaderRegistry::empty();
        let err = registry.read(Format::Json, Path::new("x.json")).unwrap_err();
        assert!(matches!(err, ReadError::NoReader { format: Format::Json, .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = ReaderRegistry::default()
            .read(Format::Json, &temp.path().join("absent.json"))
            .unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
    }

    #[test]
    fn test_into_document_rejects_non_table_root() {
        let err = into_document(Format::Json, Path::new("x.json"), json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("expected a table"));
        assert_eq!(into_document(Format::Json, Path::new("x.json"), json!({})).unwrap(), None);
    }

    #[test]
    fn test_split_assignment() {
        assert_eq!(split_assignment("a = 1"), Some(("a", "1")));
        assert_eq!(split_assignment("a: b = c"), Some(("a", "b = c")));
        assert_eq!(split_assignment("url=http://x"), Some(("url", "http://x")));
        assert_eq!(split_assignment("= 1"), None);
        assert_eq!(split_assignment("novalue"), None);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a b\""), Some("a b"));
        assert_eq!(unquote("'x'"), Some("x"));
        assert_eq!(unquote("\"x'"), None);
        assert_eq!(unquote("\""), None);
    }
}
