//! Configuration file formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A file format with a registered reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Toml,
    Json,
    Yaml,
    Ini,
    /// Flat `key = value` lines.
    Config,
}

/// Extensions probed when the options do not name any.
pub const DEFAULT_FORMATS: &[&str] = &["toml", "json", "yaml", "ini", "config"];

impl Format {
    /// Map a file extension to a format. Case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Format::Toml),
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "ini" => Some(Format::Ini),
            "config" | "conf" | "cfg" => Some(Format::Config),
            _ => None,
        }
    }

    /// Format of a path, judged by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Toml => "toml",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Ini => "ini",
            Format::Config => "config",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Format::from_extension("toml"), Some(Format::Toml));
        assert_eq!(Format::from_extension("YML"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("conf"), Some(Format::Config));
        assert_eq!(Format::from_extension("xml"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Format::from_path(Path::new("/etc/app/config.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("config")), None);
    }

    #[test]
    fn test_default_formats_are_all_known() {
        for ext in DEFAULT_FORMATS {
            assert!(Format::from_extension(ext).is_some(), "{ext}");
        }
    }
}
