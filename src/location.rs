//! Per-tier search locations.
//!
//! Options describe locations loosely (`false`, `true`, a path, a list of
//! paths). They are normalized once into a [`LocationSpec`] and resolved to
//! a plain directory list here, so the loader never type-checks them inline.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Where a tier should look.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum LocationSpec {
    /// The tier is skipped.
    Disabled,
    /// Use the tier's built-in directories.
    UseDefaults,
    /// Use exactly these paths.
    Explicit(Vec<String>),
}

impl LocationSpec {
    /// Normalize a loosely-typed value.
    ///
    /// Anything that is not a boolean, a string, or a list silently becomes
    /// an empty explicit list rather than an error.
    pub fn normalize(value: &Value) -> Self {
        match value {
            Value::Bool(false) => LocationSpec::Disabled,
            Value::Bool(true) => LocationSpec::UseDefaults,
            Value::String(path) => LocationSpec::Explicit(vec![path.clone()]),
            Value::Array(items) => LocationSpec::Explicit(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => LocationSpec::Explicit(Vec::new()),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, LocationSpec::Disabled)
    }
}

impl From<Value> for LocationSpec {
    fn from(value: Value) -> Self {
        Self::normalize(&value)
    }
}

impl From<LocationSpec> for Value {
    fn from(spec: LocationSpec) -> Self {
        match spec {
            LocationSpec::Disabled => Value::Bool(false),
            LocationSpec::UseDefaults => Value::Bool(true),
            LocationSpec::Explicit(paths) => {
                Value::Array(paths.into_iter().map(Value::String).collect())
            }
        }
    }
}

impl From<bool> for LocationSpec {
    fn from(enabled: bool) -> Self {
        if enabled {
            LocationSpec::UseDefaults
        } else {
            LocationSpec::Disabled
        }
    }
}

impl From<&str> for LocationSpec {
    fn from(path: &str) -> Self {
        LocationSpec::Explicit(vec![path.to_string()])
    }
}

impl From<Vec<String>> for LocationSpec {
    fn from(paths: Vec<String>) -> Self {
        LocationSpec::Explicit(paths)
    }
}

/// Resolve a spec against the tier's default directories.
///
/// An absent spec behaves like [`LocationSpec::UseDefaults`].
pub fn resolve(spec: Option<&LocationSpec>, tier_defaults: &[String]) -> Vec<String> {
    match spec {
        None | Some(LocationSpec::UseDefaults) => tier_defaults.to_vec(),
        Some(LocationSpec::Disabled) => Vec::new(),
        Some(LocationSpec::Explicit(paths)) => paths.clone(),
    }
}

/// `["/etc/<app_name>", "/etc"]`
pub fn system_defaults(app_name: &str) -> Vec<String> {
    vec![format!("/etc/{}", app_name), "/etc".to_string()]
}

/// `["$HOME/.config", "$HOME"]`, or nothing without a home directory.
pub fn user_defaults(home: Option<&Path>) -> Vec<String> {
    match home {
        Some(home) => vec![
            home.join(".config").to_string_lossy().into_owned(),
            home.to_string_lossy().into_owned(),
        ],
        None => Vec::new(),
    }
}

/// Base path of the user dotfile, `$HOME/.<app_name>`, probed with every
/// format extension independently of the user directory list.
pub fn user_dotfile(home: Option<&Path>, app_name: &str) -> Option<PathBuf> {
    home.map(|home| home.join(format!(".{}", app_name)))
}

/// `["."]`
pub fn project_defaults() -> Vec<String> {
    vec![".".to_string()]
}
