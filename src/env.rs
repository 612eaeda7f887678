//! Environment provider and the env tier transformation.
//!
//! `APP_DB__HOST=localhost` with prefix `APP_` and separator `__` becomes
//! `db.host = "localhost"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::trace;

use crate::value::{coerce_scalar, empty_tree, insert_path, leaf_paths};

/// Default separator for nested keys in variable names.
pub const DEFAULT_NESTED_SEPARATOR: &str = "__";

/// Source of environment variables.
///
/// Only the process entry point should reach for [`ProcessEnv`]; everything
/// else takes a provider explicitly.
pub trait EnvironmentProvider {
    /// Look up one variable.
    fn var(&self, name: &str) -> Option<String>;

    /// Every variable, when the provider can enumerate them.
    ///
    /// Lookup-only providers return `None`; the env tier then probes the
    /// names derived from paths already present in the tree.
    fn vars(&self) -> Option<Vec<(String, String)>> {
        None
    }

    /// Home directory used for the user tier.
    fn home_dir(&self) -> Option<PathBuf> {
        self.var("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvironmentProvider for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn vars(&self) -> Option<Vec<(String, String)>> {
        // Non-unicode variables cannot be config keys anyway
        Some(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        )
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

impl EnvironmentProvider for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }

    fn vars(&self) -> Option<Vec<(String, String)>> {
        Some(self.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl EnvironmentProvider for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }

    fn vars(&self) -> Option<Vec<(String, String)>> {
        Some(self.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// A lookup-only provider backed by a closure.
pub struct EnvFn<F>(pub F);

impl<F> EnvironmentProvider for EnvFn<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }
}

/// Settings for the env tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvOptions {
    /// Variable name prefix; defaults to `upper(app_name) + "_"`.
    pub prefix: Option<String>,
    /// Coerce `true`/`false` and numbers.
    pub auto_parse_types: bool,
    pub nested_separator: String,
}

impl Default for EnvOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            auto_parse_types: true,
            nested_separator: DEFAULT_NESTED_SEPARATOR.to_string(),
        }
    }
}

impl EnvOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.nested_separator = separator.into();
        self
    }

    pub fn with_auto_parse(mut self, auto_parse_types: bool) -> Self {
        self.auto_parse_types = auto_parse_types;
        self
    }
}

/// Default prefix for an application: `my_app` → `MY_APP_`.
pub fn default_prefix(app_name: &str) -> String {
    format!("{}_", app_name.to_uppercase())
}

/// Build the env tier's tree.
///
/// `known` is the tree accumulated so far; it only matters for lookup-only
/// providers, whose candidate names are derived from its leaf paths.
pub fn env_tree(
    provider: &dyn EnvironmentProvider,
    prefix: &str,
    separator: &str,
    auto_parse_types: bool,
    known: &Value,
) -> Value {
    let mut matches: Vec<(String, String)> = match provider.vars() {
        Some(vars) => vars
            .into_iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .collect(),
        None => leaf_paths(known)
            .into_iter()
            .filter_map(|path| {
                let name = format!("{}{}", prefix, path.to_uppercase().replace('.', separator));
                provider.var(&name).map(|value| (name, value))
            })
            .collect(),
    };
    matches.sort();

    let separator = separator.to_lowercase();
    let mut tree = empty_tree();
    for (name, raw) in matches {
        let mut key = name[prefix.len()..].to_lowercase();
        if !separator.is_empty() {
            key = key.replace(&separator, ".");
        }
        if key.is_empty() {
            continue;
        }
        trace!(variable = %name, key = %key, "env override");
        let value = if auto_parse_types {
            coerce_scalar(&raw)
        } else {
            Value::String(raw)
        };
        insert_path(&mut tree, &key, value);
    }
    tree
}
