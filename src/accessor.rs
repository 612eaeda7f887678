//! Read access to a resolved configuration tree, and the builder API.
//!
//! Lookups use dotted paths with optional 1-based list indices:
//! `server.port`, `servers[2].host`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::cmdline::parse_args;
use crate::env::{DEFAULT_NESTED_SEPARATOR, EnvironmentProvider, ProcessEnv, env_tree};
use crate::error::{SourceError, SourceErrorKind};
use crate::format::Format;
use crate::loader::Tier;
use crate::merge::deep_merge;
use crate::readers::ReaderRegistry;
use crate::value::{empty_tree, type_name};

static INDEXED_SEGMENT: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"^(.+)\[([0-9]+)\]$").expect("segment pattern is valid")
});

/// Where a merged fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// A tier of `declare`.
    Tier(Tier),
    /// `add_table`
    Table,
    /// `add_file`
    File,
    /// `add_env`
    Env,
    /// `add_args`
    Args,
}

/// A fragment that contributed data to the tree, in merge order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedSource {
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// One entry of an explicit source list for [`Config::merge_sources`].
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(Value),
    File {
        path: PathBuf,
        format: Option<Format>,
    },
    Env {
        prefix: String,
    },
    Args(Vec<String>),
}

/// A resolved configuration.
///
/// Values are immutable: builder methods return a new `Config` and leave
/// the receiver untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    tree: Value,
    sources: Vec<LoadedSource>,
    errors: Vec<SourceError>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// An empty configuration.
    pub fn new() -> Self {
        Self {
            tree: empty_tree(),
            sources: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        tree: Value,
        sources: Vec<LoadedSource>,
        errors: Vec<SourceError>,
    ) -> Self {
        Self {
            tree,
            sources,
            errors,
        }
    }

    // Lookup

    /// Look up a dotted path. `None` when any step does not resolve.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.tree, path)
    }

    /// The whole tree.
    pub fn get_table(&self) -> &Value {
        &self.tree
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path)?.as_i64()
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path)?.as_f64()
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// Deserialize the subtree at `path` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let value = self.get(path)?;
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                debug!(path, error = %err, "value does not match requested type");
                None
            }
        }
    }

    /// Fragments that contributed data, in merge order.
    pub fn sources(&self) -> &[LoadedSource] {
        &self.sources
    }

    /// Errors recorded by builder calls, or by `declare`.
    pub fn errors(&self) -> &[SourceError] {
        &self.errors
    }

    pub fn into_tree(self) -> Value {
        self.tree
    }

    // Builder

    /// Merge a table on top of this configuration.
    pub fn add_table(&self, table: Value) -> Self {
        let mut next = self.clone();
        next.merge_fragment(Origin::Table, None, &table);
        next
    }

    /// Merge a file on top of this configuration.
    ///
    /// The format comes from `format` or, failing that, the extension.
    /// Problems are recorded in [`Config::errors`] of the returned value.
    pub fn add_file(&self, path: impl AsRef<Path>, format: Option<Format>) -> Self {
        self.add_file_with(path, format, &ReaderRegistry::default())
    }

    /// [`Config::add_file`] with an explicit reader registry.
    pub fn add_file_with(
        &self,
        path: impl AsRef<Path>,
        format: Option<Format>,
        registry: &ReaderRegistry,
    ) -> Self {
        let path = path.as_ref();
        let mut next = self.clone();

        let Some(format) = format.or_else(|| Format::from_path(path)) else {
            next.errors.push(
                SourceError::new(
                    SourceErrorKind::File,
                    format!("Cannot tell the format of {}", path.display()),
                )
                .with_path(path),
            );
            return next;
        };

        if !path.is_file() {
            next.errors.push(
                SourceError::new(
                    SourceErrorKind::File,
                    format!("Config file not found: {}", path.display()),
                )
                .with_path(path),
            );
            return next;
        }

        match registry.read(format, path) {
            Ok(Some(tree)) => next.merge_fragment(Origin::File, Some(path.to_path_buf()), &tree),
            Ok(None) => {}
            Err(err) => next
                .errors
                .push(SourceError::read_failure(SourceErrorKind::File, path, &err)),
        }
        next
    }

    /// Merge process environment variables starting with `prefix`.
    pub fn add_env(&self, prefix: &str) -> Self {
        self.add_env_with(prefix, &ProcessEnv)
    }

    /// [`Config::add_env`] with an explicit provider.
    pub fn add_env_with(&self, prefix: &str, provider: &dyn EnvironmentProvider) -> Self {
        let tree = env_tree(provider, prefix, DEFAULT_NESTED_SEPARATOR, true, &self.tree);
        let mut next = self.clone();
        next.merge_fragment(Origin::Env, None, &tree);
        next
    }

    /// Merge `--key=value` style tokens.
    pub fn add_args<S: AsRef<str>>(&self, tokens: &[S]) -> Self {
        let tree = parse_args(tokens);
        let mut next = self.clone();
        next.merge_fragment(Origin::Args, None, &tree);
        next
    }

    /// Build a configuration from an explicit, ordered list of sources.
    pub fn merge_sources(sources: &[Source]) -> Self {
        sources
            .iter()
            .fold(Config::new(), |config, source| match source {
                Source::Table(table) => config.add_table(table.clone()),
                Source::File { path, format } => config.add_file(path, *format),
                Source::Env { prefix } => config.add_env(prefix),
                Source::Args(tokens) => config.add_args(tokens.as_slice()),
            })
    }

    fn merge_fragment(&mut self, origin: Origin, path: Option<PathBuf>, fragment: &Value) {
        if !fragment.is_object() {
            self.errors.push(SourceError::new(
                SourceErrorKind::OptionsValidation,
                format!("expected a table to merge, got {}", type_name(fragment)),
            ));
            return;
        }
        if fragment.as_object().is_some_and(|map| map.is_empty()) {
            return;
        }
        self.tree = deep_merge(&self.tree, fragment);
        self.sources.push(LoadedSource { origin, path });
    }
}

enum Segment<'a> {
    Key(&'a str),
    Index(&'a str, usize),
}

fn parse_segment(segment: &str) -> Option<Segment<'_>> {
    let Some(caps) = INDEXED_SEGMENT.captures(segment) else {
        return Some(Segment::Key(segment));
    };
    let name = caps.get(1)?.as_str();
    // Overflowing indices are out of range by definition
    let index: usize = caps.get(2)?.as_str().parse().ok()?;
    if index == 0 {
        return None;
    }
    Some(Segment::Index(name, index))
}

/// Look up a dotted path in any tree.
///
/// A segment shaped like `name[N]` needs a table holding a list under
/// `name` and a 1-based `N` within bounds; any miss gives `None` for the
/// whole lookup. Other segments are plain keys.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match parse_segment(segment)? {
            Segment::Key(key) => current.as_object()?.get(key)?,
            Segment::Index(name, index) => {
                let list = current.as_object()?.get(name)?.as_array()?;
                list.get(index - 1)?
            }
        };
    }
    Some(current)
}
