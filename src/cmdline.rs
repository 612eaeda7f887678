//! Argument provider and the cmdline tier transformation.
//!
//! Grammar for raw tokens:
//! - `--key=value` assigns `value`
//! - `--key value` assigns `value` when it does not start with `--`
//! - `--flag` alone (or followed by another `--...`) is `true`
//! - anything not starting with `--` is ignored
//!
//! Keys are lower-cased and `-` becomes a path separator, so
//! `--server-port=8080` sets `server.port = 8080`.

use serde_json::Value;
use tracing::trace;

use crate::value::{coerce_scalar, empty_tree, insert_path};

/// What an argument provider hands to the cmdline tier.
#[derive(Debug, Clone, PartialEq)]
pub enum Arguments {
    /// argv-style tokens, program name excluded.
    Raw(Vec<String>),
    /// An already parsed tree, used as-is.
    Parsed(Value),
}

/// Source of command-line arguments.
pub trait ArgumentProvider {
    fn arguments(&self) -> Arguments;
}

/// The real process arguments, minus the program name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessArgs;

impl ArgumentProvider for ProcessArgs {
    fn arguments(&self) -> Arguments {
        Arguments::Raw(
            std::env::args_os()
                .skip(1)
                .filter_map(|arg| arg.into_string().ok())
                .collect(),
        )
    }
}

impl ArgumentProvider for Vec<String> {
    fn arguments(&self) -> Arguments {
        Arguments::Raw(self.clone())
    }
}

impl ArgumentProvider for Value {
    fn arguments(&self) -> Arguments {
        Arguments::Parsed(self.clone())
    }
}

/// A provider backed by a closure returning raw tokens.
pub struct ArgsFn<F>(pub F);

impl<F> ArgumentProvider for ArgsFn<F>
where
    F: Fn() -> Vec<String>,
{
    fn arguments(&self) -> Arguments {
        Arguments::Raw((self.0)())
    }
}

/// Turn a flag name into a dotted path: `Server-Port` → `server.port`.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase().replace('-', ".")
}

/// Parse raw tokens into a tree. Values are always coerced.
pub fn parse_args<S: AsRef<str>>(tokens: &[S]) -> Value {
    let mut tree = empty_tree();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i].as_ref();
        i += 1;

        let Some(body) = token.strip_prefix("--") else {
            continue;
        };
        if body.is_empty() {
            continue;
        }

        let (key, value) = match body.split_once('=') {
            Some((key, raw)) => (key, coerce_scalar(raw)),
            None => match tokens.get(i).map(|next| next.as_ref()) {
                Some(next) if !next.starts_with("--") => {
                    i += 1;
                    (body, coerce_scalar(next))
                }
                _ => (body, Value::Bool(true)),
            },
        };

        let path = normalize_key(key);
        trace!(flag = %token, key = %path, "cmdline override");
        insert_path(&mut tree, &path, value);
    }

    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_equals_assignment_with_hyphen_path() {
        let tree = parse_args(&args(&["--server-port=8080"]));
        assert_eq!(tree, json!({"server": {"port": 8080}}));
    }

    #[test]
    fn test_space_separated_value() {
        let tree = parse_args(&args(&["--host", "example.com", "--retries", "3"]));
        assert_eq!(tree, json!({"host": "example.com", "retries": 3}));
    }

    #[test]
    fn test_bare_flags_are_true() {
        let tree = parse_args(&args(&["--verbose", "--dry-run"]));
        assert_eq!(tree, json!({"verbose": true, "dry": {"run": true}}));
    }

    #[test]
    fn test_negative_number_value() {
        let tree = parse_args(&args(&["--offset", "-5"]));
        assert_eq!(tree, json!({"offset": -5}));
    }

    #[test]
    fn test_keys_lower_cased_and_positional_ignored() {
        let tree = parse_args(&args(&["serve", "--LOG-Level=DEBUG", "extra", "--", "-x"]));
        assert_eq!(tree, json!({"log": {"level": "DEBUG"}}));
    }

    #[test]
    fn test_empty_value_after_equals() {
        let tree = parse_args(&args(&["--name="]));
        assert_eq!(tree, json!({"name": ""}));
    }

    #[test]
    fn test_value_coercion() {
        let tree = parse_args(&args(&["--a=true", "--b=False", "--c=1.25"]));
        assert_eq!(tree, json!({"a": true, "b": false, "c": 1.25}));
    }

    #[test]
    fn test_providers() {
        let raw = args(&["--x=1"]);
        assert_eq!(raw.arguments(), Arguments::Raw(raw.clone()));
        assert_eq!(json!({"x": 1}).arguments(), Arguments::Parsed(json!({"x": 1})));
        let f = ArgsFn(|| vec!["--y".to_string()]);
        assert_eq!(f.arguments(), Arguments::Raw(vec!["--y".to_string()]));
    }
}
