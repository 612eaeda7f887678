//! Error types for configuration resolution.
//!
//! Two classes exist. [`DeclareError`] is fatal and returned before any tier
//! is touched. [`SourceError`] records are collected while tiers load and
//! never stop resolution.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::loader::Tier;
use crate::readers::ReadError;

/// Programmer errors in the options passed to `declare`.
#[derive(Debug, Error)]
pub enum DeclareError {
    #[error("options must be a table, got {0}")]
    InvalidOptions(&'static str),

    #[error("options.app_name must be a non-empty string")]
    MissingAppName,

    #[error("invalid options: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Kinds of recoverable source errors.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    // Options that were accepted but could not be used
    OptionsValidation,

    // Files that were required but absent
    DefaultsFileNotFound,
    CustomFileNotFound,

    // Parse failures, tagged by the tier that found the file
    Defaults,
    System,
    User,
    Project,
    Custom,
    Env,
    Cmdline,

    // Files added through the builder API
    File,
}

impl SourceErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceErrorKind::OptionsValidation => "options_validation",
            SourceErrorKind::DefaultsFileNotFound => "defaults_file_not_found",
            SourceErrorKind::CustomFileNotFound => "custom_file_not_found",
            SourceErrorKind::Defaults => "defaults",
            SourceErrorKind::System => "system",
            SourceErrorKind::User => "user",
            SourceErrorKind::Project => "project",
            SourceErrorKind::Custom => "custom",
            SourceErrorKind::Env => "env",
            SourceErrorKind::Cmdline => "cmdline",
            SourceErrorKind::File => "file",
        }
    }
}

impl From<Tier> for SourceErrorKind {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Defaults => SourceErrorKind::Defaults,
            Tier::System => SourceErrorKind::System,
            Tier::User => SourceErrorKind::User,
            Tier::Project => SourceErrorKind::Project,
            Tier::Custom => SourceErrorKind::Custom,
            Tier::Env => SourceErrorKind::Env,
            Tier::Cmdline => SourceErrorKind::Cmdline,
        }
    }
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable problem with one configuration source.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceError {
    pub kind: SourceErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl SourceError {
    pub fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            key: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    // Convenience constructors

    pub fn options_validation(key: &str, reason: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::OptionsValidation, reason).with_key(key)
    }

    pub fn defaults_file_not_found(path: &Path) -> Self {
        Self::new(
            SourceErrorKind::DefaultsFileNotFound,
            format!("Defaults file not found: {}", path.display()),
        )
        .with_path(path)
    }

    pub fn custom_file_not_found(path: &Path) -> Self {
        Self::new(
            SourceErrorKind::CustomFileNotFound,
            format!("Custom config file not found: {}", path.display()),
        )
        .with_path(path)
    }

    pub fn read_failure(kind: SourceErrorKind, path: &Path, err: &ReadError) -> Self {
        Self::new(kind, err.to_string()).with_path(path)
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for SourceError {}
