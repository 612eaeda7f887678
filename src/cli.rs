//! CLI definitions for the `tierconf` binary.

use clap::{Parser, ValueEnum};

use crate::env::EnvOptions;
use crate::loader::Options;

/// Output encoding for resolved values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Resolve and print an application's layered configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Application name used for paths and the env prefix
    pub app_name: String,

    /// Defaults file, given as a path with or without extension
    #[arg(long)]
    pub defaults: Option<String>,

    /// Custom config directory or file (repeatable)
    #[arg(long = "custom")]
    pub custom: Vec<String>,

    /// Extension to search, in priority order (repeatable)
    #[arg(long = "format")]
    pub formats: Vec<String>,

    /// Skip /etc
    #[arg(long)]
    pub no_system: bool,

    /// Skip the home directory and dotfile
    #[arg(long)]
    pub no_user: bool,

    /// Skip the current directory
    #[arg(long)]
    pub no_project: bool,

    /// Skip environment variables
    #[arg(long)]
    pub no_env: bool,

    /// Environment variable prefix (default: APP_NAME_)
    #[arg(long)]
    pub env_prefix: Option<String>,

    /// Look in <dir>/<app_name>/ before <dir>/
    #[arg(long)]
    pub app_dir: bool,

    /// Print only the value at this dotted path
    #[arg(long)]
    pub get: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,

    /// Arguments for the cmdline tier, e.g. `-- --server-port=8080`
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Translate flags into resolution options.
    pub fn to_options(&self) -> Options {
        let mut options = Options::new(&self.app_name).with_app_name_as_dir(self.app_dir);

        if let Some(defaults) = &self.defaults {
            options = options.with_defaults_file(defaults);
        }
        if !self.custom.is_empty() {
            options = options.with_custom_paths(self.custom.clone());
        }
        if !self.formats.is_empty() {
            options = options.with_formats(self.formats.clone());
        }
        if self.no_system {
            options = options.with_system(false);
        }
        if self.no_user {
            options = options.with_user(false);
        }
        if self.no_project {
            options = options.with_project(false);
        }
        if self.no_env {
            options = options.without_env();
        } else if let Some(prefix) = &self.env_prefix {
            options = options.with_env(EnvOptions::default().with_prefix(prefix));
        }

        options
    }
}
