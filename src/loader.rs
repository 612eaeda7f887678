//! Declarative configuration resolution across precedence tiers.
//!
//! Tiers are processed strictly in order and each one is deep-merged over
//! the result of the previous ones:
//! 0. **Defaults** - a table, or a file given as an extensionless path
//! 1. **System** - `/etc/<app>/`, `/etc/`
//! 2. **User** - `~/.config/`, `~/`, plus the `~/.<app>.<ext>` dotfile
//! 3. **Project** - the current directory
//! 4. **Custom** - caller-supplied directories or files
//! 5. **Env** - `<APP>_SECTION__KEY=value` variables
//! 6. **Cmdline** - `--section-key=value` arguments
//!
//! Problems with individual sources are collected, never raised.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::{debug, trace};

use crate::accessor::{Config, LoadedSource, Origin};
use crate::cmdline::{ArgumentProvider, Arguments, ProcessArgs, parse_args};
use crate::discovery::{Discovery, FileOutcome};
use crate::env::{
    DEFAULT_NESTED_SEPARATOR, EnvOptions, EnvironmentProvider, ProcessEnv, default_prefix,
    env_tree,
};
use crate::error::{DeclareError, SourceError};
use crate::format::{DEFAULT_FORMATS, Format};
use crate::location::{
    LocationSpec, project_defaults, resolve, system_defaults, user_defaults, user_dotfile,
};
use crate::merge::deep_merge;
use crate::readers::ReaderRegistry;
use crate::value::{empty_tree, type_name};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Coded defaults (lowest priority)
    Defaults = 0,
    System = 1,
    User = 2,
    Project = 3,
    Custom = 4,
    Env = 5,
    /// Command-line arguments (highest priority)
    Cmdline = 6,
}

impl Tier {
    /// Every tier, in processing order.
    pub const ALL: [Tier; 7] = [
        Tier::Defaults,
        Tier::System,
        Tier::User,
        Tier::Project,
        Tier::Custom,
        Tier::Env,
        Tier::Cmdline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Defaults => "defaults",
            Tier::System => "system",
            Tier::User => "user",
            Tier::Project => "project",
            Tier::Custom => "custom",
            Tier::Env => "env",
            Tier::Cmdline => "cmdline",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether and how the env tier runs. `false` disables it; `true` or a
/// missing entry enables it with default settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum EnvSetting {
    Disabled,
    Enabled(EnvOptions),
}

impl Default for EnvSetting {
    fn default() -> Self {
        EnvSetting::Enabled(EnvOptions::default())
    }
}

impl TryFrom<Value> for EnvSetting {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(false) => Ok(EnvSetting::Disabled),
            Value::Bool(true) | Value::Null => Ok(EnvSetting::default()),
            table @ Value::Object(_) => serde_json::from_value(table)
                .map(EnvSetting::Enabled)
                .map_err(|e| format!("invalid env options: {}", e)),
            other => Err(format!(
                "env must be false, true, or a table, got {}",
                type_name(&other)
            )),
        }
    }
}

impl From<EnvSetting> for Value {
    fn from(setting: EnvSetting) -> Self {
        match setting {
            EnvSetting::Disabled => Value::Bool(false),
            EnvSetting::Enabled(options) => {
                serde_json::to_value(options).unwrap_or(Value::Bool(true))
            }
        }
    }
}

/// Whether and how the cmdline tier runs. `false` disables it; `true` or a
/// missing entry reads the argument provider; a table is used as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ArgsSetting {
    Disabled,
    FromProvider,
    Table(Value),
}

impl Default for ArgsSetting {
    fn default() -> Self {
        ArgsSetting::FromProvider
    }
}

impl TryFrom<Value> for ArgsSetting {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(false) => Ok(ArgsSetting::Disabled),
            Value::Bool(true) | Value::Null => Ok(ArgsSetting::FromProvider),
            table @ Value::Object(_) => Ok(ArgsSetting::Table(table)),
            other => Err(format!(
                "cmd_args must be false, true, or a table, got {}",
                type_name(&other)
            )),
        }
    }
}

impl From<ArgsSetting> for Value {
    fn from(setting: ArgsSetting) -> Self {
        match setting {
            ArgsSetting::Disabled => Value::Bool(false),
            ArgsSetting::FromProvider => Value::Bool(true),
            ArgsSetting::Table(table) => table,
        }
    }
}

/// Where the file tiers look.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLocations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<LocationSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<LocationSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<LocationSpec>,
    /// Directories or extensionless file paths. No defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_paths: Option<LocationSpec>,
    /// Base names probed in each directory; `["config", app_name]` if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_names: Option<Vec<String>>,
    /// Probe `<dir>/<app_name>/` before `<dir>/`.
    pub use_app_name_as_dir: bool,
}

/// Options for [`declare`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub app_name: String,
    /// A table, or an extensionless path to a defaults file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Value>,
    pub config_locations: ConfigLocations,
    /// Extensions in priority order; [`DEFAULT_FORMATS`] if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<String>>,
    pub env: EnvSetting,
    pub cmd_args: ArgsSetting,
}

impl Options {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    /// Parse options from a loosely-typed value, e.g. one read from a file.
    ///
    /// Fails when the value is not a table or `app_name` is not a
    /// non-empty string.
    pub fn from_value(value: Value) -> Result<Self, DeclareError> {
        let Value::Object(map) = &value else {
            return Err(DeclareError::InvalidOptions(type_name(&value)));
        };
        match map.get("app_name") {
            Some(Value::String(name)) if !name.is_empty() => {}
            _ => return Err(DeclareError::MissingAppName),
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_defaults(mut self, table: Value) -> Self {
        self.defaults = Some(table);
        self
    }

    /// Load defaults from `<base>.<ext>`.
    pub fn with_defaults_file(mut self, base: impl Into<String>) -> Self {
        self.defaults = Some(Value::String(base.into()));
        self
    }

    pub fn with_system(mut self, spec: impl Into<LocationSpec>) -> Self {
        self.config_locations.system = Some(spec.into());
        self
    }

    pub fn with_user(mut self, spec: impl Into<LocationSpec>) -> Self {
        self.config_locations.user = Some(spec.into());
        self
    }

    pub fn with_project(mut self, spec: impl Into<LocationSpec>) -> Self {
        self.config_locations.project = Some(spec.into());
        self
    }

    pub fn with_custom_paths(mut self, spec: impl Into<LocationSpec>) -> Self {
        self.config_locations.custom_paths = Some(spec.into());
        self
    }

    pub fn with_file_names(mut self, names: Vec<String>) -> Self {
        self.config_locations.file_names = Some(names);
        self
    }

    pub fn with_app_name_as_dir(mut self, enabled: bool) -> Self {
        self.config_locations.use_app_name_as_dir = enabled;
        self
    }

    pub fn with_formats(mut self, formats: Vec<String>) -> Self {
        self.formats = Some(formats);
        self
    }

    pub fn with_env(mut self, env: EnvOptions) -> Self {
        self.env = EnvSetting::Enabled(env);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env = EnvSetting::Disabled;
        self
    }

    /// Use a pre-parsed table instead of the argument provider.
    pub fn with_cmd_args(mut self, table: Value) -> Self {
        self.cmd_args = ArgsSetting::Table(table);
        self
    }

    pub fn without_cmd_args(mut self) -> Self {
        self.cmd_args = ArgsSetting::Disabled;
        self
    }

    /// Disable every file location tier (system, user, project).
    pub fn without_file_tiers(self) -> Self {
        self.with_system(false).with_user(false).with_project(false)
    }
}

/// Resolve configuration across all tiers with the built-in readers.
///
/// Returns the accessor and every source error met along the way. Only
/// invalid options are fatal.
pub fn declare(
    options: &Options,
    env: &dyn EnvironmentProvider,
    args: &dyn ArgumentProvider,
) -> Result<(Config, Vec<SourceError>), DeclareError> {
    declare_with_readers(options, env, args, &ReaderRegistry::default())
}

/// [`declare`] against the real process environment and arguments.
pub fn declare_from_process(
    options: &Options,
) -> Result<(Config, Vec<SourceError>), DeclareError> {
    declare(options, &ProcessEnv, &ProcessArgs)
}

/// [`declare`] with an explicit reader registry.
pub fn declare_with_readers(
    options: &Options,
    env: &dyn EnvironmentProvider,
    args: &dyn ArgumentProvider,
    registry: &ReaderRegistry,
) -> Result<(Config, Vec<SourceError>), DeclareError> {
    if options.app_name.is_empty() {
        return Err(DeclareError::MissingAppName);
    }

    let mut resolution = Resolution::new(options, env, args, registry);
    resolution.load_defaults();
    resolution.load_system();
    resolution.load_user();
    resolution.load_project();
    resolution.load_custom();
    resolution.load_env();
    resolution.load_cmdline();
    Ok(resolution.finish())
}

/// State of one `declare` run.
struct Resolution<'a> {
    options: &'a Options,
    env: &'a dyn EnvironmentProvider,
    args: &'a dyn ArgumentProvider,
    registry: &'a ReaderRegistry,
    formats: Vec<(String, Format)>,
    file_names: Vec<String>,
    tree: Value,
    sources: Vec<LoadedSource>,
    errors: Vec<SourceError>,
}

impl<'a> Resolution<'a> {
    fn new(
        options: &'a Options,
        env: &'a dyn EnvironmentProvider,
        args: &'a dyn ArgumentProvider,
        registry: &'a ReaderRegistry,
    ) -> Self {
        let mut errors = Vec::new();

        let extensions: Vec<String> = match &options.formats {
            Some(formats) => formats.clone(),
            None => DEFAULT_FORMATS.iter().map(|ext| ext.to_string()).collect(),
        };
        let mut formats = Vec::with_capacity(extensions.len());
        for ext in extensions {
            let ext = ext.trim_start_matches('.').to_string();
            match Format::from_extension(&ext) {
                Some(format) if registry.supports(format) => formats.push((ext, format)),
                _ => errors.push(SourceError::options_validation(
                    "formats",
                    format!("No reader for extension '{}'", ext),
                )),
            }
        }

        let file_names = options
            .config_locations
            .file_names
            .clone()
            .unwrap_or_else(|| vec!["config".to_string(), options.app_name.clone()]);

        Self {
            options,
            env,
            args,
            registry,
            formats,
            file_names,
            tree: empty_tree(),
            sources: Vec::new(),
            errors,
        }
    }

    fn discovery(&self) -> Discovery<'_> {
        Discovery::new(
            self.registry,
            &self.formats,
            &self.file_names,
            &self.options.app_name,
        )
        .with_app_name_as_dir(self.options.config_locations.use_app_name_as_dir)
    }

    /// Merge one tier fragment into the accumulated tree.
    fn merge(&mut self, tier: Tier, path: Option<&Path>, fragment: &Value) {
        match fragment {
            Value::Object(map) if map.is_empty() => {}
            Value::Object(_) => {
                trace!(%tier, "merging fragment");
                self.tree = deep_merge(&self.tree, fragment);
                self.sources.push(LoadedSource {
                    origin: Origin::Tier(tier),
                    path: path.map(Path::to_path_buf),
                });
            }
            other => self.errors.push(SourceError::new(
                tier.into(),
                format!("Expected a table from the {} tier, got {}", tier, type_name(other)),
            )),
        }
    }

    /// Fold a discovery outcome into the run. Absence is not an error here.
    fn apply(&mut self, tier: Tier, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Loaded { path, tree } => self.merge(tier, Some(path.as_path()), &tree),
            FileOutcome::Empty(path) => {
                trace!(%tier, path = %path.display(), "empty config file");
            }
            FileOutcome::Failed { path, error } => {
                self.errors
                    .push(SourceError::read_failure(tier.into(), &path, &error));
            }
            FileOutcome::Missing => {}
        }
    }

    fn load_defaults(&mut self) {
        let options = self.options;
        match &options.defaults {
            None | Some(Value::Null) => {}
            Some(table @ Value::Object(_)) => self.merge(Tier::Defaults, None, table),
            Some(Value::String(base)) => {
                let base = Path::new(base);
                let outcome = self.discovery().load_base(base);
                if outcome.is_missing() {
                    debug!(path = %base.display(), "defaults file not found");
                    self.errors.push(SourceError::defaults_file_not_found(base));
                } else {
                    self.apply(Tier::Defaults, outcome);
                }
            }
            Some(other) => self.errors.push(SourceError::options_validation(
                "defaults",
                format!(
                    "defaults must be a table or a file path, got {}",
                    type_name(other)
                ),
            )),
        }
    }

    /// Run discovery over every directory of a location tier.
    fn load_directories(
        &mut self,
        tier: Tier,
        spec: Option<&LocationSpec>,
        tier_defaults: &[String],
    ) {
        let dirs = resolve(spec, tier_defaults);
        debug!(%tier, ?dirs, "searching directories");
        for dir in dirs {
            let outcome = self.discovery().discover_dir(Path::new(&dir));
            self.apply(tier, outcome);
        }
    }

    fn load_system(&mut self) {
        let options = self.options;
        self.load_directories(
            Tier::System,
            options.config_locations.system.as_ref(),
            &system_defaults(&options.app_name),
        );
    }

    fn load_user(&mut self) {
        let options = self.options;
        let spec = options.config_locations.user.as_ref();
        let home = self.env.home_dir();

        self.load_directories(Tier::User, spec, &user_defaults(home.as_deref()));

        if spec.is_some_and(LocationSpec::is_disabled) {
            return;
        }
        if let Some(base) = user_dotfile(home.as_deref(), &options.app_name) {
            let outcome = self.discovery().load_base(&base);
            self.apply(Tier::User, outcome);
        }
    }

    fn load_project(&mut self) {
        let options = self.options;
        self.load_directories(
            Tier::Project,
            options.config_locations.project.as_ref(),
            &project_defaults(),
        );
    }

    fn load_custom(&mut self) {
        let options = self.options;
        let entries = resolve(options.config_locations.custom_paths.as_ref(), &[]);

        for entry in entries {
            let path = Path::new(&entry);
            if path.is_dir() {
                let discovery = self.discovery();
                let mut outcome = discovery.discover_dir(path);
                if outcome.is_missing() {
                    outcome = discovery.scan_dir(path);
                }
                if outcome.is_missing() {
                    debug!(path = %path.display(), "no config file in custom directory");
                }
                self.apply(Tier::Custom, outcome);
            } else {
                let outcome = self.discovery().load_base(path);
                if outcome.is_missing() {
                    debug!(path = %path.display(), "custom config file not found");
                    self.errors.push(SourceError::custom_file_not_found(path));
                } else {
                    self.apply(Tier::Custom, outcome);
                }
            }
        }
    }

    fn load_env(&mut self) {
        let options = self.options;
        let EnvSetting::Enabled(env_options) = &options.env else {
            debug!("env tier disabled");
            return;
        };

        let prefix = env_options
            .prefix
            .clone()
            .unwrap_or_else(|| default_prefix(&options.app_name));
        let separator = if env_options.nested_separator.is_empty() {
            self.errors.push(SourceError::options_validation(
                "env.nested_separator",
                "nested_separator must not be empty",
            ));
            DEFAULT_NESTED_SEPARATOR
        } else {
            env_options.nested_separator.as_str()
        };

        debug!(%prefix, separator, "reading environment");
        let tree = env_tree(
            self.env,
            &prefix,
            separator,
            env_options.auto_parse_types,
            &self.tree,
        );
        self.merge(Tier::Env, None, &tree);
    }

    fn load_cmdline(&mut self) {
        let options = self.options;
        let tree = match &options.cmd_args {
            ArgsSetting::Disabled => {
                debug!("cmdline tier disabled");
                return;
            }
            ArgsSetting::Table(table) => table.clone(),
            ArgsSetting::FromProvider => match self.args.arguments() {
                Arguments::Raw(tokens) => parse_args(&tokens),
                Arguments::Parsed(tree) => tree,
            },
        };
        self.merge(Tier::Cmdline, None, &tree);
    }

    fn finish(self) -> (Config, Vec<SourceError>) {
        debug!(
            sources = self.sources.len(),
            errors = self.errors.len(),
            "configuration resolved"
        );
        let config = Config::from_parts(self.tree, self.sources, self.errors.clone());
        (config, self.errors)
    }
}
