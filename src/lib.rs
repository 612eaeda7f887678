//! Hierarchical configuration resolution.
//!
//! [`declare`] merges configuration from up to seven tiers, lowest to
//! highest precedence: coded defaults, system directories, the user's home,
//! the project directory, custom paths, environment variables and
//! command-line arguments. Failures of individual sources are returned as a
//! list next to the resolved [`Config`] instead of aborting resolution.

pub mod accessor;
pub mod cli;
pub mod cmdline;
pub mod discovery;
pub mod env;
pub mod error;
pub mod format;
pub mod loader;
pub mod location;
pub mod logging;
pub mod merge;
pub mod readers;
pub mod value;

pub use accessor::{Config, LoadedSource, Origin, Source, lookup};
pub use cmdline::{ArgumentProvider, Arguments, ProcessArgs, parse_args};
pub use env::{EnvOptions, EnvironmentProvider, ProcessEnv};
pub use error::{DeclareError, SourceError, SourceErrorKind};
pub use format::Format;
pub use loader::{
    ArgsSetting, ConfigLocations, EnvSetting, Options, Tier, declare, declare_from_process,
    declare_with_readers,
};
pub use location::LocationSpec;
pub use merge::{deep_merge, deep_merge_all};
pub use readers::{ReadError, Reader, ReaderRegistry};
pub use value::ConfigTree;
