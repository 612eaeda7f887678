//! tierconf
//!
//! Resolves an application's configuration across defaults, system, user,
//! project, custom, environment and command-line tiers, then prints it.

use anyhow::{Result, bail};
use clap::Parser;
use tierconf::cli::{Cli, OutputFormat};
use tierconf::env::ProcessEnv;
use tierconf::logging::{self, LogTarget};
use tracing::{debug, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let target: LogTarget = cli.log.parse()?;
    logging::init(cli.verbose, &target)?;

    let options = cli.to_options();
    debug!(app = %options.app_name, "resolving configuration");
    let (config, errors) = tierconf::declare(&options, &ProcessEnv, &cli.args)?;

    for error in &errors {
        match &error.path {
            Some(path) => warn!(kind = %error.kind, path = %path.display(), "{}", error.message),
            None => warn!(kind = %error.kind, "{}", error.message),
        }
    }
    for source in config.sources() {
        debug!(origin = ?source.origin, path = ?source.path, "loaded");
    }

    let value = match &cli.get {
        Some(path) => match config.get(path) {
            Some(value) => value,
            None => bail!("'{}' is not set", path),
        },
        None => config.get_table(),
    };

    let rendered = match cli.output {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());

    Ok(())
}
