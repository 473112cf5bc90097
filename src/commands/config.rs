//! Implementation of the `config` subcommand.

use clap::Parser;
use clap::Subcommand;

use crate::config::Config;

/// Arguments for the `config` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct Args {
    /// The `config` subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommand,
}

/// Subcommands for the `config` command.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Prints the default configuration file.
    Init,

    /// Prints the effective configuration.
    Resolve,
}

/// Performs the `config` command.
pub fn config(args: Args, config: Config) -> anyhow::Result<()> {
    let config = match args.command {
        ConfigSubcommand::Init => Config::default(),
        ConfigSubcommand::Resolve => config,
    };

    print!("{toml}", toml = config.to_toml()?);
    Ok(())
}
