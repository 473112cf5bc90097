//! The wdlparse command line tool.

use std::io::IsTerminal;
use std::io::stderr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use clap_verbosity_flag::Verbosity;
use clap_verbosity_flag::WarnLevel;
use colored::Colorize;
use tracing_log::AsTrace;
use tracing_subscriber::filter::LevelFilter;
use wdlparse::commands;
use wdlparse::config::Config;

#[derive(Subcommand)]
enum Commands {
    /// Parses a WDL document and reports its diagnostics and structure.
    Parse(commands::parse::Args),

    /// Describes the tasks, workflows, structs, and imports of a WDL
    /// document.
    Info(commands::info::Args),

    /// Draws the first workflow of a WDL document as a Mermaid flowchart.
    Diagram(commands::diagram::Args),

    /// Displays the configuration.
    Config(commands::config::Args),
}

#[derive(Parser)]
#[command(author, version, propagate_version = true, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// The configuration file to use instead of `wdlparse.toml` in the
    /// working directory.
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

/// Runs the command line tool.
fn inner() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_log::LogTracer::init()?;

    let level = cli.verbose.log_level_filter().as_trace();
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(stderr().is_terminal())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    // `--verbose` raises the log level and also requests full diagnostic detail
    let verbose = level > LevelFilter::WARN;

    match cli.command {
        Commands::Parse(args) => commands::parse::parse(args.apply(&config, verbose)),
        Commands::Info(args) => commands::info::info(args.apply(&config)),
        Commands::Diagram(args) => commands::diagram::diagram(args.apply(&config)),
        Commands::Config(args) => commands::config::config(args, config),
    }
}

fn main() {
    if let Err(e) = inner() {
        eprintln!(
            "{error}: {e:?}",
            error = if std::io::stderr().is_terminal() {
                "error".red().bold()
            } else {
                "error".normal()
            }
        );
        std::process::exit(1);
    }
}
