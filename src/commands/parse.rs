//! Implementation of the `parse` subcommand.

use std::path::PathBuf;

use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use wdlparse_analysis::DiagnosticCounts;
use wdlparse_analysis::OutputFormat;
use wdlparse_analysis::RenderOptions;
use wdlparse_analysis::render_with;
use wdlparse_grammar::ParseOptions;
use wdlparse_grammar::parse_bytes;

use crate::config::Config;
use crate::source::read_source;

/// Arguments for the `parse` subcommand.
#[derive(Parser, Debug)]
pub struct Args {
    /// The WDL source file to parse.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// The output format (`human`, `json`, or `tree`).
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Extracts basic metadata alongside the parse.
    #[arg(short, long)]
    pub extract_metadata: bool,

    /// Disables color output.
    #[arg(long)]
    pub no_color: bool,

    /// Renders full diagnostic detail; set by the global `--verbose` flag.
    #[arg(skip)]
    pub verbose: bool,
}

impl Args {
    /// Applies the configuration to the command arguments.
    pub fn apply(mut self, config: &Config, verbose: bool) -> Self {
        self.no_color = self.no_color || !config.common.color;
        self.extract_metadata = self.extract_metadata || config.common.extract_metadata;
        self.format = self.format.or(Some(config.parse.format));
        self.verbose = verbose || config.parse.verbose;
        self
    }
}

/// Performs the `parse` command.
///
/// The rendered result is written to standard output; the command fails if
/// the parse produced any errors.
pub fn parse(args: Args) -> Result<()> {
    let source = read_source(&args.path)?;
    let format = args.format.unwrap_or_default();
    let result = parse_bytes(
        &source,
        ParseOptions {
            verbose: args.verbose,
            extract_metadata: args.extract_metadata,
        },
    );

    tracing::info!(
        "parsed `{path}` with {count} diagnostic(s)",
        path = args.path.display(),
        count = result.diagnostics_count()
    );

    let output = render_with(
        &result,
        format,
        &RenderOptions {
            verbose: args.verbose,
            color: crate::use_color(args.no_color),
            path: Some(args.path.display().to_string()),
        },
    );
    println!("{output}", output = output.trim_end());

    let counts = DiagnosticCounts::new(result.diagnostics());
    if counts.errors > 0 {
        bail!(
            "failing due to {errors} error{s}",
            errors = counts.errors,
            s = if counts.errors == 1 { "" } else { "s" }
        );
    }

    Ok(())
}
