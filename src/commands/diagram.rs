//! Implementation of the `diagram` subcommand.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use wdlparse_analysis::build_diagram;
use wdlparse_grammar::ParseOptions;
use wdlparse_grammar::parse_bytes;

use crate::config::Config;
use crate::source::read_source;

/// Arguments for the `diagram` subcommand.
#[derive(Parser, Debug)]
pub struct Args {
    /// The WDL source file to draw.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// The file to write the Mermaid flowchart to; defaults to standard
    /// output.
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Disables color output.
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Applies the configuration to the command arguments.
    pub fn apply(mut self, config: &Config) -> Self {
        self.no_color = self.no_color || !config.common.color;
        self
    }
}

/// Performs the `diagram` command.
pub fn diagram(args: Args) -> Result<()> {
    let source = read_source(&args.path)?;
    let result = parse_bytes(&source, ParseOptions::default());
    if result.has_errors() {
        tracing::warn!(
            "`{path}` has errors; the diagram may be incomplete",
            path = args.path.display()
        );
    }

    let diagram = build_diagram(&result);
    match args.output {
        Some(output) => {
            fs::write(&output, &diagram).with_context(|| {
                format!(
                    "failed to write diagram to `{output}`",
                    output = output.display()
                )
            })?;

            let success = if crate::use_color(args.no_color) {
                "success".green().bold()
            } else {
                "success".normal()
            };
            println!(
                "{success}: wrote diagram to `{output}`",
                output = output.display()
            );
        }
        None => print!("{diagram}"),
    }

    Ok(())
}
