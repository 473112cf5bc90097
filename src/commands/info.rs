//! Implementation of the `info` subcommand.

use std::path::PathBuf;

use anyhow::Result;
use anyhow::anyhow;
use clap::Parser;
use clap::ValueEnum;
use colored::Colorize;
use wdlparse_analysis::DocumentInfo;
use wdlparse_grammar::ParseOptions;
use wdlparse_grammar::parse_bytes;

use crate::config::Config;
use crate::source::read_source;

/// The output format of the `info` subcommand.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Human,
    /// Pretty-printed JSON.
    Json,
}

/// Arguments for the `info` subcommand.
#[derive(Parser, Debug)]
pub struct Args {
    /// The WDL source file to describe.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// The output format.
    #[arg(short, long, value_name = "FORMAT", default_value_t, value_enum)]
    pub format: Format,

    /// Adds basic metadata to the JSON output.
    #[arg(short, long)]
    pub extract_metadata: bool,

    /// Disables color output.
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Applies the configuration to the command arguments.
    pub fn apply(mut self, config: &Config) -> Self {
        self.no_color = self.no_color || !config.common.color;
        self.extract_metadata = self.extract_metadata || config.common.extract_metadata;
        self
    }
}

/// Performs the `info` command.
///
/// A document with errors is still described; the command fails only when no
/// document could be produced.
pub fn info(args: Args) -> Result<()> {
    let source = read_source(&args.path)?;
    let result = parse_bytes(
        &source,
        ParseOptions {
            verbose: false,
            extract_metadata: args.extract_metadata,
        },
    );

    let Some(document) = result.document() else {
        let message = result
            .diagnostics()
            .first()
            .map(|d| d.message().to_string())
            .unwrap_or_default();
        return Err(anyhow!(
            "failed to parse `{path}`: {message}",
            path = args.path.display()
        ));
    };

    if result.has_errors() {
        tracing::warn!(
            "`{path}` has errors; the description may be incomplete",
            path = args.path.display()
        );
    }

    let mut info = DocumentInfo::new(document, result.source());
    if let Some(metadata) = result.basic_metadata() {
        info = info.with_basic_metadata(metadata.clone());
    }

    match args.format {
        Format::Json => println!("{json}", json = serde_json::to_string_pretty(&info)?),
        Format::Human => {
            let text = info.to_human();
            if crate::use_color(args.no_color) {
                let mut lines = text.lines();
                if let Some(header) = lines.next() {
                    println!("{header}", header = header.cyan().bold());
                }

                for line in lines {
                    println!("{line}");
                }
            } else {
                print!("{text}");
            }
        }
    }

    Ok(())
}
