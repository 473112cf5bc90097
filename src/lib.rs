//! A command line tool for parsing and describing Workflow Description
//! Language (WDL) documents.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

use std::io::IsTerminal;
use std::io::stdout;

pub mod commands;
pub mod config;
pub mod source;

/// Determines if colors should be written to standard output.
fn use_color(no_color: bool) -> bool {
    !no_color && stdout().is_terminal()
}
