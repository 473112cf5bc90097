//! Renderers of parse results.
//!
//! Every renderer is a pure function over a [ParseResult]; rendering the same
//! result twice produces the same output.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use wdlparse_grammar::Diagnostic;
use wdlparse_grammar::ParseResult;
use wdlparse_grammar::Severity;

mod human;
mod json;
mod tree;

pub use json::DiagnosticDetail;
pub use json::DiagnosticReport;
pub use json::LabelReport;
pub use json::ParseReport;
pub use tree::outline;

/// The name given to the source in full diagnostic reports when no path is
/// known.
const DEFAULT_SOURCE_NAME: &str = "<source>";

/// An error for an unknown output format name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown output format `{0}` (expected `human`, `json`, or `tree`)")]
pub struct UnknownFormat(String);

/// The output format of a rendered parse result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable diagnostics followed by a summary and a status line.
    #[default]
    Human,
    /// A JSON parse report.
    Json,
    /// An indented outline of the syntax tree.
    Tree,
}

impl OutputFormat {
    /// Gets every output format.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::Human, Self::Json, Self::Tree].into_iter()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Json => write!(f, "json"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .find(|f| f.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Options for rendering a parse result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether full diagnostic detail is rendered.
    pub verbose: bool,
    /// Whether the human format uses ANSI colors.
    pub color: bool,
    /// The name of the source shown in full diagnostic reports.
    pub path: Option<String>,
}

impl RenderOptions {
    /// Gets the name of the source shown in full diagnostic reports.
    fn source_name(&self) -> &str {
        self.path.as_deref().unwrap_or(DEFAULT_SOURCE_NAME)
    }
}

/// Counts the diagnostics of a parse by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticCounts {
    /// The number of errors.
    pub errors: usize,
    /// The number of warnings.
    pub warnings: usize,
    /// The number of notes.
    pub notes: usize,
}

impl DiagnosticCounts {
    /// Counts the given diagnostics.
    pub fn new<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> Self {
        let mut counts = Self::default();
        for diagnostic in diagnostics {
            match diagnostic.severity() {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Note => counts.notes += 1,
            }
        }

        counts
    }

    /// Gets the total number of diagnostics.
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.notes
    }
}

impl fmt::Display for DiagnosticCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total() == 0 {
            return write!(f, "no diagnostics");
        }

        let mut first = true;
        for (count, name) in [
            (self.errors, "error"),
            (self.warnings, "warning"),
            (self.notes, "note"),
        ] {
            if count == 0 {
                continue;
            }

            if !first {
                write!(f, ", ")?;
            }

            first = false;
            write!(f, "{count} {name}{s}", s = if count == 1 { "" } else { "s" })?;
        }

        Ok(())
    }
}

/// Renders a parse result in the given format.
///
/// The verbosity is taken from the options of the parse; colors are not
/// used.
pub fn render(result: &ParseResult, format: OutputFormat) -> String {
    render_with(
        result,
        format,
        &RenderOptions {
            verbose: result.options().verbose,
            ..Default::default()
        },
    )
}

/// Renders a parse result in the given format with the given options.
pub fn render_with(result: &ParseResult, format: OutputFormat, options: &RenderOptions) -> String {
    tracing::debug!(%format, verbose = options.verbose, "rendering parse result");

    match format {
        OutputFormat::Human => human::render(result, options),
        OutputFormat::Json => json::render(result, options),
        OutputFormat::Tree => tree::render(result),
    }
}
