//! The human-readable renderer.

use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::Config;
use codespan_reporting::term::termcolor::Buffer;
use colored::Colorize;
use wdlparse_grammar::Diagnostic;
use wdlparse_grammar::Document;
use wdlparse_grammar::ParseResult;
use wdlparse_grammar::Severity;

use super::DiagnosticCounts;
use super::RenderOptions;
use super::tree;

/// Renders a parse result for humans.
///
/// The diagnostics come first, followed by a summary of the document and a
/// status line. When verbose, the diagnostics are full reports and the
/// summary is followed by an outline of the syntax tree.
pub(super) fn render(result: &ParseResult, options: &RenderOptions) -> String {
    let mut output = String::new();

    for diagnostic in result.diagnostics() {
        if options.verbose {
            output.push_str(&full(result, diagnostic, options));
        } else {
            output.push_str(&concise(result, diagnostic, options.color));
            output.push('\n');
        }
    }

    if !result.diagnostics().is_empty() {
        output.push('\n');
    }

    output.push_str(&summary(result.document()));

    if options.verbose
        && let Some(document) = result.document()
    {
        output.push('\n');
        output.push_str(&tree::outline(document));
    }

    output.push('\n');
    output.push_str(&status(result, options.color));
    output.push('\n');
    output
}

/// Formats the name of a severity, colored if requested.
fn severity(severity: Severity, color: bool) -> String {
    let name = severity.to_string();
    if !color {
        return name;
    }

    match severity {
        Severity::Error => name.red().bold().to_string(),
        Severity::Warning => name.yellow().bold().to_string(),
        Severity::Note => name.cyan().bold().to_string(),
    }
}

/// Formats a diagnostic as a single line.
fn concise(result: &ParseResult, diagnostic: &Diagnostic, color: bool) -> String {
    let span = diagnostic.primary_span(result.source().len());
    let position = result.lines().position(span.start());
    format!(
        "{severity}[{line}:{column}]: {message}",
        severity = severity(diagnostic.severity(), color),
        line = position.line,
        column = position.column,
        message = diagnostic.message(),
    )
}

/// Formats a diagnostic as a full report with source snippets.
///
/// A diagnostic that cannot be reported against the source falls back to a
/// single line.
fn full(result: &ParseResult, diagnostic: &Diagnostic, options: &RenderOptions) -> String {
    let file = SimpleFile::new(options.source_name(), result.source());
    let mut buffer = if options.color {
        Buffer::ansi()
    } else {
        Buffer::no_color()
    };

    match term::emit_to_write_style(
        &mut buffer,
        &Config::default(),
        &file,
        &diagnostic.to_codespan(()),
    ) {
        Ok(()) => String::from_utf8_lossy(buffer.as_slice()).into_owned(),
        Err(e) => {
            tracing::warn!("failed to emit diagnostic: {e}");
            format!("{line}\n", line = concise(result, diagnostic, options.color))
        }
    }
}

/// Formats a summary of the top-level items of a document.
fn summary(document: Option<&Document>) -> String {
    let Some(document) = document else {
        return "Document summary:\n  no document was produced\n".to_string();
    };

    /// Formats a count of named items.
    fn named<'a>(label: &str, names: impl Iterator<Item = Option<&'a str>>) -> String {
        let names: Vec<_> = names.map(|n| n.unwrap_or("<missing>")).collect();
        if names.is_empty() {
            format!("  {label}: 0\n")
        } else {
            format!(
                "  {label}: {count} ({names})\n",
                count = names.len(),
                names = names.join(", ")
            )
        }
    }

    let mut output = String::from("Document summary:\n");
    output.push_str(&format!(
        "  version: {version}\n",
        version = document.version().unwrap_or("<missing>")
    ));
    output.push_str(&format!(
        "  imports: {count}\n",
        count = document.imports().count()
    ));
    output.push_str(&named("structs", document.structs().map(|s| s.name())));
    output.push_str(&named("tasks", document.tasks().map(|t| t.name())));
    output.push_str(&named("workflows", document.workflows().map(|w| w.name())));
    output
}

/// Formats the status line of a parse.
fn status(result: &ParseResult, color: bool) -> String {
    let counts = DiagnosticCounts::new(result.diagnostics());
    let (ok, text) = if result.document().is_none() {
        (false, "failed to parse")
    } else if result.has_errors() {
        (false, "parsed with errors")
    } else {
        (true, "parsed successfully")
    };

    let marker = match (ok, color) {
        (true, true) => "✓".green().bold().to_string(),
        (true, false) => "✓".to_string(),
        (false, true) => "✗".red().bold().to_string(),
        (false, false) => "✗".to_string(),
    };

    format!("{marker} {text} ({counts})")
}
