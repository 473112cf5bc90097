//! The JSON renderer.

use serde::Deserialize;
use serde::Serialize;
use wdlparse_grammar::BasicMetadata;
use wdlparse_grammar::Diagnostic;
use wdlparse_grammar::Document;
use wdlparse_grammar::Lines;
use wdlparse_grammar::ParseResult;
use wdlparse_grammar::Severity;
use wdlparse_grammar::SourceSpan;

use super::RenderOptions;

/// A label of a diagnostic in a parse report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelReport {
    /// The message of the label.
    pub message: String,
    /// The span of the label.
    pub span: SourceSpan,
}

/// The verbose detail of a diagnostic in a parse report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticDetail {
    /// The fix suggested by the diagnostic.
    pub hint: Option<String>,
    /// Every label of the diagnostic; the first is the primary label.
    pub labels: Vec<LabelReport>,
}

/// A diagnostic in a parse report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The message of the diagnostic.
    pub message: String,
    /// The primary span of the diagnostic.
    pub span: SourceSpan,
    /// The detail of the diagnostic, present only in verbose reports.
    #[serde(flatten)]
    pub detail: Option<DiagnosticDetail>,
}

impl DiagnosticReport {
    /// Creates a report of a diagnostic.
    fn new(diagnostic: &Diagnostic, lines: &Lines, end_of_input: usize, verbose: bool) -> Self {
        Self {
            severity: diagnostic.severity(),
            message: diagnostic.message().to_string(),
            span: lines.source_span(diagnostic.primary_span(end_of_input)),
            detail: verbose.then(|| DiagnosticDetail {
                hint: diagnostic.fix().map(str::to_string),
                labels: diagnostic
                    .labels()
                    .map(|l| LabelReport {
                        message: l.message().to_string(),
                        span: lines.source_span(l.span()),
                    })
                    .collect(),
            }),
        }
    }
}

/// The serializable report of a parse.
///
/// Fields serialize in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseReport {
    /// The version of the document.
    pub version: Option<String>,
    /// The syntax tree of the document.
    pub document: Option<Document>,
    /// The diagnostics of the parse, in emission order.
    pub diagnostics: Vec<DiagnosticReport>,
    /// The count of diagnostics.
    pub diagnostics_count: usize,
    /// Whether any diagnostic is an error.
    pub has_errors: bool,
    /// The basic metadata, present only when extraction was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_metadata: Option<BasicMetadata>,
}

impl ParseReport {
    /// Creates the report of a parse result.
    pub fn new(result: &ParseResult, verbose: bool) -> Self {
        let end = result.source().len();
        Self {
            version: result.version().map(str::to_string),
            document: result.document().cloned(),
            diagnostics: result
                .diagnostics()
                .iter()
                .map(|d| DiagnosticReport::new(d, result.lines(), end, verbose))
                .collect(),
            diagnostics_count: result.diagnostics_count(),
            has_errors: result.has_errors(),
            basic_metadata: result.basic_metadata().cloned(),
        }
    }
}

/// Renders a parse result as pretty-printed JSON.
pub(super) fn render(result: &ParseResult, options: &RenderOptions) -> String {
    let report = ParseReport::new(result, options.verbose);
    serde_json::to_string_pretty(&report).expect("a parse report should serialize")
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use serde_json::json;
    use wdlparse_grammar::ParseOptions;
    use wdlparse_grammar::parse;

    use super::*;

    /// Renders a parse of the source as a JSON value.
    fn report(source: &str, verbose: bool, extract_metadata: bool) -> Value {
        let result = parse(
            source,
            ParseOptions {
                verbose,
                extract_metadata,
            },
        );
        serde_json::from_str(&render(&result, &RenderOptions {
            verbose,
            ..Default::default()
        }))
        .unwrap()
    }

    #[test]
    fn field_order() {
        let value = report("version 1.0\nworkflow w {}", false, true);
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            [
                "version",
                "document",
                "diagnostics",
                "diagnostics_count",
                "has_errors",
                "basic_metadata"
            ]
        );
        assert_eq!(
            value["basic_metadata"],
            json!({ "version": "1.0", "workflow_name": "w", "task_names": [] })
        );
    }

    #[test]
    fn metadata_only_when_requested() {
        let value = report("version 1.0\nworkflow w {}", false, false);
        assert!(value.get("basic_metadata").is_none());
    }

    #[test]
    fn concise_diagnostics() {
        let value = report("version 1.1\nworkflow w {\n", false, false);
        assert_eq!(value["diagnostics_count"], json!(1));
        assert_eq!(value["has_errors"], json!(true));
        assert_eq!(
            value["diagnostics"],
            json!([{
                "severity": "error",
                "message": "expected `}`, but found end of input",
                "span": {
                    "start": { "offset": 25, "line": 3, "column": 1 },
                    "end": { "offset": 25, "line": 3, "column": 1 },
                },
            }])
        );
    }

    #[test]
    fn verbose_diagnostics() {
        let value = report("version 2.0\nworkflow w {}", true, false);
        let diagnostic = &value["diagnostics"][0];
        assert_eq!(diagnostic["severity"], json!("warning"));
        assert_eq!(
            diagnostic["hint"],
            json!("use a supported WDL version: 1.0, 1.1, 1.2")
        );
        assert_eq!(
            diagnostic["labels"][0]["message"],
            json!("this version of WDL is not supported")
        );
        assert_eq!(diagnostic["labels"][0]["span"]["start"]["column"], json!(9));

        let value = report("version 1.1\nworkflow w {\n", true, false);
        assert_eq!(value["diagnostics"][0]["hint"], Value::Null);
    }

    #[test]
    fn fatal_input() {
        let value = report("", false, true);
        assert_eq!(value["version"], Value::Null);
        assert_eq!(value["document"], Value::Null);
        assert_eq!(value["has_errors"], json!(true));
    }

    #[test]
    fn round_trip() {
        let result = parse(
            "version 1.1\ntask t {\n  input { Int? x = None }\n  command <<< echo ~{x} >>>\n}\n",
            ParseOptions {
                verbose: true,
                extract_metadata: true,
            },
        );
        let report = ParseReport::new(&result, true);
        let json = render(&result, &RenderOptions {
            verbose: true,
            ..Default::default()
        });
        assert_eq!(serde_json::from_str::<ParseReport>(&json).unwrap(), report);
    }
}
