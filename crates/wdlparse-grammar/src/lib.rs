//! Tolerant lexing and parsing of Workflow Description Language (WDL)
//! documents.
//!
//! Parsing never fails: malformed input produces a partial syntax tree and a
//! list of diagnostics describing what went wrong.
//!
//! # Examples
//!
//! ```rust
//! use wdlparse_grammar::ParseOptions;
//! use wdlparse_grammar::parse;
//!
//! let result = parse(
//!     "version 1.1\nworkflow hello {}",
//!     ParseOptions::default(),
//! );
//! assert!(!result.has_errors());
//! assert_eq!(result.version(), Some("1.1"));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

mod diagnostic;
pub mod grammar;
pub mod lexer;
pub mod metadata;
pub mod parser;
pub mod tree;
pub mod validation;
pub mod version;

pub use diagnostic::*;
pub use metadata::BasicMetadata;
pub use metadata::extract_basic_metadata;
pub use metadata::extract_basic_metadata_bytes;
pub use tree::Document;
pub use version::SupportedVersion;

use lexer::Lexer;
use parser::Parser;
use serde::Deserialize;
use serde::Serialize;

/// Options for a parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Whether renderers include full diagnostic detail.
    pub verbose: bool,
    /// Whether basic metadata is extracted alongside the parse.
    pub extract_metadata: bool,
}

/// The result of parsing a document.
///
/// A result is immutable once constructed.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The source that was parsed.
    source: String,
    /// The line map of the source.
    lines: Lines,
    /// The options used for the parse.
    options: ParseOptions,
    /// The parsed document.
    ///
    /// This is `None` only for input that could not be parsed at all.
    document: Option<Document>,
    /// The diagnostics, in the order they were emitted.
    diagnostics: Vec<Diagnostic>,
    /// The basic metadata, if extraction was requested.
    basic_metadata: Option<BasicMetadata>,
}

impl ParseResult {
    /// Creates a result for input that could not be parsed at all.
    fn fatal(source: String, options: ParseOptions, diagnostic: Diagnostic) -> Self {
        tracing::debug!(message = diagnostic.message(), "parse failed");
        Self {
            lines: Lines::new(&source),
            source,
            options,
            document: None,
            diagnostics: vec![diagnostic],
            basic_metadata: None,
        }
    }

    /// Gets the source that was parsed.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Gets the line map of the source.
    pub fn lines(&self) -> &Lines {
        &self.lines
    }

    /// Gets the options used for the parse.
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Gets the parsed document.
    ///
    /// Returns `None` if the input could not be parsed at all.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Gets the version of the parsed document.
    pub fn version(&self) -> Option<&str> {
        self.document.as_ref().and_then(Document::version)
    }

    /// Gets the diagnostics of the parse, in the order they were emitted.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Gets the count of diagnostics.
    pub fn diagnostics_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Determines if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity().is_error())
    }

    /// Gets the basic metadata, if extraction was requested.
    pub fn basic_metadata(&self) -> Option<&BasicMetadata> {
        self.basic_metadata.as_ref()
    }
}

/// Parses the given source.
///
/// This never fails; problems with the source are reported as diagnostics of
/// the result.
pub fn parse(source: &str, options: ParseOptions) -> ParseResult {
    let basic_metadata = options
        .extract_metadata
        .then(|| extract_basic_metadata(source));

    if Lexer::new(source).all(|t| t.kind.is_trivia()) {
        let mut result = ParseResult::fatal(
            source.to_string(),
            options,
            Diagnostic::error("the document contains no WDL source"),
        );
        result.basic_metadata = basic_metadata;
        return result;
    }

    let mut parser = Parser::new(source);
    let document = grammar::document(&mut parser);
    let mut diagnostics = parser.finish();
    diagnostics.extend(validation::validate(&document));

    tracing::debug!(
        items = document.items.len(),
        diagnostics = diagnostics.len(),
        "parsed document"
    );

    ParseResult {
        source: source.to_string(),
        lines: Lines::new(source),
        options,
        document: Some(document),
        diagnostics,
        basic_metadata,
    }
}

/// Parses the given bytes.
///
/// Bytes that are not valid UTF-8 cannot be parsed; the result has no
/// document and a single error diagnostic.
pub fn parse_bytes(bytes: &[u8], options: ParseOptions) -> ParseResult {
    match std::str::from_utf8(bytes) {
        Ok(source) => parse(source, options),
        Err(e) => {
            let source = String::from_utf8_lossy(bytes).into_owned();
            let len = e.error_len().unwrap_or(1);
            let mut result = ParseResult::fatal(
                source,
                options,
                Diagnostic::error("the document is not valid UTF-8")
                    .with_label("this is not valid UTF-8", Span::new(e.valid_up_to(), len)),
            );
            result.basic_metadata = options
                .extract_metadata
                .then(|| extract_basic_metadata_bytes(bytes));
            result
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tree::DocumentItem;
    use crate::tree::ExprKind;
    use crate::tree::Slot;
    use crate::tree::StringPart;
    use crate::tree::TaskItem;
    use crate::tree::WorkflowItem;
    use crate::tree::WorkflowStatement;

    /// The messages of the diagnostics of a result.
    fn messages(result: &ParseResult) -> Vec<&str> {
        result.diagnostics().iter().map(|d| d.message()).collect()
    }

    #[test]
    fn empty_input_is_fatal() {
        for source in ["", "   \n", "# just a comment\n"] {
            let result = parse(source, ParseOptions::default());
            assert!(result.document().is_none());
            assert!(result.has_errors());
            assert_eq!(messages(&result), ["the document contains no WDL source"]);
        }
    }

    #[test]
    fn invalid_utf8_is_fatal() {
        let result = parse_bytes(
            b"version 1.0\n\xff\xfe",
            ParseOptions {
                verbose: false,
                extract_metadata: true,
            },
        );
        assert!(result.document().is_none());
        assert_eq!(result.diagnostics_count(), 1);
        assert_eq!(
            result.diagnostics()[0].primary_span(0),
            Span::new(12, 1)
        );
        assert_eq!(
            result.basic_metadata().and_then(|m| m.version.as_deref()),
            Some("1.0")
        );
    }

    #[test]
    fn metadata_only_when_requested() {
        let source = "version 1.0\ntask t { command <<< >>> }";
        assert!(parse(source, ParseOptions::default()).basic_metadata().is_none());
        let result = parse(
            source,
            ParseOptions {
                verbose: false,
                extract_metadata: true,
            },
        );
        assert_eq!(
            result.basic_metadata().map(|m| m.task_names.len()),
            Some(1)
        );
    }

    #[test]
    fn well_formed_document() {
        let result = parse(
            r#"version 1.0

task hello {
    input {
        String name
    }

    command {
        echo "Hello ${name}!" > output.txt
    }

    output {
        File greeting = "output.txt"
    }

    runtime {
        docker: "ubuntu:latest"
    }
}

workflow hello_workflow {
    input {
        String person
    }

    call hello { input: name = person }

    output {
        File result = hello.greeting
    }
}
"#,
            ParseOptions::default(),
        );

        assert_eq!(messages(&result), Vec::<&str>::new());
        let document = result.document().unwrap();
        assert_eq!(document.version(), Some("1.0"));

        let task = document.task("hello").unwrap();
        assert_eq!(task.inputs().count(), 1);
        assert_eq!(task.outputs().count(), 1);
        let command = task.command().unwrap();
        let placeholders: Vec<_> = command
            .parts
            .iter()
            .filter(|p| matches!(p, StringPart::Placeholder(_)))
            .collect();
        assert_eq!(placeholders.len(), 1);
        assert_eq!(task.runtime().unwrap().items().count(), 1);

        let workflow = document.workflows().next().unwrap();
        assert_eq!(workflow.name(), Some("hello_workflow"));
        let WorkflowStatement::Call(call) = workflow.statements().next().unwrap() else {
            panic!("expected a call statement");
        };
        assert_eq!(call.name(), Some("hello"));
        assert_eq!(call.inputs().count(), 1);
    }

    #[test]
    fn missing_version_continues_parsing() {
        let result = parse(
            "task t { command <<< >>> }\nworkflow w { call t }",
            ParseOptions::default(),
        );

        assert_eq!(
            messages(&result),
            ["a WDL document must start with a version statement"]
        );
        let document = result.document().unwrap();
        assert!(document.version.is_missing());
        assert_eq!(document.tasks().count(), 1);
        assert_eq!(document.workflows().count(), 1);
    }

    #[test]
    fn unsupported_version_is_a_warning() {
        let result = parse("version draft-2\nworkflow w {}", ParseOptions::default());
        assert!(!result.has_errors());
        assert_eq!(messages(&result), ["unsupported WDL version `draft-2`"]);
        assert_eq!(result.version(), Some("draft-2"));
    }

    #[test]
    fn missing_call_keyword() {
        let result = parse(
            "version 1.1\ntask t { command <<< >>> }\nworkflow w {\n  t { input: x = 1 }\n}",
            ParseOptions::default(),
        );

        assert_eq!(messages(&result), ["missing `call` keyword before `t`"]);
        let workflow = result.document().unwrap().workflows().next().unwrap();
        let WorkflowStatement::Call(call) = workflow.statements().next().unwrap() else {
            panic!("expected a call statement");
        };
        assert_eq!(call.name(), Some("t"));
        assert_eq!(call.inputs().count(), 1);
    }

    #[test]
    fn unclosed_workflow() {
        let result = parse(
            "version 1.1\nworkflow w {\n  output { Int x = 1 }\n",
            ParseOptions::default(),
        );

        assert_eq!(messages(&result), ["expected `}`, but found end of input"]);
        let workflow = result.document().unwrap().workflows().next().unwrap();
        assert_eq!(workflow.outputs().count(), 1);
    }

    #[test]
    fn unclosed_scopes_are_each_reported() {
        let result = parse(
            "version 1.1\ntask t { command <<< >>> }\nworkflow w {\n  scatter (x in xs) {\n    if \
             (x) {\n      call t\n",
            ParseOptions::default(),
        );

        let errors: Vec<_> = result
            .diagnostics()
            .iter()
            .filter(|d| d.severity().is_error())
            .map(|d| d.message())
            .collect();
        assert_eq!(errors, ["expected `}`, but found end of input"; 3]);

        let workflow = result.document().unwrap().workflows().next().unwrap();
        let WorkflowStatement::Scatter(scatter) = workflow.statements().next().unwrap() else {
            panic!("expected a scatter statement");
        };
        let Slot::Present(WorkflowStatement::Conditional(conditional)) = &scatter.body[0] else {
            panic!("expected a conditional statement");
        };
        assert!(matches!(
            conditional.body[0],
            Slot::Present(WorkflowStatement::Call(_))
        ));
    }

    #[test]
    fn deeply_nested_parentheses() {
        let source = format!(
            "version 1.1\nworkflow w {{ Int x = {parens} }}",
            parens = "(".repeat(100_000)
        );
        let result = parse(&source, ParseOptions::default());

        assert_eq!(messages(&result), ["maximum nesting depth exceeded"]);
        let workflow = result.document().unwrap().workflows().next().unwrap();
        let Some(Slot::Present(WorkflowItem::Statement(WorkflowStatement::Declaration(d)))) =
            workflow.items.first()
        else {
            panic!("expected a declaration");
        };
        assert!(matches!(d.expr, Some(Slot::Missing(_))));
    }

    #[test]
    fn deeply_nested_conditionals() {
        let depth = 20_000;
        let source = format!(
            "version 1.1\ntask t {{ command <<< >>> }}\nworkflow w {{\n{open}call t\n{close}}}\n",
            open = "if (true) {\n".repeat(depth),
            close = "}\n".repeat(depth)
        );
        let result = parse(&source, ParseOptions::default());

        assert_eq!(messages(&result), ["maximum nesting depth exceeded"]);
        let workflow = result.document().unwrap().workflows().next().unwrap();
        let mut statement = workflow.statements().next();
        let mut levels = 0;
        while let Some(WorkflowStatement::Conditional(conditional)) = statement {
            levels += 1;
            statement = conditional.body.first().and_then(Slot::present);
        }

        assert!(levels > 100 && levels <= parser::MAX_NESTING_DEPTH);
    }

    #[test]
    fn deeply_nested_types_and_metadata() {
        let source = format!(
            "version 1.1\nstruct S {{ {types}Int{closes} x }}\ntask t {{\n  meta {{ a:              {arrays}1{brackets} }}\n  command <<< >>>\n}}",
            types = "Array[".repeat(1_000),
            closes = "]".repeat(1_000),
            arrays = "[".repeat(1_000),
            brackets = "]".repeat(1_000),
        );
        let result = parse(&source, ParseOptions::default());

        assert_eq!(
            messages(&result),
            ["maximum nesting depth exceeded"; 2]
        );
        let document = result.document().unwrap();
        assert!(document.task("t").unwrap().command().is_some());
    }

    #[test]
    fn missing_runtime_value_is_a_missing_slot() {
        let result = parse(
            "version 1.1\ntask t {\n  command <<< >>>\n  runtime {\n    cpu:\n  }\n}",
            ParseOptions::default(),
        );

        assert_eq!(messages(&result), ["expected expression, but found `}`"]);
        let task = result.document().unwrap().task("t").unwrap();
        let item = task.runtime().unwrap().items().next().unwrap();
        assert_eq!(item.name.as_str(), "cpu");
        assert!(item.value.is_missing());
    }

    #[test]
    fn recovery_records_missing_items() {
        let result = parse(
            "version 1.1\ntask t {\n  + + +\n  command <<< >>>\n}",
            ParseOptions::default(),
        );

        assert_eq!(result.diagnostics_count(), 1);
        let DocumentItem::Task(task) = result.document().unwrap().items[0].present().unwrap()
        else {
            panic!("expected a task");
        };
        assert!(task.items[0].is_missing());
        assert!(matches!(task.items[1], Slot::Present(TaskItem::Command(_))));
    }

    #[test]
    fn multiple_workflows_are_an_error() {
        let result = parse(
            "version 1.1\nworkflow a {}\nworkflow b {}",
            ParseOptions::default(),
        );
        assert_eq!(
            messages(&result),
            ["a WDL document may only contain a single workflow"]
        );
        assert_eq!(result.document().unwrap().workflows().count(), 2);
    }

    #[test]
    fn semantic_warnings() {
        let result = parse(
            r#"version 1.1
task t {
  input {
    Int count = "not a number"
    Int maybe = None
    Float f = 1
    missing_type value
  }
  command <<< >>>
}
task t { command <<< >>> }
workflow w {
  call t
  call t
  call undefined
}
"#,
            ParseOptions::default(),
        );

        assert!(!result.has_errors());
        assert_eq!(
            messages(&result),
            [
                "duplicate task name `t`",
                "type mismatch: expected type `Int`, but found type `String`",
                "cannot assign `None` to non-optional type `Int`",
                "unknown type `missing_type`",
                "duplicate call name `t`",
                "call to undefined task `undefined`",
            ]
        );
    }

    #[test]
    fn expressions() {
        let result = parse(
            "version 1.1\nworkflow w {\n  Int x = -9223372036854775808\n  Int y = 1 + 2 * \
             3\n  Boolean z = !a || b && c\n  Int i = xs[0].y\n}",
            ParseOptions::default(),
        );

        assert_eq!(messages(&result), Vec::<&str>::new());
        let workflow = result.document().unwrap().workflows().next().unwrap();
        let exprs: Vec<_> = workflow
            .items
            .iter()
            .filter_map(|i| match i {
                Slot::Present(WorkflowItem::Statement(WorkflowStatement::Declaration(d))) => {
                    d.expr()
                }
                _ => None,
            })
            .collect();

        assert_eq!(exprs[0].kind, ExprKind::Integer(i64::MIN));
        let ExprKind::Binary { op, rhs, .. } = &exprs[1].kind else {
            panic!("expected a binary expression");
        };
        assert_eq!(*op, tree::BinaryOp::Add);
        assert!(matches!(
            rhs.kind,
            ExprKind::Binary {
                op: tree::BinaryOp::Multiply,
                ..
            }
        ));
        assert!(matches!(
            exprs[2].kind,
            ExprKind::Binary {
                op: tree::BinaryOp::Or,
                ..
            }
        ));
        assert_eq!(exprs[3].names(), ["xs"]);
    }

    #[test]
    fn integer_overflow_is_an_error() {
        let result = parse(
            "version 1.1\nworkflow w {\n  Int x = 9223372036854775808\n}",
            ParseOptions::default(),
        );

        assert_eq!(
            messages(&result),
            ["literal integer exceeds the range for a 64-bit signed integer"]
        );
    }

    #[test]
    fn placeholder_options() {
        let result = parse(
            r#"version 1.1
task t {
  command <<<
    echo ~{sep=", " xs} ~{true="yes" false="no" flag} ~{default="x" y}
  >>>
}
"#,
            ParseOptions::default(),
        );

        assert_eq!(messages(&result), Vec::<&str>::new());
        let command = result.document().unwrap().task("t").unwrap().command().unwrap();
        let options: Vec<_> = command
            .parts
            .iter()
            .filter_map(|p| match p {
                StringPart::Placeholder(p) => Some(p.options.len()),
                _ => None,
            })
            .collect();
        assert_eq!(options, [1, 1, 1]);
    }

    #[test]
    fn imports_and_structs() {
        let result = parse(
            r#"version 1.1
import "lib.wdl" as lib alias Sample as LibSample
struct Sample {
  String name
  Array[File]+ reads
  meta { description: "a sample" }
}
workflow w {
  Sample s = Sample { name: "a", reads: ["r1"] }
  call lib.align as first
}
"#,
            ParseOptions::default(),
        );

        assert_eq!(messages(&result), Vec::<&str>::new());
        let document = result.document().unwrap();
        let import = document.imports().next().unwrap();
        assert_eq!(import.aliases.len(), 1);
        let s = document.structs().next().unwrap();
        assert_eq!(s.name(), Some("Sample"));
        assert_eq!(s.members().count(), 2);
    }
}
