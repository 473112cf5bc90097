//! End-to-end scenarios over the parsing fixtures.

use pretty_assertions::assert_eq;
use wdlparse_analysis::EdgeKind;
use wdlparse_analysis::NodeKind;
use wdlparse_analysis::OutputFormat;
use wdlparse_analysis::WorkflowGraph;
use wdlparse_analysis::render;
use wdlparse_grammar::BasicMetadata;
use wdlparse_grammar::ParseOptions;
use wdlparse_grammar::ParseResult;
use wdlparse_grammar::parse;

/// A document with a single task and workflow.
const HELLO: &str = include_str!("../../wdlparse-grammar/tests/parsing/hello/source.wdl");

/// A document with an unclosed input section, a missing `call` keyword, and
/// an unclosed workflow.
const MALFORMED: &str = include_str!("../../wdlparse-grammar/tests/parsing/malformed/source.wdl");

/// A document with two tasks and no workflow.
const NO_WORKFLOW: &str =
    include_str!("../../wdlparse-grammar/tests/parsing/no_workflow/source.wdl");

/// A document without a version statement.
const NO_VERSION: &str = include_str!("../../wdlparse-grammar/tests/parsing/no_version/source.wdl");

/// A document with a call nested in a conditional nested in a scatter.
const SCATTER_CONDITIONAL: &str =
    include_str!("../../wdlparse-grammar/tests/parsing/scatter_conditional/source.wdl");

/// Parses a source with metadata extraction.
fn parse_with_metadata(source: &str) -> ParseResult {
    parse(source, ParseOptions {
        verbose: false,
        extract_metadata: true,
    })
}

/// Creates the expected basic metadata.
fn metadata(version: Option<&str>, workflow: Option<&str>, tasks: &[&str]) -> BasicMetadata {
    BasicMetadata {
        version: version.map(str::to_string),
        workflow_name: workflow.map(str::to_string),
        task_names: tasks.iter().map(|t| t.to_string()).collect(),
    }
}

#[test]
fn well_formed_document() {
    let result = parse_with_metadata(HELLO);
    assert!(!result.has_errors());
    assert_eq!(
        result.basic_metadata(),
        Some(&metadata(Some("1.0"), Some("hello_workflow"), &["hello"]))
    );
}

#[test]
fn malformed_document() {
    let result = parse_with_metadata(MALFORMED);
    assert!(result.has_errors());
    assert!(result.diagnostics_count() > 0);
    assert!(result.document().is_some());
    assert_eq!(
        result.basic_metadata(),
        Some(&metadata(
            Some("1.1"),
            Some("broken_workflow"),
            &["broken_task"]
        ))
    );
}

#[test]
fn tasks_without_a_workflow() {
    let result = parse_with_metadata(NO_WORKFLOW);
    assert!(!result.has_errors());

    let metadata = result.basic_metadata().unwrap();
    assert_eq!(metadata.workflow_name, None);
    assert_eq!(metadata.task_names.len(), 2);
    assert!(metadata.task_names.contains("first"));
    assert!(metadata.task_names.contains("second"));
}

#[test]
fn missing_version() {
    let result = parse_with_metadata(NO_VERSION);
    assert_eq!(
        result.basic_metadata(),
        Some(&metadata(None, Some("greeting"), &["greet"]))
    );
}

/// Counts the nodes of a kind in a graph.
fn count(graph: &WorkflowGraph, kind: NodeKind) -> usize {
    graph.nodes().filter(|n| n.kind == kind).count()
}

/// Determines if a graph has an edge between the nodes with the given
/// identifiers.
fn has_edge(graph: &WorkflowGraph, source: &str, target: &str, kind: EdgeKind) -> bool {
    graph
        .edges()
        .any(|e| e.source.id == source && e.target.id == target && e.kind == kind)
}

#[test]
fn call_in_conditional_in_scatter() {
    let result = parse(
        r#"version 1.1

task align {
  command <<< >>>
}

workflow w {
  scatter (sample in ["a", "b"]) {
    if (sample != "b") {
      call align
    }
  }
}
"#,
        ParseOptions::default(),
    );
    assert!(!result.has_errors());

    let graph = WorkflowGraph::new(result.document().unwrap(), result.source());
    assert_eq!(count(&graph, NodeKind::Scatter), 1);
    assert_eq!(count(&graph, NodeKind::Conditional), 1);
    assert_eq!(count(&graph, NodeKind::Call), 1);
    assert_eq!(count(&graph, NodeKind::Task), 1);
    assert_eq!(graph.graph().node_count(), 4);

    let edges: Vec<_> = graph
        .edges()
        .map(|e| (e.source.id.as_str(), e.target.id.as_str(), e.kind))
        .collect();
    assert_eq!(edges, [
        ("scatter_1", "conditional_1", EdgeKind::Control),
        ("scatter_1", "call_align", EdgeKind::Control),
        ("conditional_1", "call_align", EdgeKind::Control),
        ("call_align", "task_align", EdgeKind::Invocation),
    ]);
    assert!(graph.notes().is_empty());
}

#[test]
fn nested_scopes_diagram() {
    let result = parse(SCATTER_CONDITIONAL, ParseOptions::default());
    let graph = WorkflowGraph::new(result.document().unwrap(), result.source());

    assert_eq!(count(&graph, NodeKind::Scatter), 1);
    assert_eq!(count(&graph, NodeKind::Conditional), 1);
    assert_eq!(count(&graph, NodeKind::Call), 2);
    assert_eq!(count(&graph, NodeKind::Task), 2);

    assert!(has_edge(&graph, "scatter_1", "conditional_1", EdgeKind::Control));
    assert!(has_edge(&graph, "conditional_1", "call_align", EdgeKind::Control));
    assert!(has_edge(&graph, "scatter_1", "call_align", EdgeKind::Control));
    assert!(has_edge(&graph, "call_align", "task_align", EdgeKind::Invocation));
    assert!(has_edge(&graph, "call_final_merge", "task_merge", EdgeKind::Invocation));
    assert!(has_edge(&graph, "call_align", "call_final_merge", EdgeKind::Data));
    assert_eq!(graph.node("call_final_merge").unwrap().label, "call final_merge");
    assert!(graph.notes().is_empty());
}

#[test]
fn malformed_renders_in_every_format() {
    let result = parse_with_metadata(MALFORMED);
    for format in OutputFormat::all() {
        assert!(!render(&result, format).is_empty());
    }

    let json: serde_json::Value =
        serde_json::from_str(&render(&result, OutputFormat::Json)).unwrap();
    assert_eq!(json["has_errors"], true);
    assert_eq!(json["basic_metadata"]["workflow_name"], "broken_workflow");
}
