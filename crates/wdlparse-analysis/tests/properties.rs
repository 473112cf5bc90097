//! Properties that hold for every input, well-formed or not.

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use wdlparse_analysis::DocumentInfo;
use wdlparse_analysis::OutputFormat;
use wdlparse_analysis::WorkflowGraph;
use wdlparse_analysis::build_diagram;
use wdlparse_analysis::render;
use wdlparse_grammar::ParseOptions;
use wdlparse_grammar::extract_basic_metadata;
use wdlparse_grammar::parse;
use wdlparse_grammar::parse_bytes;

/// Inputs ranging from well-formed to garbage.
const INPUTS: &[&str] = &[
    "",
    "   \n\t",
    "# only a comment\n",
    "version 1.1\nworkflow w {}",
    "version 1.1\ntask t { command <<< echo ~{x} >>> }\nworkflow w { call t }",
    "version 1.1\nworkflow w {\n  scatter (i in xs) {\n    if (i > 0) {\n      call a\n    }\n",
    "version 1.0\nworkflow w { call t as u { input: x = v.out } call t as v }",
    "version 1.1\ntask { input { Int = } command { ${ } }",
    "}}}{{{ version version task task workflow ,,, \"unterminated",
    "@#$%^&*()_+|~`",
    "version 1.1\nstruct S { Int x\ntask t { command <<<\nworkflow w { if ( { call } }",
    "version 1.2\nworkflow a {}\nworkflow b {}\ntask t { command <<< >>> }",
    "version 1.1\ntask t {\n  meta { description: \"task t\" }\n  command <<< >>>\n}\ntask t { command <<< >>> }",
];

/// The parse options to check every property with.
fn options() -> impl Iterator<Item = ParseOptions> {
    [false, true].into_iter().flat_map(|verbose| {
        [false, true].into_iter().map(move |extract_metadata| ParseOptions {
            verbose,
            extract_metadata,
        })
    })
}

#[test]
fn parsing_is_deterministic() {
    for input in INPUTS {
        for options in options() {
            let first = parse(input, options);
            let second = parse(input, options);
            assert_eq!(first.diagnostics(), second.diagnostics(), "input: {input:?}");
            assert_eq!(first.document(), second.document(), "input: {input:?}");

            for format in OutputFormat::all() {
                assert_eq!(render(&first, format), render(&second, format));
            }

            assert_eq!(build_diagram(&first), build_diagram(&second));
        }
    }
}

#[test]
fn parsing_is_never_fatal_to_the_caller() {
    for input in INPUTS {
        for options in options() {
            let result = parse(input, options);
            assert_eq!(result.diagnostics_count(), result.diagnostics().len());
            assert_eq!(
                result.has_errors(),
                result.diagnostics().iter().any(|d| d.severity().is_error())
            );

            if result.document().is_none() {
                assert!(result.has_errors(), "input: {input:?}");
            }

            assert_eq!(result.basic_metadata().is_some(), options.extract_metadata);
        }
    }

    let result = parse_bytes(b"\xff\xfe\x00garbage", ParseOptions::default());
    assert!(result.document().is_none());
    assert!(result.has_errors());
}

#[test]
fn metadata_survives_errors() {
    let source = "version 1.1\ntask t {\n  input {\n    Int x =\n  }\n}\nworkflow w {\n  t { }\n";
    let result = parse(source, ParseOptions::default());
    assert!(result.has_errors());

    let metadata = extract_basic_metadata(source);
    assert_eq!(metadata.version.as_deref(), Some("1.1"));
    assert_eq!(metadata.workflow_name.as_deref(), Some("w"));
}

#[test]
fn task_names_are_stable() {
    for input in INPUTS {
        let first: Vec<_> = extract_basic_metadata(input).task_names.into_iter().collect();
        let second: Vec<_> = extract_basic_metadata(input).task_names.into_iter().collect();
        assert_eq!(first, second);

        let unique: HashSet<_> = first.iter().collect();
        assert_eq!(unique.len(), first.len(), "input: {input:?}");
    }
}

#[test]
fn graph_edges_connect_nodes() {
    for input in INPUTS {
        let result = parse(input, ParseOptions::default());
        let Some(document) = result.document() else {
            continue;
        };

        let graph = WorkflowGraph::new(document, result.source());
        let ids: HashSet<_> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), graph.graph().node_count(), "input: {input:?}");

        for edge in graph.edges() {
            assert!(ids.contains(edge.source.id.as_str()), "input: {input:?}");
            assert!(ids.contains(edge.target.id.as_str()), "input: {input:?}");
            assert_eq!(graph.node(&edge.source.id), Some(edge.source));
        }
    }
}

#[test]
fn deep_nesting_is_bounded() {
    let parens = format!(
        "version 1.1\nworkflow w {{ Int x = {open} }}",
        open = "(".repeat(100_000)
    );
    let conditionals = format!(
        "version 1.1\ntask t {{ command <<< >>> }}\nworkflow w {{\n{open}call t\n{close}}}\n",
        open = "if (true) {\n".repeat(20_000),
        close = "}\n".repeat(20_000)
    );
    let mixed = format!(
        "version 1.1\nworkflow w {{\n{open}Int x = {exprs}1{closes}\n}}",
        open = "scatter (i in [1]) {\n".repeat(60),
        exprs = "-[\"~{".repeat(1_000),
        closes = "}\"]".repeat(1_000)
    );

    for input in [&parens, &conditionals, &mixed] {
        for options in options() {
            let result = parse(input, options);
            assert!(
                result
                    .diagnostics()
                    .iter()
                    .any(|d| d.message() == "maximum nesting depth exceeded")
            );

            for format in OutputFormat::all() {
                assert!(!render(&result, format).is_empty());
            }

            assert!(build_diagram(&result).starts_with("flowchart TD\n"));
            let document = result.document().unwrap();
            assert!(
                DocumentInfo::new(document, result.source())
                    .to_human()
                    .starts_with("WDL File Info")
            );
        }
    }
}
