//! Workflow diagrams.
//!
//! A [WorkflowGraph] flattens the nested statements of a workflow into nodes
//! and edges, which are then written as a Mermaid flowchart.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;

use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::Deserialize;
use serde::Serialize;
use wdlparse_grammar::Diagnostic;
use wdlparse_grammar::Document;
use wdlparse_grammar::ParseResult;
use wdlparse_grammar::Span;
use wdlparse_grammar::tree::CallStatement;
use wdlparse_grammar::tree::Expr;
use wdlparse_grammar::tree::Ident;
use wdlparse_grammar::tree::Slot;
use wdlparse_grammar::tree::WorkflowDefinition;
use wdlparse_grammar::tree::WorkflowStatement;

/// The header of every flowchart.
const HEADER: &str = "flowchart TD";

/// The text used for anything missing due to error recovery.
const MISSING: &str = "<missing>";

/// The kind of a node in a workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A task invoked by at least one call.
    Task,
    /// A call.
    Call,
    /// A scatter statement.
    Scatter,
    /// A conditional statement.
    Conditional,
}

impl NodeKind {
    /// Gets every node kind.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::Task, Self::Call, Self::Scatter, Self::Conditional].into_iter()
    }

    /// Gets the style of the node kind's Mermaid class.
    fn style(&self) -> &'static str {
        match self {
            Self::Task => "fill:#e1f5fe,stroke:#01579b,stroke-width:2px",
            Self::Call => "fill:#f3e5f5,stroke:#4a148c,stroke-width:2px",
            Self::Scatter => "fill:#fce4ec,stroke:#c2185b,stroke-width:2px",
            Self::Conditional => "fill:#fff8e1,stroke:#f57f17,stroke-width:2px",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Call => write!(f, "call"),
            Self::Scatter => write!(f, "scatter"),
            Self::Conditional => write!(f, "conditional"),
        }
    }
}

/// The kind of an edge in a workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// The target depends on the output of the source call.
    Data,
    /// The target is nested in the source scatter or conditional.
    Control,
    /// The source call invokes the target task.
    Invocation,
}

impl EdgeKind {
    /// Gets the Mermaid arrow of the edge kind.
    fn arrow(&self) -> &'static str {
        match self {
            Self::Data => "-->",
            Self::Control => "-.->",
            Self::Invocation => "==>",
        }
    }
}

/// A node in a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// The unique Mermaid identifier of the node.
    pub id: String,
    /// The label of the node.
    pub label: String,
    /// The kind of the node.
    pub kind: NodeKind,
}

/// An edge in a workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge<'a> {
    /// The source node.
    pub source: &'a Node,
    /// The target node.
    pub target: &'a Node,
    /// The kind of the edge.
    pub kind: EdgeKind,
}

/// A graph of the calls, scatters, and conditionals of a workflow.
///
/// Nodes and edges are kept in the order they were added; data edges follow
/// every other edge.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    /// The underlying directed graph.
    graph: DiGraph<Node, EdgeKind>,
    /// The node index of each Mermaid identifier.
    ids: HashMap<String, NodeIndex>,
    /// Notes about the parts of the workflow that could not be drawn.
    notes: Vec<Diagnostic>,
}

impl WorkflowGraph {
    /// Builds the graph of the first workflow of a document.
    ///
    /// The source must be the source the document was parsed from.
    pub fn new(document: &Document, source: &str) -> Self {
        match document.workflows().next() {
            Some(workflow) => {
                let mut builder = Builder::new(document, source);
                builder.workflow(workflow);
                builder.finish()
            }
            None => Self {
                notes: vec![Diagnostic::note("the document contains no workflow")],
                ..Default::default()
            },
        }
    }

    /// Gets the underlying directed graph.
    pub fn graph(&self) -> &DiGraph<Node, EdgeKind> {
        &self.graph
    }

    /// Iterates the nodes of the graph in the order they were added.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Iterates the edges of the graph in the order they were added.
    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> {
        self.graph.edge_references().map(|e| Edge {
            source: &self.graph[e.source()],
            target: &self.graph[e.target()],
            kind: *e.weight(),
        })
    }

    /// Gets the notes about parts of the workflow that could not be drawn.
    pub fn notes(&self) -> &[Diagnostic] {
        &self.notes
    }

    /// Gets a node by its identifier.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.ids.get(id).map(|index| &self.graph[*index])
    }

    /// Adds a node, deriving a unique identifier from the given one.
    fn add_node(&mut self, id: String, label: String, kind: NodeKind) -> NodeIndex {
        let mut unique = id.clone();
        let mut n = 1;
        while self.ids.contains_key(&unique) {
            n += 1;
            unique = format!("{id}_{n}");
        }

        let index = self.graph.add_node(Node {
            id: unique.clone(),
            label,
            kind,
        });
        self.ids.insert(unique, index);
        index
    }

    /// Connects two distinct nodes unless they are already connected.
    fn connect(&mut self, source: NodeIndex, target: NodeIndex, kind: EdgeKind) {
        if source != target && !self.graph.contains_edge(source, target) {
            self.graph.add_edge(source, target, kind);
        }
    }

    /// Writes the graph as a Mermaid flowchart.
    pub fn to_mermaid(&self) -> String {
        let mut output = String::new();
        writeln!(output, "{HEADER}").ok();

        for node in self.nodes() {
            let label = escape(&node.label);
            let shape = match node.kind {
                NodeKind::Task | NodeKind::Call => format!("[\"{label}\"]"),
                NodeKind::Scatter => format!("[/\"{label}\"/]"),
                NodeKind::Conditional => format!("{{\"{label}\"}}"),
            };

            writeln!(
                output,
                "    {id}{shape}:::{kind}",
                id = node.id,
                kind = node.kind
            )
            .ok();
        }

        for edge in self.edges() {
            writeln!(
                output,
                "    {source} {arrow} {target}",
                source = edge.source.id,
                arrow = edge.kind.arrow(),
                target = edge.target.id
            )
            .ok();
        }

        write_footer(&mut output, &self.notes);
        output
    }
}

/// Writes the class definitions and notes that end every flowchart.
fn write_footer(output: &mut String, notes: &[Diagnostic]) {
    output.push('\n');
    for kind in NodeKind::all() {
        writeln!(output, "    classDef {kind} {style}", style = kind.style()).ok();
    }

    for note in notes {
        writeln!(output, "%% {message}", message = note.message()).ok();
    }
}

/// Escapes the characters of a label that Mermaid treats specially in a
/// quoted label.
fn escape(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '#' => escaped.push_str("#35;"),
            '"' => escaped.push_str("#quot;"),
            '<' => escaped.push_str("#lt;"),
            '>' => escaped.push_str("#gt;"),
            '\n' | '\r' => escaped.push(' '),
            c => escaped.push(c),
        }
    }

    escaped
}

/// Converts a name into a Mermaid node identifier fragment.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// The names a node references, resolved into data edges once every call is
/// known.
struct References<'a> {
    /// The node doing the referencing.
    target: NodeIndex,
    /// The referenced names.
    names: Vec<&'a str>,
}

/// Builds a workflow graph in a depth-first traversal.
struct Builder<'a> {
    /// The document being drawn.
    document: &'a Document,
    /// The source of the document.
    source: &'a str,
    /// The graph being built.
    graph: WorkflowGraph,
    /// The open scatter and conditional nodes.
    scopes: Vec<NodeIndex>,
    /// The node of each call name; the first call wins.
    calls: HashMap<&'a str, NodeIndex>,
    /// The node of each task invoked so far.
    tasks: HashMap<&'a str, NodeIndex>,
    /// The names referenced by each node.
    references: Vec<References<'a>>,
    /// The number of scatter nodes added so far.
    scatters: usize,
    /// The number of conditional nodes added so far.
    conditionals: usize,
}

impl<'a> Builder<'a> {
    /// Creates a new builder.
    fn new(document: &'a Document, source: &'a str) -> Self {
        Self {
            document,
            source,
            graph: WorkflowGraph::default(),
            scopes: Vec::new(),
            calls: HashMap::new(),
            tasks: HashMap::new(),
            references: Vec::new(),
            scatters: 0,
            conditionals: 0,
        }
    }

    /// Gets the source text of an expression that may be missing.
    fn text(&self, expr: &Slot<Expr>) -> &'a str {
        match expr {
            Slot::Present(expr) => self
                .source
                .get(expr.span.start()..expr.span.end())
                .unwrap_or(MISSING),
            Slot::Missing(_) => MISSING,
        }
    }

    /// Adds a node nested in every open scope.
    fn add_scoped_node(&mut self, id: String, label: String, kind: NodeKind) -> NodeIndex {
        let index = self.graph.add_node(id, label, kind);
        for scope in &self.scopes {
            self.graph.connect(*scope, index, EdgeKind::Control);
        }

        index
    }

    /// Records a note with a label.
    fn note(&mut self, message: String, label: &str, span: Span) {
        self.graph
            .notes
            .push(Diagnostic::note(message).with_label(label, span));
    }

    /// Adds the nodes and edges of a workflow.
    fn workflow(&mut self, workflow: &'a WorkflowDefinition) {
        for statement in workflow.statements() {
            self.statement(statement);
        }
    }

    /// Adds the nodes and edges of a statement and its nested statements.
    fn statement(&mut self, statement: &'a WorkflowStatement) {
        match statement {
            WorkflowStatement::Call(call) => self.call(call),
            WorkflowStatement::Scatter(scatter) => {
                self.scatters += 1;
                let variable = scatter
                    .variable
                    .present()
                    .map(Ident::as_str)
                    .unwrap_or(MISSING);
                let label = format!("scatter {variable} in {}", self.text(&scatter.expr));
                let index = self.add_scoped_node(
                    format!("scatter_{n}", n = self.scatters),
                    label,
                    NodeKind::Scatter,
                );

                self.references(index, scatter.expr.present().map(Expr::names));
                self.scope(index, &scatter.body);
            }
            WorkflowStatement::Conditional(conditional) => {
                self.conditionals += 1;
                let label = format!("if {}", self.text(&conditional.condition));
                let index = self.add_scoped_node(
                    format!("conditional_{n}", n = self.conditionals),
                    label,
                    NodeKind::Conditional,
                );

                self.references(index, conditional.condition.present().map(Expr::names));
                self.scope(index, &conditional.body);
            }
            WorkflowStatement::Declaration(_) => {}
        }
    }

    /// Adds the statements of a scope's body.
    fn scope(&mut self, index: NodeIndex, body: &'a [Slot<WorkflowStatement>]) {
        self.scopes.push(index);
        for statement in body.iter().filter_map(Slot::present) {
            self.statement(statement);
        }

        self.scopes.pop();
    }

    /// Records the names referenced by a node.
    fn references(&mut self, target: NodeIndex, names: Option<Vec<&'a str>>) {
        if let Some(names) = names
            && !names.is_empty()
        {
            self.references.push(References { target, names });
        }
    }

    /// Adds the nodes and edges of a call.
    ///
    /// A call whose name could not be recovered is not drawn.
    fn call(&mut self, call: &'a CallStatement) {
        let (Some(name), Slot::Present(target)) = (call.name(), &call.target) else {
            return;
        };

        let index = self.add_scoped_node(
            format!("call_{name}", name = sanitize(name)),
            format!("call {name}"),
            NodeKind::Call,
        );
        self.calls.entry(name).or_insert(index);

        let mut names = Vec::new();
        for input in call.inputs() {
            match &input.expr {
                Some(Slot::Present(expr)) => names.extend(expr.names()),
                Some(Slot::Missing(_)) => {}
                None => names.push(input.name.as_str()),
            }
        }

        names.extend(call.after.iter().filter_map(Slot::present).map(Ident::as_str));
        self.references(index, Some(names));

        let task = (!target.is_qualified())
            .then(|| self.document.task(target.name()))
            .flatten();
        match task.and_then(|t| t.name.present()) {
            Some(task) => {
                let task_index = match self.tasks.get(task.as_str()) {
                    Some(task_index) => *task_index,
                    None => {
                        let task_index = self.graph.add_node(
                            format!("task_{name}", name = sanitize(task.as_str())),
                            task.to_string(),
                            NodeKind::Task,
                        );
                        self.tasks.insert(task.as_str(), task_index);
                        task_index
                    }
                };

                self.graph.connect(index, task_index, EdgeKind::Invocation);
            }
            None => self.note(
                format!("call target `{target}` is not defined in this document"),
                "this call is not drawn with its task",
                target.span,
            ),
        }
    }

    /// Resolves the recorded references into data edges and finishes the
    /// graph.
    fn finish(mut self) -> WorkflowGraph {
        for references in &self.references {
            for name in &references.names {
                if let Some(source) = self.calls.get(name) {
                    self.graph.connect(*source, references.target, EdgeKind::Data);
                }
            }
        }

        self.graph
    }
}

/// Builds the Mermaid flowchart of a parse result.
///
/// A result without a document or without a workflow produces a flowchart
/// with no nodes and a note saying why.
pub fn build_diagram(result: &ParseResult) -> String {
    let graph = match result.document() {
        Some(document) => WorkflowGraph::new(document, result.source()),
        None => WorkflowGraph {
            notes: vec![Diagnostic::note("no document was produced")],
            ..Default::default()
        },
    };

    tracing::debug!(
        nodes = graph.graph().node_count(),
        edges = graph.graph().edge_count(),
        "built workflow graph"
    );

    graph.to_mermaid()
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use wdlparse_grammar::ParseOptions;
    use wdlparse_grammar::parse;

    use super::*;

    /// Builds the graph of a source.
    fn graph(source: &str) -> WorkflowGraph {
        let result = parse(source, ParseOptions::default());
        WorkflowGraph::new(result.document().unwrap(), result.source())
    }

    /// Formats the edges of a graph for comparison.
    fn edges(graph: &WorkflowGraph) -> Vec<String> {
        graph
            .edges()
            .map(|e| format!("{} {} {}", e.source.id, e.kind.arrow(), e.target.id))
            .collect()
    }

    #[test]
    fn nested_scopes() {
        let graph = graph(
            r#"version 1.1
task align { command <<< >>> }
workflow w {
  scatter (s in [1, 2]) {
    if (s > 1) {
      call align
    }
  }
}
"#,
        );

        assert_eq!(
            graph.to_mermaid(),
            r#"flowchart TD
    scatter_1[/"scatter s in [1, 2]"/]:::scatter
    conditional_1{"if s #gt; 1"}:::conditional
    call_align["call align"]:::call
    task_align["align"]:::task
    scatter_1 -.-> conditional_1
    scatter_1 -.-> call_align
    conditional_1 -.-> call_align
    call_align ==> task_align

    classDef task fill:#e1f5fe,stroke:#01579b,stroke-width:2px
    classDef call fill:#f3e5f5,stroke:#4a148c,stroke-width:2px
    classDef scatter fill:#fce4ec,stroke:#c2185b,stroke-width:2px
    classDef conditional fill:#fff8e1,stroke:#f57f17,stroke-width:2px
"#
        );
    }

    #[test]
    fn data_edges() {
        let graph = graph(
            r#"version 1.1
task t { command <<< >>> }
workflow w {
  call t as first
  call t as second { input: x = first.out }
  call t as third after second { input: first }
  if (defined(third.out)) {
    call t as fourth { input: y = later.out }
  }
  call t as later
}
"#,
        );

        assert_eq!(graph.nodes().filter(|n| n.kind == NodeKind::Task).count(), 1);
        assert_eq!(edges(&graph), [
            "call_first ==> task_t",
            "call_second ==> task_t",
            "call_third ==> task_t",
            "conditional_1 -.-> call_fourth",
            "call_fourth ==> task_t",
            "call_later ==> task_t",
            "call_first --> call_second",
            "call_first --> call_third",
            "call_second --> call_third",
            "call_third --> conditional_1",
            "call_later --> call_fourth",
        ]);
    }

    #[test]
    fn aliased_calls_are_named_by_alias() {
        let graph = graph("version 1.1\ntask t { command <<< >>> }\nworkflow w { call t as u }");
        let node = graph.node("call_u").unwrap();
        assert_eq!(node.label, "call u");
        assert_eq!(edges(&graph), ["call_u ==> task_t"]);
    }

    #[test]
    fn duplicate_names_get_unique_ids() {
        let graph = graph(
            "version 1.1\ntask t { command <<< >>> }\nworkflow w { call t\n call t }",
        );
        let ids: Vec<_> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["call_t", "task_t", "call_t_2"]);
    }

    #[test]
    fn undefined_targets_are_noted() {
        let graph = graph(
            r#"version 1.1
import "lib.wdl" as lib
workflow w {
  call missing
  call lib.other
}
"#,
        );

        assert_eq!(graph.graph().edge_count(), 0);
        assert!(graph.nodes().all(|n| n.kind == NodeKind::Call));
        let notes: Vec<_> = graph.notes().iter().map(|n| n.message()).collect();
        assert_eq!(notes, [
            "call target `missing` is not defined in this document",
            "call target `lib.other` is not defined in this document",
        ]);
        assert!(graph.to_mermaid().ends_with(
            "%% call target `missing` is not defined in this document\n%% call target \
             `lib.other` is not defined in this document\n"
        ));
    }

    #[test]
    fn no_workflow() {
        let result = parse("version 1.1\ntask t { command <<< >>> }", ParseOptions::default());
        let diagram = build_diagram(&result);
        assert!(diagram.starts_with("flowchart TD\n\n    classDef task"));
        assert!(diagram.ends_with("%% the document contains no workflow\n"));
    }

    #[test]
    fn no_document() {
        let result = parse("", ParseOptions::default());
        assert!(build_diagram(&result).ends_with("%% no document was produced\n"));
    }

    #[test]
    fn labels_are_escaped() {
        assert_eq!(escape(r#"if x == "a#b""#), "if x == #quot;a#35;b#quot;");
    }
}
