//! Structured summaries of parsed documents.
//!
//! Expressions and metadata values are summarized by their source text.

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use wdlparse_grammar::BasicMetadata;
use wdlparse_grammar::Document;
use wdlparse_grammar::Span;
use wdlparse_grammar::tree::CallStatement;
use wdlparse_grammar::tree::CommandSection;
use wdlparse_grammar::tree::Declaration;
use wdlparse_grammar::tree::ImportStatement;
use wdlparse_grammar::tree::MetadataSection;
use wdlparse_grammar::tree::RuntimeSection;
use wdlparse_grammar::tree::Slot;
use wdlparse_grammar::tree::StringPart;
use wdlparse_grammar::tree::StructDefinition;
use wdlparse_grammar::tree::TaskDefinition;
use wdlparse_grammar::tree::TaskItem;
use wdlparse_grammar::tree::WorkflowDefinition;
use wdlparse_grammar::tree::WorkflowItem;
use wdlparse_grammar::tree::WorkflowStatement;

/// The name used for anything missing due to error recovery.
const MISSING: &str = "<missing>";

/// A summary of an input declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputInfo {
    /// The name of the input.
    pub name: String,
    /// The type of the input.
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether the type of the input is optional.
    pub optional: bool,
    /// The source text of the default value.
    pub default: Option<String>,
}

/// A summary of an output declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputInfo {
    /// The name of the output.
    pub name: String,
    /// The type of the output.
    #[serde(rename = "type")]
    pub ty: String,
    /// The source text of the output expression.
    pub expression: Option<String>,
}

/// A summary of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    /// The name of the task.
    pub name: String,
    /// The inputs of the task.
    pub inputs: Vec<InputInfo>,
    /// The outputs of the task.
    pub outputs: Vec<OutputInfo>,
    /// The command text, with placeholders written as `~{expr}`.
    pub command: Option<String>,
    /// The runtime items, as source text.
    pub runtime: IndexMap<String, String>,
    /// The `meta` items, as source text.
    pub meta: IndexMap<String, String>,
    /// The `parameter_meta` items, as source text.
    pub parameter_meta: IndexMap<String, String>,
}

/// A summary of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    /// The (possibly qualified) target of the call.
    pub target: String,
    /// The alias of the call.
    pub alias: Option<String>,
    /// The inputs of the call, as source text.
    ///
    /// The shorthand `name` input is summarized as `name`.
    pub inputs: IndexMap<String, String>,
}

/// A summary of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInfo {
    /// The name of the workflow.
    pub name: String,
    /// The inputs of the workflow.
    pub inputs: Vec<InputInfo>,
    /// The outputs of the workflow.
    pub outputs: Vec<OutputInfo>,
    /// Every call of the workflow, including nested calls, in source order.
    pub calls: Vec<CallInfo>,
    /// The `meta` items, as source text.
    pub meta: IndexMap<String, String>,
    /// The `parameter_meta` items, as source text.
    pub parameter_meta: IndexMap<String, String>,
}

/// A summary of a struct member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// The name of the member.
    pub name: String,
    /// The type of the member.
    #[serde(rename = "type")]
    pub ty: String,
}

/// A summary of a struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructInfo {
    /// The name of the struct.
    pub name: String,
    /// The members of the struct.
    pub members: Vec<MemberInfo>,
}

/// A summary of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    /// The imported URI.
    pub uri: String,
    /// The namespace the import is known by.
    pub alias: Option<String>,
}

/// A structured summary of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// The version of the document.
    pub version: Option<String>,
    /// The tasks of the document.
    pub tasks: Vec<TaskInfo>,
    /// The workflows of the document.
    pub workflows: Vec<WorkflowInfo>,
    /// The structs of the document.
    pub structs: Vec<StructInfo>,
    /// The imports of the document.
    pub imports: Vec<ImportInfo>,
    /// The basic metadata of the document, if it was extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_metadata: Option<BasicMetadata>,
}

impl DocumentInfo {
    /// Summarizes the given document.
    ///
    /// The source must be the source the document was parsed from.
    pub fn new(document: &Document, source: &str) -> Self {
        let summarizer = Summarizer { source };
        Self {
            version: document.version().map(str::to_string),
            tasks: document.tasks().map(|t| summarizer.task(t)).collect(),
            workflows: document
                .workflows()
                .map(|w| summarizer.workflow(w))
                .collect(),
            structs: document.structs().map(|s| summarizer.structure(s)).collect(),
            imports: document.imports().map(|i| summarizer.import(i)).collect(),
            basic_metadata: None,
        }
    }

    /// Attaches basic metadata to the summary.
    pub fn with_basic_metadata(mut self, metadata: BasicMetadata) -> Self {
        self.basic_metadata = Some(metadata);
        self
    }

    /// Formats the summary for humans.
    pub fn to_human(&self) -> String {
        /// Formats a list of inputs.
        fn inputs(output: &mut String, inputs: &[InputInfo]) {
            for input in inputs {
                output.push_str(&format!("      - {ty} {name}", ty = input.ty, name = input.name));
                if let Some(default) = &input.default {
                    output.push_str(&format!(" = {default}"));
                }

                output.push('\n');
            }
        }

        /// Formats a list of outputs.
        fn outputs(output: &mut String, outputs: &[OutputInfo]) {
            for o in outputs {
                output.push_str(&format!(
                    "      - {ty} {name} = {expr}\n",
                    ty = o.ty,
                    name = o.name,
                    expr = o.expression.as_deref().unwrap_or(MISSING)
                ));
            }
        }

        /// Formats a list of key-value items.
        fn items(output: &mut String, label: &str, items: &IndexMap<String, String>) {
            if items.is_empty() {
                return;
            }

            output.push_str(&format!("    {label}:\n"));
            for (key, value) in items {
                output.push_str(&format!("      - {key}: {value}\n"));
            }
        }

        let mut output = String::from("WDL File Info\n=============\n");
        output.push_str(&format!(
            "Version: {version}\n",
            version = self.version.as_deref().unwrap_or(MISSING)
        ));

        output.push_str(&format!("\nTasks ({count}):\n", count = self.tasks.len()));
        for task in &self.tasks {
            output.push_str(&format!("  - {name}\n", name = task.name));
            if !task.inputs.is_empty() {
                output.push_str("    inputs:\n");
                inputs(&mut output, &task.inputs);
            }

            if !task.outputs.is_empty() {
                output.push_str("    outputs:\n");
                outputs(&mut output, &task.outputs);
            }

            if let Some(command) = &task.command {
                output.push_str("    command:\n");
                for line in command.lines() {
                    output.push_str(&format!("      {line}\n"));
                }
            }

            items(&mut output, "runtime", &task.runtime);
            items(&mut output, "meta", &task.meta);
            items(&mut output, "parameter_meta", &task.parameter_meta);
        }

        output.push_str(&format!(
            "\nWorkflows ({count}):\n",
            count = self.workflows.len()
        ));
        for workflow in &self.workflows {
            output.push_str(&format!("  - {name}\n", name = workflow.name));
            if !workflow.inputs.is_empty() {
                output.push_str("    inputs:\n");
                inputs(&mut output, &workflow.inputs);
            }

            if !workflow.outputs.is_empty() {
                output.push_str("    outputs:\n");
                outputs(&mut output, &workflow.outputs);
            }

            if !workflow.calls.is_empty() {
                output.push_str("    calls:\n");
                for call in &workflow.calls {
                    output.push_str(&format!("      - {target}", target = call.target));
                    if let Some(alias) = &call.alias {
                        output.push_str(&format!(" as {alias}"));
                    }

                    output.push('\n');
                    for (name, value) in &call.inputs {
                        output.push_str(&format!("          {name} = {value}\n"));
                    }
                }
            }

            items(&mut output, "meta", &workflow.meta);
            items(&mut output, "parameter_meta", &workflow.parameter_meta);
        }

        output.push_str(&format!("\nStructs ({count}):\n", count = self.structs.len()));
        for s in &self.structs {
            output.push_str(&format!("  - {name}\n", name = s.name));
            for member in &s.members {
                output.push_str(&format!(
                    "      - {ty} {name}\n",
                    ty = member.ty,
                    name = member.name
                ));
            }
        }

        output.push_str(&format!("\nImports ({count}):\n", count = self.imports.len()));
        for import in &self.imports {
            output.push_str(&format!("  - {uri}", uri = import.uri));
            if let Some(alias) = &import.alias {
                output.push_str(&format!(" as {alias}"));
            }

            output.push('\n');
        }

        output
    }
}

/// Summarizes the nodes of a document against its source.
struct Summarizer<'a> {
    /// The source of the document.
    source: &'a str,
}

impl Summarizer<'_> {
    /// Gets the source text of a span.
    fn text(&self, span: Span) -> String {
        self.source
            .get(span.start()..span.end())
            .unwrap_or_default()
            .to_string()
    }

    /// Summarizes an input declaration.
    fn input(&self, declaration: &Declaration) -> InputInfo {
        InputInfo {
            name: declaration.name().unwrap_or(MISSING).to_string(),
            ty: declaration.ty.to_string(),
            optional: declaration.ty.optional,
            default: declaration.expr().map(|e| self.text(e.span)),
        }
    }

    /// Summarizes an output declaration.
    fn output(&self, declaration: &Declaration) -> OutputInfo {
        OutputInfo {
            name: declaration.name().unwrap_or(MISSING).to_string(),
            ty: declaration.ty.to_string(),
            expression: declaration.expr().map(|e| self.text(e.span)),
        }
    }

    /// Summarizes the text of a command.
    fn command(&self, command: &CommandSection) -> String {
        let mut text = String::new();
        for part in &command.parts {
            match part {
                StringPart::Text { text: t, .. } => text.push_str(t),
                StringPart::Placeholder(placeholder) => {
                    let expr = match &placeholder.expr {
                        Slot::Present(expr) => self.text(expr.span),
                        Slot::Missing(_) => String::new(),
                    };
                    text.push_str(&format!("~{{{expr}}}"));
                }
            }
        }

        text.trim().to_string()
    }

    /// Summarizes the items of a runtime-like section.
    fn runtime(&self, section: &RuntimeSection) -> IndexMap<String, String> {
        section
            .items()
            .map(|item| {
                let value = match &item.value {
                    Slot::Present(expr) => self.text(expr.span),
                    Slot::Missing(_) => MISSING.to_string(),
                };
                (item.name.to_string(), value)
            })
            .collect()
    }

    /// Summarizes the items of a metadata section.
    fn metadata(&self, section: &MetadataSection) -> IndexMap<String, String> {
        section
            .items()
            .map(|item| {
                let value = self.text(Span::new(
                    item.name.span.end(),
                    item.span.end() - item.name.span.end(),
                ));
                let value = value.trim_start().trim_start_matches(':').trim();
                (item.name.to_string(), value.to_string())
            })
            .collect()
    }

    /// Summarizes a task.
    fn task(&self, task: &TaskDefinition) -> TaskInfo {
        let mut info = TaskInfo {
            name: task.name().unwrap_or(MISSING).to_string(),
            inputs: task.inputs().map(|d| self.input(d)).collect(),
            outputs: task.outputs().map(|d| self.output(d)).collect(),
            command: task.command().map(|c| self.command(c)),
            runtime: IndexMap::new(),
            meta: IndexMap::new(),
            parameter_meta: IndexMap::new(),
        };

        for item in task.items() {
            match item {
                TaskItem::Runtime(section) | TaskItem::Requirements(section) => {
                    info.runtime.extend(self.runtime(section))
                }
                TaskItem::Metadata(section) => info.meta.extend(self.metadata(section)),
                TaskItem::ParameterMetadata(section) => {
                    info.parameter_meta.extend(self.metadata(section))
                }
                _ => {}
            }
        }

        info
    }

    /// Summarizes a call.
    fn call(&self, call: &CallStatement) -> CallInfo {
        CallInfo {
            target: call
                .target
                .present()
                .map(|t| t.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
            alias: call
                .alias
                .as_ref()
                .map(|a| a.present().map(|a| a.to_string()).unwrap_or_else(|| MISSING.to_string())),
            inputs: call
                .inputs()
                .map(|input| {
                    let value = match &input.expr {
                        Some(Slot::Present(expr)) => self.text(expr.span),
                        Some(Slot::Missing(_)) => MISSING.to_string(),
                        None => input.name.to_string(),
                    };
                    (input.name.to_string(), value)
                })
                .collect(),
        }
    }

    /// Collects the calls of a statement and its nested statements.
    fn calls(&self, statement: &WorkflowStatement, calls: &mut Vec<CallInfo>) {
        match statement {
            WorkflowStatement::Call(call) => calls.push(self.call(call)),
            WorkflowStatement::Scatter(scatter) => {
                for statement in scatter.body.iter().filter_map(Slot::present) {
                    self.calls(statement, calls);
                }
            }
            WorkflowStatement::Conditional(conditional) => {
                for statement in conditional.body.iter().filter_map(Slot::present) {
                    self.calls(statement, calls);
                }
            }
            WorkflowStatement::Declaration(_) => {}
        }
    }

    /// Summarizes a workflow.
    fn workflow(&self, workflow: &WorkflowDefinition) -> WorkflowInfo {
        let mut info = WorkflowInfo {
            name: workflow.name().unwrap_or(MISSING).to_string(),
            inputs: workflow.inputs().map(|d| self.input(d)).collect(),
            outputs: workflow.outputs().map(|d| self.output(d)).collect(),
            calls: Vec::new(),
            meta: IndexMap::new(),
            parameter_meta: IndexMap::new(),
        };

        for item in workflow.items() {
            match item {
                WorkflowItem::Statement(statement) => self.calls(statement, &mut info.calls),
                WorkflowItem::Metadata(section) => info.meta.extend(self.metadata(section)),
                WorkflowItem::ParameterMetadata(section) => {
                    info.parameter_meta.extend(self.metadata(section))
                }
                _ => {}
            }
        }

        info
    }

    /// Summarizes a struct.
    fn structure(&self, s: &StructDefinition) -> StructInfo {
        StructInfo {
            name: s.name().unwrap_or(MISSING).to_string(),
            members: s
                .members()
                .map(|m| MemberInfo {
                    name: m.name().unwrap_or(MISSING).to_string(),
                    ty: m.ty.to_string(),
                })
                .collect(),
        }
    }

    /// Summarizes an import.
    fn import(&self, import: &ImportStatement) -> ImportInfo {
        ImportInfo {
            uri: import
                .uri
                .present()
                .and_then(|uri| uri.text())
                .unwrap_or_else(|| MISSING.to_string()),
            alias: import
                .namespace
                .as_ref()
                .and_then(Slot::present)
                .map(|n| n.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use wdlparse_grammar::ParseOptions;
    use wdlparse_grammar::parse;

    use super::*;

    const SOURCE: &str = r#"version 1.1

import "lib.wdl" as lib

struct Sample {
  String name
  Array[File] reads
}

task hello {
  meta {
    description: "Says hello"
  }

  input {
    String name
    Int? times = 2
  }

  command <<<
    echo "Hello ~{name}!"
  >>>

  output {
    String greeting = read_string(stdout())
  }

  runtime {
    container: "ubuntu:latest"
  }
}

workflow greet {
  input {
    String person
  }

  scatter (i in range(3)) {
    call hello as say { input: name = person }
  }

  call lib.other { input: person }
}
"#;

    #[test]
    fn summary() {
        let result = parse(SOURCE, ParseOptions::default());
        let info = DocumentInfo::new(result.document().unwrap(), result.source());

        assert_eq!(info.version.as_deref(), Some("1.1"));
        assert_eq!(info.imports, [ImportInfo {
            uri: "lib.wdl".to_string(),
            alias: Some("lib".to_string()),
        }]);
        assert_eq!(info.structs[0].members[1], MemberInfo {
            name: "reads".to_string(),
            ty: "Array[File]".to_string(),
        });

        let task = &info.tasks[0];
        assert_eq!(task.inputs[1], InputInfo {
            name: "times".to_string(),
            ty: "Int?".to_string(),
            optional: true,
            default: Some("2".to_string()),
        });
        assert_eq!(
            task.outputs[0].expression.as_deref(),
            Some("read_string(stdout())")
        );
        assert_eq!(task.command.as_deref(), Some(r#"echo "Hello ~{name}!""#));
        assert_eq!(task.runtime["container"], r#""ubuntu:latest""#);
        assert_eq!(task.meta["description"], r#""Says hello""#);

        let workflow = &info.workflows[0];
        assert_eq!(workflow.calls.len(), 2);
        assert_eq!(workflow.calls[0].target, "hello");
        assert_eq!(workflow.calls[0].alias.as_deref(), Some("say"));
        assert_eq!(workflow.calls[0].inputs["name"], "person");
        assert_eq!(workflow.calls[1].target, "lib.other");
        assert_eq!(workflow.calls[1].inputs["person"], "person");
    }

    #[test]
    fn human() {
        let result = parse(
            "version 1.0\ntask t {\n  command <<< echo hi >>>\n}\n",
            ParseOptions::default(),
        );
        let info = DocumentInfo::new(result.document().unwrap(), result.source());

        assert_eq!(
            info.to_human(),
            "WDL File Info\n=============\nVersion: 1.0\n\nTasks (1):\n  - t\n    command:\n      \
             echo hi\n\nWorkflows (0):\n\nStructs (0):\n\nImports (0):\n"
        );
    }

    #[test]
    fn json_includes_metadata_only_when_attached() {
        let result = parse("version 1.0\nworkflow w {}", ParseOptions::default());
        let info = DocumentInfo::new(result.document().unwrap(), result.source());
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("basic_metadata").is_none());

        let info = info.with_basic_metadata(wdlparse_grammar::extract_basic_metadata(
            result.source(),
        ));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["basic_metadata"]["workflow_name"], "w");
    }
}
