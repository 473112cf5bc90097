//! The tree renderer.
//!
//! Each node is written on its own line, indented by two spaces per level of
//! nesting. Expressions are not rendered.

use wdlparse_grammar::Document;
use wdlparse_grammar::ParseResult;
use wdlparse_grammar::tree::CallStatement;
use wdlparse_grammar::tree::Declaration;
use wdlparse_grammar::tree::DocumentItem;
use wdlparse_grammar::tree::Ident;
use wdlparse_grammar::tree::MetadataSection;
use wdlparse_grammar::tree::RuntimeSection;
use wdlparse_grammar::tree::Slot;
use wdlparse_grammar::tree::StructItem;
use wdlparse_grammar::tree::TaskItem;
use wdlparse_grammar::tree::WorkflowItem;
use wdlparse_grammar::tree::WorkflowStatement;

/// The text written for a child missing due to error recovery.
const MISSING: &str = "<missing>";

/// Renders the syntax tree of a parse result.
pub(super) fn render(result: &ParseResult) -> String {
    match result.document() {
        Some(document) => outline(document),
        None => "(no document)\n".to_string(),
    }
}

/// Renders an outline of a document's syntax tree.
pub fn outline(document: &Document) -> String {
    let mut writer = Writer::default();
    writer.document(document);
    writer.output
}

/// Gets the text of an identifier that may be missing.
fn name(ident: &Slot<Ident>) -> &str {
    ident.present().map(Ident::as_str).unwrap_or(MISSING)
}

/// Writes the outline of a syntax tree.
#[derive(Default)]
struct Writer {
    /// The output so far.
    output: String,
    /// The current nesting depth.
    depth: usize,
}

impl Writer {
    /// Writes a line at the current depth.
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.output.push_str("  ");
        }

        self.output.push_str(text);
        self.output.push('\n');
    }

    /// Writes a line and then the children written by the callback, nested
    /// one level deeper.
    fn node(&mut self, text: &str, children: impl FnOnce(&mut Self)) {
        self.line(text);
        self.depth += 1;
        children(self);
        self.depth -= 1;
    }

    /// Writes each slot with the callback, or a missing marker.
    fn slots<T>(&mut self, slots: &[Slot<T>], mut cb: impl FnMut(&mut Self, &T)) {
        for slot in slots {
            match slot {
                Slot::Present(item) => cb(self, item),
                Slot::Missing(_) => self.line(MISSING),
            }
        }
    }

    /// Writes a document.
    fn document(&mut self, document: &Document) {
        self.node("Document", |w| {
            match &document.version {
                Slot::Present(version) => {
                    w.line(&format!("VersionStatement {}", name(&version.version)))
                }
                Slot::Missing(_) => w.line(&format!("VersionStatement {MISSING}")),
            }

            w.slots(&document.items, |w, item| match item {
                DocumentItem::Import(import) => {
                    let uri = import
                        .uri
                        .present()
                        .and_then(|uri| uri.text())
                        .unwrap_or_else(|| MISSING.to_string());
                    let text = match &import.namespace {
                        Some(namespace) => format!("Import \"{uri}\" as {}", name(namespace)),
                        None => format!("Import \"{uri}\""),
                    };

                    w.node(&text, |w| {
                        w.slots(&import.aliases, |w, alias| {
                            w.line(&format!("Alias {} as {}", alias.source, alias.target))
                        })
                    });
                }
                DocumentItem::Struct(s) => {
                    w.node(&format!("Struct {}", name(&s.name)), |w| {
                        w.slots(&s.items, |w, item| match item {
                            StructItem::Member(d) => w.declaration(d),
                            StructItem::Metadata(m) => w.metadata("MetadataSection", m),
                            StructItem::ParameterMetadata(m) => {
                                w.metadata("ParameterMetadataSection", m)
                            }
                        })
                    });
                }
                DocumentItem::Task(task) => {
                    w.node(&format!("Task {}", name(&task.name)), |w| {
                        w.slots(&task.items, Self::task_item)
                    });
                }
                DocumentItem::Workflow(workflow) => {
                    w.node(&format!("Workflow {}", name(&workflow.name)), |w| {
                        w.slots(&workflow.items, Self::workflow_item)
                    });
                }
            });
        });
    }

    /// Writes an item of a task.
    fn task_item(&mut self, item: &TaskItem) {
        match item {
            TaskItem::Input(section) => self.node("InputSection", |w| {
                w.slots(&section.declarations, Self::declaration)
            }),
            TaskItem::Output(section) => self.node("OutputSection", |w| {
                w.slots(&section.declarations, Self::declaration)
            }),
            TaskItem::Command(_) => self.line("CommandSection"),
            TaskItem::Runtime(section) => self.runtime("RuntimeSection", section),
            TaskItem::Requirements(section) => self.runtime("RequirementsSection", section),
            TaskItem::Hints(section) => self.runtime("HintsSection", section),
            TaskItem::Metadata(section) => self.metadata("MetadataSection", section),
            TaskItem::ParameterMetadata(section) => {
                self.metadata("ParameterMetadataSection", section)
            }
            TaskItem::Declaration(d) => self.declaration(d),
        }
    }

    /// Writes an item of a workflow.
    fn workflow_item(&mut self, item: &WorkflowItem) {
        match item {
            WorkflowItem::Input(section) => self.node("InputSection", |w| {
                w.slots(&section.declarations, Self::declaration)
            }),
            WorkflowItem::Output(section) => self.node("OutputSection", |w| {
                w.slots(&section.declarations, Self::declaration)
            }),
            WorkflowItem::Metadata(section) => self.metadata("MetadataSection", section),
            WorkflowItem::ParameterMetadata(section) => {
                self.metadata("ParameterMetadataSection", section)
            }
            WorkflowItem::Hints(section) => self.runtime("HintsSection", section),
            WorkflowItem::Statement(statement) => self.statement(statement),
        }
    }

    /// Writes a workflow statement and its nested statements.
    fn statement(&mut self, statement: &WorkflowStatement) {
        match statement {
            WorkflowStatement::Call(call) => self.call(call),
            WorkflowStatement::Scatter(scatter) => {
                self.node(&format!("Scatter {}", name(&scatter.variable)), |w| {
                    w.slots(&scatter.body, Self::statement)
                })
            }
            WorkflowStatement::Conditional(conditional) => self.node("Conditional", |w| {
                w.slots(&conditional.body, Self::statement)
            }),
            WorkflowStatement::Declaration(d) => self.declaration(d),
        }
    }

    /// Writes a call statement.
    fn call(&mut self, call: &CallStatement) {
        let target = match &call.target {
            Slot::Present(target) => target.to_string(),
            Slot::Missing(_) => MISSING.to_string(),
        };

        let text = match &call.alias {
            Some(alias) => format!("Call {target} as {}", name(alias)),
            None => format!("Call {target}"),
        };

        self.node(&text, |w| {
            w.slots(&call.inputs, |w, input| {
                w.line(&format!("CallInput {}", input.name))
            })
        });
    }

    /// Writes a declaration.
    fn declaration(&mut self, declaration: &Declaration) {
        self.line(&format!(
            "Declaration {ty} {name}",
            ty = declaration.ty,
            name = name(&declaration.name)
        ));
    }

    /// Writes a runtime-like section.
    fn runtime(&mut self, text: &str, section: &RuntimeSection) {
        self.node(text, |w| {
            w.slots(&section.items, |w, item| {
                w.line(&format!("RuntimeItem {}", item.name))
            })
        });
    }

    /// Writes a metadata section.
    fn metadata(&mut self, text: &str, section: &MetadataSection) {
        self.node(text, |w| {
            w.slots(&section.items, |w, item| {
                w.line(&format!("MetadataItem {}", item.name))
            })
        });
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use wdlparse_grammar::ParseOptions;
    use wdlparse_grammar::parse;

    use super::*;

    #[test]
    fn outline_of_a_document() {
        let result = parse(
            r#"version 1.1
import "lib.wdl" as lib
struct Point {
  Int x
  Int y
}
task t {
  input {
    Int? n
  }
  command <<< >>>
  runtime {
    cpu: 1
  }
}
workflow w {
  scatter (i in [1, 2]) {
    if (true) {
      call t as inner { input: n = i }
    }
  }
  output {
    Array[Int?] out = inner.n
  }
}
"#,
            ParseOptions::default(),
        );

        assert_eq!(
            render(&result),
            r#"Document
  VersionStatement 1.1
  Import "lib.wdl" as lib
  Struct Point
    Declaration Int x
    Declaration Int y
  Task t
    InputSection
      Declaration Int? n
    CommandSection
    RuntimeSection
      RuntimeItem cpu
  Workflow w
    Scatter i
      Conditional
        Call t as inner
          CallInput n
    OutputSection
      Declaration Array[Int?] out
"#
        );
    }

    #[test]
    fn missing_children() {
        let result = parse("workflow {\n  Int = 1\n  ,,,\n}", ParseOptions::default());
        assert_eq!(
            render(&result),
            "Document\n  VersionStatement <missing>\n  Workflow <missing>\n    Declaration Int \
             <missing>\n    <missing>\n"
        );
    }

    #[test]
    fn no_document() {
        let result = parse("  ", ParseOptions::default());
        assert_eq!(render(&result), "(no document)\n");
    }
}
