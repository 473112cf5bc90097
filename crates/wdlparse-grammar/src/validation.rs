//! Lightweight semantic checks performed on a parsed document.
//!
//! These checks never block tree construction; every problem found is
//! reported as a warning. Full type checking of expressions is not performed.

use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::Diagnostic;
use crate::Span;
use crate::tree::CallStatement;
use crate::tree::Declaration;
use crate::tree::Document;
use crate::tree::DocumentItem;
use crate::tree::ExprKind;
use crate::tree::Slot;
use crate::tree::TaskItem;
use crate::tree::Type;
use crate::tree::TypeKind;
use crate::tree::WorkflowDefinition;
use crate::tree::WorkflowItem;
use crate::tree::WorkflowStatement;

/// Creates a "type mismatch" diagnostic.
fn type_mismatch(ty: &Type, found: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(format!(
        "type mismatch: expected type `{ty}`, but found type `{found}`"
    ))
    .with_label(format!("this is type `{found}`"), span)
    .with_label(format!("the declared type is `{ty}`"), ty.span)
}

/// Creates a diagnostic for assigning `None` to a non-optional type.
fn none_to_non_optional(ty: &Type, span: Span) -> Diagnostic {
    Diagnostic::warning(format!("cannot assign `None` to non-optional type `{ty}`"))
        .with_label("`None` is assigned here", span)
        .with_fix("make the type optional by adding a `?` suffix")
}

/// Creates a diagnostic for a call to an undefined task.
fn undefined_task(name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(format!("call to undefined task `{name}`"))
        .with_label("this task is not defined in the document", span)
}

/// Creates a diagnostic for a reference to an undefined struct.
fn undefined_struct(name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(format!("unknown type `{name}`"))
        .with_label("this type is not a defined struct", span)
}

/// Creates a diagnostic for a name that conflicts with a previous definition.
fn duplicate(context: &str, name: &str, span: Span, first: Span) -> Diagnostic {
    Diagnostic::warning(format!("duplicate {context} name `{name}`"))
        .with_label(
            format!("this {context} name conflicts with a previous {context}"),
            span,
        )
        .with_label(format!("the {context} was first defined here"), first)
}

/// Validates a parsed document, returning the diagnostics found.
pub fn validate(document: &Document) -> Vec<Diagnostic> {
    let mut validator = Validator {
        tasks: IndexMap::new(),
        structs: document.structs().filter_map(|s| s.name()).collect(),
        check_structs: document.imports().next().is_none(),
        diagnostics: Vec::new(),
    };

    for task in document.tasks() {
        if let Slot::Present(name) = &task.name {
            if let Some(first) = validator.tasks.get(name.as_str()) {
                validator.diagnostics.push(duplicate(
                    "task",
                    name.as_str(),
                    name.span,
                    *first,
                ));
            } else {
                validator.tasks.insert(name.as_str(), name.span);
            }
        }
    }

    for item in &document.items {
        match item {
            Slot::Present(DocumentItem::Struct(s)) => {
                for member in s.members() {
                    validator.declaration(member);
                }
            }
            Slot::Present(DocumentItem::Task(task)) => {
                for item in task.items() {
                    match item {
                        TaskItem::Input(section) => {
                            section.declarations().for_each(|d| validator.declaration(d))
                        }
                        TaskItem::Output(section) => {
                            section.declarations().for_each(|d| validator.declaration(d))
                        }
                        TaskItem::Declaration(declaration) => validator.declaration(declaration),
                        _ => {}
                    }
                }
            }
            Slot::Present(DocumentItem::Workflow(workflow)) => validator.workflow(workflow),
            Slot::Present(DocumentItem::Import(_)) | Slot::Missing(_) => {}
        }
    }

    validator.diagnostics
}

/// Walks a document for the lightweight semantic checks.
struct Validator<'a> {
    /// The first definition of each task name.
    tasks: IndexMap<&'a str, Span>,
    /// The names of the structs defined in the document.
    structs: IndexSet<&'a str>,
    /// Whether references to undefined structs are reported.
    ///
    /// Structs may come from imports, so this is only done for documents
    /// without imports.
    check_structs: bool,
    /// The diagnostics found.
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Validator<'a> {
    /// Checks a workflow definition.
    fn workflow(&mut self, workflow: &'a WorkflowDefinition) {
        let mut calls = IndexMap::new();
        for item in workflow.items() {
            match item {
                WorkflowItem::Input(section) => {
                    section.declarations().for_each(|d| self.declaration(d))
                }
                WorkflowItem::Output(section) => {
                    section.declarations().for_each(|d| self.declaration(d))
                }
                WorkflowItem::Statement(statement) => self.statement(statement, &mut calls),
                _ => {}
            }
        }
    }

    /// Checks a workflow statement and, recursively, any nested statements.
    fn statement(
        &mut self,
        statement: &'a WorkflowStatement,
        calls: &mut IndexMap<&'a str, Span>,
    ) {
        match statement {
            WorkflowStatement::Call(call) => self.call(call, calls),
            WorkflowStatement::Scatter(scatter) => {
                for statement in scatter.body.iter().filter_map(Slot::present) {
                    self.statement(statement, calls);
                }
            }
            WorkflowStatement::Conditional(conditional) => {
                for statement in conditional.body.iter().filter_map(Slot::present) {
                    self.statement(statement, calls);
                }
            }
            WorkflowStatement::Declaration(declaration) => self.declaration(declaration),
        }
    }

    /// Checks a call statement.
    fn call(&mut self, call: &'a CallStatement, calls: &mut IndexMap<&'a str, Span>) {
        let Slot::Present(target) = &call.target else {
            return;
        };

        if !target.is_qualified() && !self.tasks.contains_key(target.name()) {
            self.diagnostics.push(undefined_task(target.name(), target.span));
        }

        let name = match &call.alias {
            Some(Slot::Present(alias)) => Some((alias.as_str(), alias.span)),
            Some(Slot::Missing(_)) => None,
            None => target.names.last().map(|n| (n.as_str(), n.span)),
        };

        if let Some((name, span)) = name {
            if let Some(first) = calls.get(name) {
                self.diagnostics.push(duplicate("call", name, span, *first));
            } else {
                calls.insert(name, span);
            }
        }
    }

    /// Checks a declaration.
    fn declaration(&mut self, declaration: &'a Declaration) {
        self.ty(&declaration.ty);

        let Some(expr) = declaration.expr() else {
            return;
        };

        let ty = &declaration.ty;
        let found = match &expr.kind {
            ExprKind::None => {
                if !ty.optional {
                    self.diagnostics.push(none_to_non_optional(ty, expr.span));
                }
                return;
            }
            ExprKind::Boolean(_) => "Boolean",
            ExprKind::Integer(_) => "Int",
            ExprKind::Float(_) => "Float",
            ExprKind::String(_) => "String",
            ExprKind::Array(_) => "Array",
            ExprKind::Map(_) => "Map",
            ExprKind::Pair(..) => "Pair",
            ExprKind::Object(_) => "Object",
            ExprKind::Struct { name, .. } => name.as_str(),
            _ => return,
        };

        let compatible = match &ty.kind {
            TypeKind::Boolean => found == "Boolean",
            TypeKind::Int => found == "Int",
            TypeKind::Float => matches!(found, "Int" | "Float"),
            TypeKind::String | TypeKind::File | TypeKind::Directory => found == "String",
            TypeKind::Array { .. } => found == "Array",
            TypeKind::Map { .. } => found == "Map",
            TypeKind::Pair { .. } => found == "Pair",
            TypeKind::Object => found == "Object",
            TypeKind::Named(name) => {
                matches!(found, "Object" | "Map") || found == name.as_str()
            }
        };

        if !compatible {
            self.diagnostics.push(type_mismatch(ty, found, expr.span));
        }
    }

    /// Checks a type and its nested types for references to undefined
    /// structs.
    fn ty(&mut self, ty: &Type) {
        /// Checks a nested type that may be missing.
        fn inner(validator: &mut Validator<'_>, ty: &Slot<Type>) {
            if let Slot::Present(ty) = ty {
                validator.ty(ty);
            }
        }

        match &ty.kind {
            TypeKind::Named(name) => {
                if self.check_structs && !self.structs.contains(name.as_str()) {
                    self.diagnostics.push(undefined_struct(name, ty.span));
                }
            }
            TypeKind::Array { element, .. } => inner(self, element),
            TypeKind::Map { key, value } => {
                inner(self, key);
                inner(self, value);
            }
            TypeKind::Pair { left, right } => {
                inner(self, left);
                inner(self, right);
            }
            _ => {}
        }
    }
}
