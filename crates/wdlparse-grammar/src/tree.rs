//! Module for the typed syntax tree produced by the parser.
//!
//! Every node owns its children. A child that the grammar permits to be
//! omitted is represented with [Option]; a child that should have been present
//! but could not be parsed is represented with [Slot::Missing].

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::Span;

/// Represents a child node that may be missing due to error recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot<T> {
    /// The child was parsed.
    Present(T),
    /// The child could not be parsed; the span covers the source that was
    /// skipped during recovery (possibly empty).
    Missing(Span),
}

impl<T> Slot<T> {
    /// Gets the child if it is present.
    pub fn present(&self) -> Option<&T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Missing(_) => None,
        }
    }

    /// Determines if the child is missing.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }

    /// Converts the slot into an [Option], discarding the span of a missing
    /// child.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Missing(_) => None,
        }
    }
}

impl<T> From<Result<T, Span>> for Slot<T> {
    fn from(result: Result<T, Span>) -> Self {
        match result {
            Ok(v) => Self::Present(v),
            Err(span) => Self::Missing(span),
        }
    }
}

/// Iterates the present children of a list of slots.
pub(crate) fn present<T>(slots: &[Slot<T>]) -> impl Iterator<Item = &T> {
    slots.iter().filter_map(Slot::present)
}

/// An identifier with its source span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    /// The text of the identifier.
    pub name: String,
    /// The span of the identifier.
    pub span: Span,
}

impl Ident {
    /// Gets the text of the identifier.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{name}", name = self.name)
    }
}

/// The root of a parsed WDL document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The version statement of the document.
    pub version: Slot<VersionStatement>,
    /// The top-level items of the document.
    pub items: Vec<Slot<DocumentItem>>,
    /// The span of the entire document.
    pub span: Span,
}

impl Document {
    /// Gets the version text of the document, if a version statement was
    /// parsed.
    pub fn version(&self) -> Option<&str> {
        self.version
            .present()
            .and_then(|v| v.version.present())
            .map(Ident::as_str)
    }

    /// Iterates the import statements of the document.
    pub fn imports(&self) -> impl Iterator<Item = &ImportStatement> {
        present(&self.items).filter_map(|i| match i {
            DocumentItem::Import(i) => Some(i),
            _ => None,
        })
    }

    /// Iterates the struct definitions of the document.
    pub fn structs(&self) -> impl Iterator<Item = &StructDefinition> {
        present(&self.items).filter_map(|i| match i {
            DocumentItem::Struct(s) => Some(s),
            _ => None,
        })
    }

    /// Iterates the task definitions of the document.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskDefinition> {
        present(&self.items).filter_map(|i| match i {
            DocumentItem::Task(t) => Some(t),
            _ => None,
        })
    }

    /// Iterates the workflow definitions of the document.
    ///
    /// A valid document has at most one workflow.
    pub fn workflows(&self) -> impl Iterator<Item = &WorkflowDefinition> {
        present(&self.items).filter_map(|i| match i {
            DocumentItem::Workflow(w) => Some(w),
            _ => None,
        })
    }

    /// Finds a task definition by name.
    pub fn task(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks().find(|t| t.name() == Some(name))
    }
}

/// A version statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionStatement {
    /// The version literal.
    pub version: Slot<Ident>,
    /// The span of the statement.
    pub span: Span,
}

/// An item at the top level of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentItem {
    /// An import statement.
    Import(ImportStatement),
    /// A struct definition.
    Struct(StructDefinition),
    /// A task definition.
    Task(TaskDefinition),
    /// A workflow definition.
    Workflow(WorkflowDefinition),
}

/// An import statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportStatement {
    /// The URI being imported.
    pub uri: Slot<StringLiteral>,
    /// The namespace given with `as`.
    pub namespace: Option<Slot<Ident>>,
    /// The struct aliases given with `alias`.
    pub aliases: Vec<Slot<ImportAlias>>,
    /// The span of the statement.
    pub span: Span,
}

/// An `alias A as B` clause of an import statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportAlias {
    /// The struct name in the imported document.
    pub source: Ident,
    /// The name the struct is known by in this document.
    pub target: Ident,
}

/// A struct definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDefinition {
    /// The name of the struct.
    pub name: Slot<Ident>,
    /// The items in the struct body.
    pub items: Vec<Slot<StructItem>>,
    /// The span of the definition.
    pub span: Span,
}

impl StructDefinition {
    /// Gets the name of the struct, if it was parsed.
    pub fn name(&self) -> Option<&str> {
        self.name.present().map(Ident::as_str)
    }

    /// Iterates the member declarations of the struct.
    pub fn members(&self) -> impl Iterator<Item = &Declaration> {
        present(&self.items).filter_map(|i| match i {
            StructItem::Member(d) => Some(d),
            _ => None,
        })
    }
}

/// An item in a struct body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructItem {
    /// A member declaration.
    Member(Declaration),
    /// A `meta` section.
    Metadata(MetadataSection),
    /// A `parameter_meta` section.
    ParameterMetadata(MetadataSection),
}

/// A task definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// The name of the task.
    pub name: Slot<Ident>,
    /// The items in the task body.
    pub items: Vec<Slot<TaskItem>>,
    /// The span of the definition.
    pub span: Span,
}

impl TaskDefinition {
    /// Gets the name of the task, if it was parsed.
    pub fn name(&self) -> Option<&str> {
        self.name.present().map(Ident::as_str)
    }

    /// Iterates the present items of the task.
    pub fn items(&self) -> impl Iterator<Item = &TaskItem> {
        present(&self.items)
    }

    /// Iterates the input declarations of the task.
    pub fn inputs(&self) -> impl Iterator<Item = &Declaration> {
        self.items()
            .filter_map(|i| match i {
                TaskItem::Input(s) => Some(s.declarations()),
                _ => None,
            })
            .flatten()
    }

    /// Iterates the output declarations of the task.
    pub fn outputs(&self) -> impl Iterator<Item = &Declaration> {
        self.items()
            .filter_map(|i| match i {
                TaskItem::Output(s) => Some(s.declarations()),
                _ => None,
            })
            .flatten()
    }

    /// Gets the first command section of the task.
    pub fn command(&self) -> Option<&CommandSection> {
        self.items().find_map(|i| match i {
            TaskItem::Command(c) => Some(c),
            _ => None,
        })
    }

    /// Gets the first runtime section of the task.
    pub fn runtime(&self) -> Option<&RuntimeSection> {
        self.items().find_map(|i| match i {
            TaskItem::Runtime(r) => Some(r),
            _ => None,
        })
    }

    /// Iterates the private declarations of the task.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.items().filter_map(|i| match i {
            TaskItem::Declaration(d) => Some(d),
            _ => None,
        })
    }
}

/// An item in a task body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskItem {
    /// An `input` section.
    Input(InputSection),
    /// An `output` section.
    Output(OutputSection),
    /// A `command` section.
    Command(CommandSection),
    /// A `runtime` section.
    Runtime(RuntimeSection),
    /// A `requirements` section.
    Requirements(RuntimeSection),
    /// A `hints` section.
    Hints(RuntimeSection),
    /// A `meta` section.
    Metadata(MetadataSection),
    /// A `parameter_meta` section.
    ParameterMetadata(MetadataSection),
    /// A private declaration.
    Declaration(Declaration),
}

/// A workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// The name of the workflow.
    pub name: Slot<Ident>,
    /// The items in the workflow body.
    pub items: Vec<Slot<WorkflowItem>>,
    /// The span of the definition.
    pub span: Span,
}

impl WorkflowDefinition {
    /// Gets the name of the workflow, if it was parsed.
    pub fn name(&self) -> Option<&str> {
        self.name.present().map(Ident::as_str)
    }

    /// Iterates the present items of the workflow.
    pub fn items(&self) -> impl Iterator<Item = &WorkflowItem> {
        present(&self.items)
    }

    /// Iterates the input declarations of the workflow.
    pub fn inputs(&self) -> impl Iterator<Item = &Declaration> {
        self.items()
            .filter_map(|i| match i {
                WorkflowItem::Input(s) => Some(s.declarations()),
                _ => None,
            })
            .flatten()
    }

    /// Iterates the output declarations of the workflow.
    pub fn outputs(&self) -> impl Iterator<Item = &Declaration> {
        self.items()
            .filter_map(|i| match i {
                WorkflowItem::Output(s) => Some(s.declarations()),
                _ => None,
            })
            .flatten()
    }

    /// Iterates the top-level statements of the workflow body.
    pub fn statements(&self) -> impl Iterator<Item = &WorkflowStatement> {
        self.items().filter_map(|i| match i {
            WorkflowItem::Statement(s) => Some(s),
            _ => None,
        })
    }
}

/// An item in a workflow body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowItem {
    /// An `input` section.
    Input(InputSection),
    /// An `output` section.
    Output(OutputSection),
    /// A `meta` section.
    Metadata(MetadataSection),
    /// A `parameter_meta` section.
    ParameterMetadata(MetadataSection),
    /// A `hints` section.
    Hints(RuntimeSection),
    /// A workflow statement.
    Statement(WorkflowStatement),
}

/// A statement in a workflow, scatter, or conditional body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatement {
    /// A call statement.
    Call(CallStatement),
    /// A scatter statement.
    Scatter(ScatterStatement),
    /// A conditional statement.
    Conditional(ConditionalStatement),
    /// A private declaration.
    Declaration(Declaration),
}

/// An `input` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSection {
    /// The declarations in the section.
    pub declarations: Vec<Slot<Declaration>>,
    /// The span of the section.
    pub span: Span,
}

impl InputSection {
    /// Iterates the present declarations of the section.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        present(&self.declarations)
    }
}

/// An `output` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    /// The declarations in the section.
    pub declarations: Vec<Slot<Declaration>>,
    /// The span of the section.
    pub span: Span,
}

impl OutputSection {
    /// Iterates the present declarations of the section.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        present(&self.declarations)
    }
}

/// A declaration of a name with a type and an optional initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// The declared type.
    pub ty: Type,
    /// The declared name.
    pub name: Slot<Ident>,
    /// The initializer expression.
    ///
    /// This is `None` for an unbound declaration (e.g. an input without a
    /// default).
    pub expr: Option<Slot<Expr>>,
    /// The span of the declaration.
    pub span: Span,
}

impl Declaration {
    /// Gets the declared name, if it was parsed.
    pub fn name(&self) -> Option<&str> {
        self.name.present().map(Ident::as_str)
    }

    /// Gets the initializer expression, if one was parsed.
    pub fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref().and_then(Slot::present)
    }
}

/// A WDL type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Type {
    /// The kind of the type.
    pub kind: TypeKind,
    /// Whether the type is optional (i.e. has a `?` suffix).
    pub optional: bool,
    /// The span of the type.
    pub span: Span,
}

/// The kind of a WDL type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// The `Boolean` type.
    Boolean,
    /// The `Int` type.
    Int,
    /// The `Float` type.
    Float,
    /// The `String` type.
    String,
    /// The `File` type.
    File,
    /// The `Directory` type.
    Directory,
    /// The `Object` type.
    Object,
    /// An `Array` type.
    Array {
        /// The element type.
        element: Box<Slot<Type>>,
        /// Whether the array is non-empty (i.e. has a `+` suffix).
        non_empty: bool,
    },
    /// A `Map` type.
    Map {
        /// The key type.
        key: Box<Slot<Type>>,
        /// The value type.
        value: Box<Slot<Type>>,
    },
    /// A `Pair` type.
    Pair {
        /// The left type.
        left: Box<Slot<Type>>,
        /// The right type.
        right: Box<Slot<Type>>,
    },
    /// A reference to a struct type.
    Named(String),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        /// Writes an inner type that may be missing.
        fn inner(f: &mut fmt::Formatter<'_>, ty: &Slot<Type>) -> fmt::Result {
            match ty {
                Slot::Present(ty) => write!(f, "{ty}"),
                Slot::Missing(_) => write!(f, "?"),
            }
        }

        match &self.kind {
            TypeKind::Boolean => write!(f, "Boolean")?,
            TypeKind::Int => write!(f, "Int")?,
            TypeKind::Float => write!(f, "Float")?,
            TypeKind::String => write!(f, "String")?,
            TypeKind::File => write!(f, "File")?,
            TypeKind::Directory => write!(f, "Directory")?,
            TypeKind::Object => write!(f, "Object")?,
            TypeKind::Array { element, non_empty } => {
                write!(f, "Array[")?;
                inner(f, element)?;
                write!(f, "]")?;
                if *non_empty {
                    write!(f, "+")?;
                }
            }
            TypeKind::Map { key, value } => {
                write!(f, "Map[")?;
                inner(f, key)?;
                write!(f, ", ")?;
                inner(f, value)?;
                write!(f, "]")?;
            }
            TypeKind::Pair { left, right } => {
                write!(f, "Pair[")?;
                inner(f, left)?;
                write!(f, ", ")?;
                inner(f, right)?;
                write!(f, "]")?;
            }
            TypeKind::Named(name) => write!(f, "{name}")?,
        }

        if self.optional {
            write!(f, "?")?;
        }

        Ok(())
    }
}

/// The style of a command section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStyle {
    /// A `command { ... }` section.
    Braced,
    /// A `command <<< ... >>>` section.
    Heredoc,
}

/// A `command` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSection {
    /// The style of the command.
    pub style: CommandStyle,
    /// The literal text and placeholders of the command.
    pub parts: Vec<StringPart>,
    /// The span of the section.
    pub span: Span,
}

/// A part of a string literal or command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringPart {
    /// Literal text, with escape sequences left as written.
    Text {
        /// The text.
        text: String,
        /// The span of the text.
        span: Span,
    },
    /// A placeholder.
    Placeholder(Placeholder),
}

/// A `~{...}` or `${...}` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    /// The options preceding the placeholder expression.
    pub options: Vec<PlaceholderOption>,
    /// The placeholder expression.
    pub expr: Slot<Expr>,
    /// The span of the placeholder, including its delimiters.
    pub span: Span,
}

/// An option of a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderOption {
    /// A `sep=` option.
    Sep(Slot<StringLiteral>),
    /// A `default=` option.
    Default(Slot<StringLiteral>),
    /// A `true=` and `false=` option pair.
    TrueFalse {
        /// The value for `true`.
        when_true: Slot<StringLiteral>,
        /// The value for `false`.
        when_false: Slot<StringLiteral>,
    },
}

/// A `runtime`, `requirements`, or `hints` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSection {
    /// The items of the section.
    pub items: Vec<Slot<RuntimeItem>>,
    /// The span of the section.
    pub span: Span,
}

impl RuntimeSection {
    /// Iterates the present items of the section.
    pub fn items(&self) -> impl Iterator<Item = &RuntimeItem> {
        present(&self.items)
    }
}

/// A `key: value` item of a runtime-like section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeItem {
    /// The key.
    pub name: Ident,
    /// The value expression.
    pub value: Slot<Expr>,
    /// The span of the item.
    pub span: Span,
}

/// A `meta` or `parameter_meta` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataSection {
    /// The items of the section.
    pub items: Vec<Slot<MetadataItem>>,
    /// The span of the section.
    pub span: Span,
}

impl MetadataSection {
    /// Iterates the present items of the section.
    pub fn items(&self) -> impl Iterator<Item = &MetadataItem> {
        present(&self.items)
    }
}

/// A `key: value` item of a metadata section or object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataItem {
    /// The key.
    pub name: Ident,
    /// The value.
    pub value: Slot<MetadataValue>,
    /// The span of the item.
    pub span: Span,
}

/// A metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataValue {
    /// The `null` value.
    Null,
    /// A boolean.
    Boolean(bool),
    /// An integer.
    Integer(i64),
    /// A float.
    Float(f64),
    /// A string, with escape sequences left as written.
    String(String),
    /// An array of values.
    Array(Vec<Slot<MetadataValue>>),
    /// An object.
    Object(Vec<Slot<MetadataItem>>),
}

/// A call statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallStatement {
    /// The call target.
    pub target: Slot<CallTarget>,
    /// The alias given with `as`.
    pub alias: Option<Slot<Ident>>,
    /// The calls named in `after` clauses.
    pub after: Vec<Slot<Ident>>,
    /// The input items of the call body.
    pub inputs: Vec<Slot<CallInput>>,
    /// The span of the statement.
    pub span: Span,
}

impl CallStatement {
    /// Gets the name the call is known by in the workflow.
    ///
    /// This is the alias if one was given; otherwise, it is the last
    /// component of the target.
    pub fn name(&self) -> Option<&str> {
        match &self.alias {
            Some(alias) => alias.present().map(Ident::as_str),
            None => self.target.present().map(CallTarget::name),
        }
    }

    /// Iterates the present input items of the call.
    pub fn inputs(&self) -> impl Iterator<Item = &CallInput> {
        present(&self.inputs)
    }
}

/// The (possibly namespace-qualified) target of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallTarget {
    /// The dot-separated components of the target.
    pub names: Vec<Ident>,
    /// The span of the target.
    pub span: Span,
}

impl CallTarget {
    /// Gets the unqualified name of the target (its last component).
    pub fn name(&self) -> &str {
        self.names.last().map(Ident::as_str).unwrap_or_default()
    }

    /// Determines if the target is qualified with a namespace.
    pub fn is_qualified(&self) -> bool {
        self.names.len() > 1
    }
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }

            write!(f, "{name}")?;
        }

        Ok(())
    }
}

/// An input item in a call body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallInput {
    /// The input name.
    pub name: Ident,
    /// The input value.
    ///
    /// This is `None` for the `name` shorthand of `name = name`.
    pub expr: Option<Slot<Expr>>,
    /// The span of the item.
    pub span: Span,
}

/// A scatter statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterStatement {
    /// The scatter variable.
    pub variable: Slot<Ident>,
    /// The expression being scattered over.
    pub expr: Slot<Expr>,
    /// The statements of the scatter body.
    pub body: Vec<Slot<WorkflowStatement>>,
    /// The span of the statement.
    pub span: Span,
}

/// A conditional statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalStatement {
    /// The condition expression.
    pub condition: Slot<Expr>,
    /// The statements of the conditional body.
    pub body: Vec<Slot<WorkflowStatement>>,
    /// The span of the statement.
    pub span: Span,
}

/// A string literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLiteral {
    /// The literal text and placeholders of the string.
    pub parts: Vec<StringPart>,
    /// The span of the string, including its quotes.
    pub span: Span,
}

impl StringLiteral {
    /// Gets the text of the string if it has no placeholders.
    pub fn text(&self) -> Option<String> {
        let mut text = String::new();
        for part in &self.parts {
            match part {
                StringPart::Text { text: t, .. } => text.push_str(t),
                StringPart::Placeholder(_) => return None,
            }
        }

        Some(text)
    }
}

impl StringPart {
    /// Gets the span of the part.
    pub fn span(&self) -> Span {
        match self {
            Self::Text { span, .. } => *span,
            Self::Placeholder(placeholder) => placeholder.span,
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// The kind of the expression.
    pub kind: ExprKind,
    /// The span of the expression.
    pub span: Span,
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// The `!` operator.
    Not,
    /// The `-` operator.
    Negate,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    /// The `||` operator.
    Or,
    /// The `&&` operator.
    And,
    /// The `==` operator.
    Equal,
    /// The `!=` operator.
    NotEqual,
    /// The `<` operator.
    Less,
    /// The `<=` operator.
    LessEqual,
    /// The `>` operator.
    Greater,
    /// The `>=` operator.
    GreaterEqual,
    /// The `+` operator.
    Add,
    /// The `-` operator.
    Subtract,
    /// The `*` operator.
    Multiply,
    /// The `/` operator.
    Divide,
    /// The `%` operator.
    Modulo,
    /// The `**` operator.
    Exponentiate,
}

/// A `key: value` entry of a map literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    /// The key expression.
    pub key: Expr,
    /// The value expression.
    pub value: Slot<Expr>,
}

/// A `name: value` field of an object or struct literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectField {
    /// The field name.
    pub name: Ident,
    /// The field value.
    pub value: Slot<Expr>,
}

/// The kind of an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    /// The `None` literal.
    None,
    /// A boolean literal.
    Boolean(bool),
    /// An integer literal.
    Integer(i64),
    /// A float literal.
    Float(f64),
    /// A string literal.
    String(StringLiteral),
    /// A reference to a name.
    Name(String),
    /// An array literal.
    Array(Vec<Slot<Expr>>),
    /// A pair literal.
    Pair(Box<Expr>, Box<Slot<Expr>>),
    /// A map literal.
    Map(Vec<Slot<MapEntry>>),
    /// An object literal.
    Object(Vec<Slot<ObjectField>>),
    /// A struct literal.
    Struct {
        /// The struct name.
        name: Ident,
        /// The struct fields.
        fields: Vec<Slot<ObjectField>>,
    },
    /// An `if then else` expression.
    If {
        /// The condition.
        condition: Box<Slot<Expr>>,
        /// The expression when the condition is true.
        then: Box<Slot<Expr>>,
        /// The expression when the condition is false.
        otherwise: Box<Slot<Expr>>,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left-hand side.
        lhs: Box<Expr>,
        /// The right-hand side.
        rhs: Box<Expr>,
    },
    /// A function call.
    Call {
        /// The function name.
        function: Ident,
        /// The arguments.
        arguments: Vec<Slot<Expr>>,
    },
    /// An index operation.
    Index {
        /// The expression being indexed.
        target: Box<Expr>,
        /// The index.
        index: Box<Slot<Expr>>,
    },
    /// A member access.
    Access {
        /// The expression being accessed.
        target: Box<Expr>,
        /// The member name.
        member: Ident,
    },
}

impl Expr {
    /// Visits the names referenced by the expression, in source order.
    ///
    /// For a member access such as `call.output`, only the root name is
    /// visited. Function names and struct literal names are not references.
    pub fn visit_names<'a>(&'a self, cb: &mut impl FnMut(&'a str, Span)) {
        /// Visits a child that may be missing.
        fn slot<'a>(expr: &'a Slot<Expr>, cb: &mut impl FnMut(&'a str, Span)) {
            if let Slot::Present(expr) = expr {
                expr.visit_names(cb);
            }
        }

        match &self.kind {
            ExprKind::None
            | ExprKind::Boolean(_)
            | ExprKind::Integer(_)
            | ExprKind::Float(_) => {}
            ExprKind::Name(name) => cb(name, self.span),
            ExprKind::String(s) => s.visit_names(cb),
            ExprKind::Array(elements) => elements.iter().for_each(|e| slot(e, cb)),
            ExprKind::Pair(left, right) => {
                left.visit_names(cb);
                slot(right, cb);
            }
            ExprKind::Map(entries) => {
                for entry in present(entries) {
                    entry.key.visit_names(cb);
                    slot(&entry.value, cb);
                }
            }
            ExprKind::Object(fields) | ExprKind::Struct { fields, .. } => {
                for field in present(fields) {
                    slot(&field.value, cb);
                }
            }
            ExprKind::If {
                condition,
                then,
                otherwise,
            } => {
                slot(condition, cb);
                slot(then, cb);
                slot(otherwise, cb);
            }
            ExprKind::Unary { operand, .. } => operand.visit_names(cb),
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.visit_names(cb);
                rhs.visit_names(cb);
            }
            ExprKind::Call { arguments, .. } => arguments.iter().for_each(|a| slot(a, cb)),
            ExprKind::Index { target, index } => {
                target.visit_names(cb);
                slot(index, cb);
            }
            ExprKind::Access { target, .. } => target.visit_names(cb),
        }
    }

    /// Collects the names referenced by the expression.
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.visit_names(&mut |name, _| names.push(name));
        names
    }
}

impl StringLiteral {
    /// Visits the names referenced by the placeholders of the string.
    pub fn visit_names<'a>(&'a self, cb: &mut impl FnMut(&'a str, Span)) {
        visit_part_names(&self.parts, cb);
    }
}

impl CommandSection {
    /// Visits the names referenced by the placeholders of the command.
    pub fn visit_names<'a>(&'a self, cb: &mut impl FnMut(&'a str, Span)) {
        visit_part_names(&self.parts, cb);
    }
}

/// Visits the names referenced by the placeholders of string parts.
fn visit_part_names<'a>(parts: &'a [StringPart], cb: &mut impl FnMut(&'a str, Span)) {
    for part in parts {
        if let StringPart::Placeholder(placeholder) = part
            && let Slot::Present(expr) = &placeholder.expr
        {
            expr.visit_names(cb);
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ident(name: &str) -> Ident {
        Ident {
            name: name.to_string(),
            span: Span::new(0, name.len()),
        }
    }

    fn expr(kind: ExprKind) -> Expr {
        Expr {
            kind,
            span: Span::new(0, 0),
        }
    }

    #[test]
    fn type_display() {
        let ty = Type {
            kind: TypeKind::Map {
                key: Box::new(Slot::Present(Type {
                    kind: TypeKind::String,
                    optional: false,
                    span: Span::new(0, 0),
                })),
                value: Box::new(Slot::Present(Type {
                    kind: TypeKind::Array {
                        element: Box::new(Slot::Missing(Span::new(0, 0))),
                        non_empty: true,
                    },
                    optional: false,
                    span: Span::new(0, 0),
                })),
            },
            optional: true,
            span: Span::new(0, 0),
        };

        assert_eq!(ty.to_string(), "Map[String, Array[?]+]?");
    }

    #[test]
    fn call_name_prefers_alias() {
        let mut call = CallStatement {
            target: Slot::Present(CallTarget {
                names: vec![ident("lib"), ident("align")],
                span: Span::new(0, 9),
            }),
            alias: None,
            after: Vec::new(),
            inputs: Vec::new(),
            span: Span::new(0, 9),
        };

        assert_eq!(call.name(), Some("align"));
        call.alias = Some(Slot::Present(ident("first")));
        assert_eq!(call.name(), Some("first"));
        call.alias = Some(Slot::Missing(Span::new(0, 0)));
        assert_eq!(call.name(), None);
    }

    #[test]
    fn referenced_names() {
        let e = expr(ExprKind::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(expr(ExprKind::Access {
                target: Box::new(expr(ExprKind::Name("step".to_string()))),
                member: ident("out"),
            })),
            rhs: Box::new(expr(ExprKind::Call {
                function: ident("length"),
                arguments: vec![
                    Slot::Present(expr(ExprKind::Name("items".to_string()))),
                    Slot::Missing(Span::new(0, 0)),
                ],
            })),
        });

        assert_eq!(e.names(), ["step", "items"]);
    }

    #[test]
    fn slot_serialization() {
        let slot: Slot<Ident> = Slot::Missing(Span::new(3, 2));
        let json = serde_json::to_string(&slot).unwrap();
        assert_eq!(json, r#"{"missing":{"start":3,"end":5}}"#);
        let back: Slot<Ident> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slot);
    }
}
