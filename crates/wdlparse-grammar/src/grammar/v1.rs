//! Module for the V1 grammar functions.

use crate::Diagnostic;
use crate::Span;
use crate::lexer::SyntaxKind;
use crate::lexer::TokenSet;
use crate::parser::Parser;
use crate::parser::expected_found;
use crate::parser::expected_one_of;
use crate::parser::unmatched;
use crate::tree::BinaryOp;
use crate::tree::CallInput;
use crate::tree::CallStatement;
use crate::tree::CallTarget;
use crate::tree::CommandSection;
use crate::tree::CommandStyle;
use crate::tree::ConditionalStatement;
use crate::tree::Declaration;
use crate::tree::DocumentItem;
use crate::tree::Expr;
use crate::tree::ExprKind;
use crate::tree::Ident;
use crate::tree::ImportAlias;
use crate::tree::ImportStatement;
use crate::tree::InputSection;
use crate::tree::MapEntry;
use crate::tree::MetadataItem;
use crate::tree::MetadataSection;
use crate::tree::MetadataValue;
use crate::tree::ObjectField;
use crate::tree::OutputSection;
use crate::tree::Placeholder;
use crate::tree::PlaceholderOption;
use crate::tree::RuntimeItem;
use crate::tree::RuntimeSection;
use crate::tree::ScatterStatement;
use crate::tree::Slot;
use crate::tree::StringLiteral;
use crate::tree::StringPart;
use crate::tree::StructDefinition;
use crate::tree::StructItem;
use crate::tree::TaskDefinition;
use crate::tree::TaskItem;
use crate::tree::Type;
use crate::tree::TypeKind;
use crate::tree::UnaryOp;
use crate::tree::WorkflowDefinition;
use crate::tree::WorkflowItem;
use crate::tree::WorkflowStatement;

/// The expected set of tokens at the top-level of a WDL document.
const TOP_EXPECTED_SET: TokenSet = TokenSet::new(&[
    SyntaxKind::ImportKeyword as u8,
    SyntaxKind::StructKeyword as u8,
    SyntaxKind::TaskKeyword as u8,
    SyntaxKind::WorkflowKeyword as u8,
]);

/// The names of the expected top-level items.
const TOP_EXPECTED_NAMES: &[&str] = &[
    "import statement",
    "struct definition",
    "task definition",
    "workflow definition",
];

/// The recovery set for top-level.
const TOP_RECOVERY_SET: TokenSet = TOP_EXPECTED_SET;

/// The set of identifier tokens.
const IDENT: TokenSet = TokenSet::new(&[SyntaxKind::Ident as u8]);

/// A set of tokens for primitive types.
const PRIMITIVE_TYPE_SET: TokenSet = TokenSet::new(&[
    SyntaxKind::BooleanTypeKeyword as u8,
    SyntaxKind::IntTypeKeyword as u8,
    SyntaxKind::FloatTypeKeyword as u8,
    SyntaxKind::StringTypeKeyword as u8,
    SyntaxKind::FileTypeKeyword as u8,
    SyntaxKind::DirectoryTypeKeyword as u8,
]);

/// A set of tokens for all types.
const TYPE_EXPECTED_SET: TokenSet = PRIMITIVE_TYPE_SET.union(TokenSet::new(&[
    SyntaxKind::MapTypeKeyword as u8,
    SyntaxKind::ArrayTypeKeyword as u8,
    SyntaxKind::PairTypeKeyword as u8,
    SyntaxKind::ObjectTypeKeyword as u8,
    SyntaxKind::Ident as u8,
]));

/// The recovery set for struct items.
const STRUCT_ITEM_RECOVERY_SET: TokenSet = TYPE_EXPECTED_SET.union(TokenSet::new(&[
    SyntaxKind::MetaKeyword as u8,
    SyntaxKind::ParameterMetaKeyword as u8,
    SyntaxKind::CloseBrace as u8,
]));

/// The recovery set for input items.
const INPUT_ITEM_RECOVERY_SET: TokenSet =
    TYPE_EXPECTED_SET.union(TokenSet::new(&[SyntaxKind::CloseBrace as u8]));

/// The recovery set for output items.
const OUTPUT_ITEM_RECOVERY_SET: TokenSet =
    TYPE_EXPECTED_SET.union(TokenSet::new(&[SyntaxKind::CloseBrace as u8]));

/// The recovery set for runtime, requirements, and hints items.
const RUNTIME_ITEM_RECOVERY_SET: TokenSet =
    ANY_IDENT.union(TokenSet::new(&[SyntaxKind::CloseBrace as u8]));

/// The expected set of tokens in a task definition.
const TASK_ITEM_EXPECTED_SET: TokenSet = TYPE_EXPECTED_SET.union(TokenSet::new(&[
    SyntaxKind::InputKeyword as u8,
    SyntaxKind::CommandKeyword as u8,
    SyntaxKind::OutputKeyword as u8,
    SyntaxKind::RequirementsKeyword as u8,
    SyntaxKind::HintsKeyword as u8,
    SyntaxKind::RuntimeKeyword as u8,
    SyntaxKind::MetaKeyword as u8,
    SyntaxKind::ParameterMetaKeyword as u8,
]));

/// The names of the expected items in a task definition.
const TASK_ITEM_EXPECTED_NAMES: &[&str] = &[
    "input section",
    "command section",
    "output section",
    "runtime section",
    "requirements section",
    "hints section",
    "metadata section",
    "parameter metadata section",
    "private declaration",
];

/// The recovery set for task items.
const TASK_ITEM_RECOVERY_SET: TokenSet =
    TASK_ITEM_EXPECTED_SET.union(TokenSet::new(&[SyntaxKind::CloseBrace as u8]));

/// The expected set of tokens in a workflow definition.
const WORKFLOW_ITEM_EXPECTED_SET: TokenSet = TYPE_EXPECTED_SET.union(TokenSet::new(&[
    SyntaxKind::InputKeyword as u8,
    SyntaxKind::OutputKeyword as u8,
    SyntaxKind::MetaKeyword as u8,
    SyntaxKind::ParameterMetaKeyword as u8,
    SyntaxKind::HintsKeyword as u8,
    SyntaxKind::IfKeyword as u8,
    SyntaxKind::ScatterKeyword as u8,
    SyntaxKind::CallKeyword as u8,
]));

/// The names of the expected items in a workflow definition.
const WORKFLOW_ITEM_EXPECTED_NAMES: &[&str] = &[
    "input section",
    "output section",
    "metadata section",
    "parameter metadata section",
    "hints section",
    "conditional statement",
    "scatter statement",
    "task call statement",
    "private declaration",
];

/// The recovery set for workflow items.
const WORKFLOW_ITEM_RECOVERY_SET: TokenSet =
    WORKFLOW_ITEM_EXPECTED_SET.union(TokenSet::new(&[SyntaxKind::CloseBrace as u8]));

/// The names of the expected statements in a scatter or conditional body.
const WORKFLOW_STATEMENT_EXPECTED_NAMES: &[&str] = &[
    "conditional statement",
    "scatter statement",
    "task call statement",
    "private declaration",
];

/// The recovery set for scatter and conditional statement bodies.
const WORKFLOW_STATEMENT_RECOVERY_SET: TokenSet = TYPE_EXPECTED_SET.union(TokenSet::new(&[
    SyntaxKind::IfKeyword as u8,
    SyntaxKind::CallKeyword as u8,
    SyntaxKind::ScatterKeyword as u8,
    SyntaxKind::CloseBrace as u8,
]));

/// The recovery set for input items in a call statement.
const CALL_INPUT_ITEM_RECOVERY_SET: TokenSet = ANY_IDENT.union(TokenSet::new(&[
    SyntaxKind::Comma as u8,
    SyntaxKind::CloseBrace as u8,
]));

/// The tokens that, following an identifier at the start of a workflow
/// statement, indicate a call missing its `call` keyword.
const MISSING_CALL_FOLLOW_SET: TokenSet = TokenSet::new(&[
    SyntaxKind::OpenBrace as u8,
    SyntaxKind::Dot as u8,
    SyntaxKind::AsKeyword as u8,
    SyntaxKind::AfterKeyword as u8,
    SyntaxKind::CloseBrace as u8,
]);

/// The tokens that open a string.
const STRING_EXPECTED_SET: TokenSet = TokenSet::new(&[
    SyntaxKind::SingleQuote as u8,
    SyntaxKind::DoubleQuote as u8,
    SyntaxKind::OpenHeredoc as u8,
]);

/// The expected set of tokens for a metadata value.
const METADATA_VALUE_EXPECTED_SET: TokenSet = STRING_EXPECTED_SET.union(TokenSet::new(&[
    SyntaxKind::Minus as u8,
    SyntaxKind::Integer as u8,
    SyntaxKind::Float as u8,
    SyntaxKind::TrueKeyword as u8,
    SyntaxKind::FalseKeyword as u8,
    SyntaxKind::NullKeyword as u8,
    SyntaxKind::OpenBrace as u8,
    SyntaxKind::OpenBracket as u8,
]));

/// The names of the expected metadata values.
const METADATA_VALUE_EXPECTED_NAMES: &[&str] = &[
    "number",
    "string",
    "boolean",
    "null",
    "metadata object",
    "metadata array",
];

/// The recovery set for metadata sections.
const METADATA_SECTION_RECOVERY_SET: TokenSet =
    ANY_IDENT.union(TokenSet::new(&[SyntaxKind::CloseBrace as u8]));

/// The recovery set for metadata objects.
const METADATA_OBJECT_RECOVERY_SET: TokenSet = ANY_IDENT.union(TokenSet::new(&[
    SyntaxKind::Comma as u8,
    SyntaxKind::CloseBrace as u8,
]));

/// The recovery set for metadata arrays.
const METADATA_ARRAY_RECOVERY_SET: TokenSet = METADATA_VALUE_EXPECTED_SET.union(TokenSet::new(&[
    SyntaxKind::Comma as u8,
    SyntaxKind::CloseBracket as u8,
]));

/// The recovery set for placeholder expressions.
const PLACEHOLDER_RECOVERY_SET: TokenSet = TokenSet::new(&[SyntaxKind::PlaceholderClose as u8]);

/// The expected set of tokens for an atom of an expression.
const ATOM_EXPECTED_SET: TokenSet = STRING_EXPECTED_SET.union(TokenSet::new(&[
    SyntaxKind::Ident as u8,
    SyntaxKind::Integer as u8,
    SyntaxKind::Float as u8,
    SyntaxKind::TrueKeyword as u8,
    SyntaxKind::FalseKeyword as u8,
    SyntaxKind::NoneKeyword as u8,
    SyntaxKind::ObjectKeyword as u8,
    SyntaxKind::IfKeyword as u8,
    SyntaxKind::OpenBracket as u8,
    SyntaxKind::OpenBrace as u8,
    SyntaxKind::OpenParen as u8,
]));

/// The expected set of tokens for prefix operators.
const PREFIX_OPERATOR_EXPECTED_SET: TokenSet =
    TokenSet::new(&[SyntaxKind::Exclamation as u8, SyntaxKind::Minus as u8]);

/// The expected set of tokens for infix operators.
const INFIX_OPERATOR_EXPECTED_SET: TokenSet = TokenSet::new(&[
    SyntaxKind::LogicalOr as u8,
    SyntaxKind::LogicalAnd as u8,
    SyntaxKind::Plus as u8,
    SyntaxKind::Minus as u8,
    SyntaxKind::Asterisk as u8,
    SyntaxKind::Slash as u8,
    SyntaxKind::Percent as u8,
    SyntaxKind::Exponentiation as u8,
    SyntaxKind::Equal as u8,
    SyntaxKind::NotEqual as u8,
    SyntaxKind::Less as u8,
    SyntaxKind::LessEqual as u8,
    SyntaxKind::Greater as u8,
    SyntaxKind::GreaterEqual as u8,
]);

/// The expected set of tokens for postfix operators.
const POSTFIX_OPERATOR_EXPECTED_SET: TokenSet = TokenSet::new(&[
    SyntaxKind::OpenParen as u8,
    SyntaxKind::OpenBracket as u8,
    SyntaxKind::Dot as u8,
]);

/// The recovery set for expressions.
const EXPR_RECOVERY_SET: TokenSet = ATOM_EXPECTED_SET.union(PREFIX_OPERATOR_EXPECTED_SET);

/// The recovery set for map literal items.
const MAP_RECOVERY_SET: TokenSet =
    TokenSet::new(&[SyntaxKind::Comma as u8, SyntaxKind::CloseBrace as u8]);

/// The recovery set for object and struct literal items.
const LITERAL_OBJECT_RECOVERY_SET: TokenSet =
    TokenSet::new(&[SyntaxKind::Comma as u8, SyntaxKind::CloseBrace as u8]);

/// A set of tokens that may be interpreted as identifiers in keys.
const ANY_IDENT: TokenSet = TokenSet::new(&[
    SyntaxKind::Ident as u8,
    SyntaxKind::ArrayTypeKeyword as u8,
    SyntaxKind::BooleanTypeKeyword as u8,
    SyntaxKind::DirectoryTypeKeyword as u8,
    SyntaxKind::FileTypeKeyword as u8,
    SyntaxKind::FloatTypeKeyword as u8,
    SyntaxKind::IntTypeKeyword as u8,
    SyntaxKind::MapTypeKeyword as u8,
    SyntaxKind::ObjectTypeKeyword as u8,
    SyntaxKind::PairTypeKeyword as u8,
    SyntaxKind::StringTypeKeyword as u8,
    SyntaxKind::AfterKeyword as u8,
    SyntaxKind::AliasKeyword as u8,
    SyntaxKind::AsKeyword as u8,
    SyntaxKind::CallKeyword as u8,
    SyntaxKind::CommandKeyword as u8,
    SyntaxKind::ElseKeyword as u8,
    SyntaxKind::FalseKeyword as u8,
    SyntaxKind::HintsKeyword as u8,
    SyntaxKind::IfKeyword as u8,
    SyntaxKind::InKeyword as u8,
    SyntaxKind::ImportKeyword as u8,
    SyntaxKind::InputKeyword as u8,
    SyntaxKind::MetaKeyword as u8,
    SyntaxKind::NoneKeyword as u8,
    SyntaxKind::NullKeyword as u8,
    SyntaxKind::ObjectKeyword as u8,
    SyntaxKind::OutputKeyword as u8,
    SyntaxKind::ParameterMetaKeyword as u8,
    SyntaxKind::RequirementsKeyword as u8,
    SyntaxKind::RuntimeKeyword as u8,
    SyntaxKind::ScatterKeyword as u8,
    SyntaxKind::StructKeyword as u8,
    SyntaxKind::TaskKeyword as u8,
    SyntaxKind::ThenKeyword as u8,
    SyntaxKind::TrueKeyword as u8,
    SyntaxKind::VersionKeyword as u8,
    SyntaxKind::WorkflowKeyword as u8,
]);

/// The kind of declaration being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclarationKind {
    /// A struct member; never has an expression.
    Unbound,
    /// An input; the expression is optional.
    Input,
    /// An output or private declaration; the expression is required.
    Bound,
}

/// Parses the top-level items of a V1 document.
pub(crate) fn items(parser: &mut Parser<'_>) -> Vec<Slot<DocumentItem>> {
    let mut items = Vec::new();
    let mut workflow: Option<Span> = None;

    parser.push_recovery_set(TOP_RECOVERY_SET);
    while let Some((kind, span)) = parser.peek() {
        let start = parser.token_index();
        let result = match kind {
            SyntaxKind::ImportKeyword => import_statement(parser).map(DocumentItem::Import),
            SyntaxKind::StructKeyword => struct_definition(parser).map(DocumentItem::Struct),
            SyntaxKind::TaskKeyword => task_definition(parser).map(DocumentItem::Task),
            SyntaxKind::WorkflowKeyword => {
                match workflow {
                    Some(first) => parser.diagnostic(
                        Diagnostic::error("a WDL document may only contain a single workflow")
                            .with_label("this workflow is not allowed", span)
                            .with_label("the first workflow is defined here", first),
                    ),
                    None => workflow = Some(span),
                }

                workflow_definition(parser).map(DocumentItem::Workflow)
            }
            _ => Err(expected_one_of(
                TOP_EXPECTED_NAMES,
                Some(kind.describe()),
                span,
            )),
        };

        match result {
            Ok(item) => items.push(Slot::Present(item)),
            Err(e) => {
                let skipped = parser.recover(e);
                items.push(Slot::Missing(skipped));
            }
        }

        if parser.token_index() == start {
            // A token the top-level cannot recover past
            parser.next();
        }
    }

    parser.pop_recovery_set();
    items
}

/// Parses the name of a struct, task, or workflow definition.
///
/// A missing name directly followed by the definition's `{` is reported and
/// parsing of the definition continues.
fn definition_name(parser: &mut Parser<'_>, name: &str) -> Result<Slot<Ident>, Diagnostic> {
    match parser.expect_ident(IDENT, name) {
        Ok(ident) => Ok(Slot::Present(ident)),
        Err(e) if matches!(parser.peek(), Some((SyntaxKind::OpenBrace, _))) => {
            parser.diagnostic(e);
            Ok(Slot::Missing(Span::new(parser.span().start(), 0)))
        }
        Err(e) => Err(e),
    }
}

/// Parses an import statement.
fn import_statement(parser: &mut Parser<'_>) -> Result<ImportStatement, Diagnostic> {
    let start = parser.require(SyntaxKind::ImportKeyword).start();
    let uri = string_literal(parser)?;

    let namespace = if parser.next_if(SyntaxKind::AsKeyword) {
        Some(Slot::Present(
            parser.expect_ident(IDENT, "import namespace")?,
        ))
    } else {
        None
    };

    let mut aliases = Vec::new();
    while parser.next_if(SyntaxKind::AliasKeyword) {
        let source = parser.expect_ident(IDENT, "struct name")?;
        parser.expect(SyntaxKind::AsKeyword)?;
        let target = parser.expect_ident(IDENT, "struct name")?;
        aliases.push(Slot::Present(ImportAlias { source, target }));
    }

    Ok(ImportStatement {
        uri: Slot::Present(uri),
        namespace,
        aliases,
        span: parser.span_from(start),
    })
}

/// Parses a struct definition.
fn struct_definition(parser: &mut Parser<'_>) -> Result<StructDefinition, Diagnostic> {
    let start = parser.require(SyntaxKind::StructKeyword).start();
    let name = definition_name(parser, "struct name")?;
    let items = parser.matching_delimited(
        SyntaxKind::OpenBrace,
        SyntaxKind::CloseBrace,
        None,
        STRUCT_ITEM_RECOVERY_SET,
        struct_item,
    )?;

    Ok(StructDefinition {
        name,
        items,
        span: parser.span_from(start),
    })
}

/// Parses an item in a struct definition.
fn struct_item(parser: &mut Parser<'_>) -> Result<StructItem, Diagnostic> {
    match parser.peek() {
        Some((SyntaxKind::MetaKeyword, _)) => {
            metadata_section(parser, SyntaxKind::MetaKeyword).map(StructItem::Metadata)
        }
        Some((SyntaxKind::ParameterMetaKeyword, _)) => {
            metadata_section(parser, SyntaxKind::ParameterMetaKeyword)
                .map(StructItem::ParameterMetadata)
        }
        _ => declaration(parser, DeclarationKind::Unbound).map(StructItem::Member),
    }
}

/// Parses a task definition.
fn task_definition(parser: &mut Parser<'_>) -> Result<TaskDefinition, Diagnostic> {
    let start = parser.require(SyntaxKind::TaskKeyword).start();
    let name = definition_name(parser, "task name")?;
    let items = parser.matching_delimited(
        SyntaxKind::OpenBrace,
        SyntaxKind::CloseBrace,
        None,
        TASK_ITEM_RECOVERY_SET,
        task_item,
    )?;

    Ok(TaskDefinition {
        name,
        items,
        span: parser.span_from(start),
    })
}

/// Parses an item in a task definition.
fn task_item(parser: &mut Parser<'_>) -> Result<TaskItem, Diagnostic> {
    match parser.peek() {
        Some((SyntaxKind::InputKeyword, _)) => input_section(parser).map(TaskItem::Input),
        Some((SyntaxKind::CommandKeyword, _)) => command_section(parser).map(TaskItem::Command),
        Some((SyntaxKind::OutputKeyword, _)) => output_section(parser).map(TaskItem::Output),
        Some((SyntaxKind::RuntimeKeyword, _)) => {
            runtime_section(parser, SyntaxKind::RuntimeKeyword).map(TaskItem::Runtime)
        }
        Some((SyntaxKind::RequirementsKeyword, _)) => {
            runtime_section(parser, SyntaxKind::RequirementsKeyword).map(TaskItem::Requirements)
        }
        Some((SyntaxKind::HintsKeyword, _)) => {
            runtime_section(parser, SyntaxKind::HintsKeyword).map(TaskItem::Hints)
        }
        Some((SyntaxKind::MetaKeyword, _)) => {
            metadata_section(parser, SyntaxKind::MetaKeyword).map(TaskItem::Metadata)
        }
        Some((SyntaxKind::ParameterMetaKeyword, _)) => {
            metadata_section(parser, SyntaxKind::ParameterMetaKeyword)
                .map(TaskItem::ParameterMetadata)
        }
        Some((kind, _)) if TYPE_EXPECTED_SET.contains(kind.into_raw()) => {
            declaration(parser, DeclarationKind::Bound).map(TaskItem::Declaration)
        }
        _ => {
            let (found, span) = parser.found();
            Err(expected_one_of(TASK_ITEM_EXPECTED_NAMES, found, span))
        }
    }
}

/// Parses a workflow definition.
fn workflow_definition(parser: &mut Parser<'_>) -> Result<WorkflowDefinition, Diagnostic> {
    let start = parser.require(SyntaxKind::WorkflowKeyword).start();
    let name = definition_name(parser, "workflow name")?;
    let items = parser.matching_delimited(
        SyntaxKind::OpenBrace,
        SyntaxKind::CloseBrace,
        None,
        WORKFLOW_ITEM_RECOVERY_SET,
        workflow_item,
    )?;

    Ok(WorkflowDefinition {
        name,
        items,
        span: parser.span_from(start),
    })
}

/// Parses an item in a workflow definition.
fn workflow_item(parser: &mut Parser<'_>) -> Result<WorkflowItem, Diagnostic> {
    match parser.peek() {
        Some((SyntaxKind::InputKeyword, _)) => input_section(parser).map(WorkflowItem::Input),
        Some((SyntaxKind::OutputKeyword, _)) => output_section(parser).map(WorkflowItem::Output),
        Some((SyntaxKind::MetaKeyword, _)) => {
            metadata_section(parser, SyntaxKind::MetaKeyword).map(WorkflowItem::Metadata)
        }
        Some((SyntaxKind::ParameterMetaKeyword, _)) => {
            metadata_section(parser, SyntaxKind::ParameterMetaKeyword)
                .map(WorkflowItem::ParameterMetadata)
        }
        Some((SyntaxKind::HintsKeyword, _)) => {
            runtime_section(parser, SyntaxKind::HintsKeyword).map(WorkflowItem::Hints)
        }
        _ => workflow_statement(parser, WORKFLOW_ITEM_EXPECTED_NAMES).map(WorkflowItem::Statement),
    }
}

/// Parses a statement in a workflow, scatter, or conditional body.
///
/// The given names describe what was expected if no statement is found.
fn workflow_statement(
    parser: &mut Parser<'_>,
    expected: &[&str],
) -> Result<WorkflowStatement, Diagnostic> {
    parser.nested(|parser| statement(parser, expected))
}

/// Parses a statement at the current nesting depth.
fn statement(parser: &mut Parser<'_>, expected: &[&str]) -> Result<WorkflowStatement, Diagnostic> {
    match parser.peek() {
        Some((SyntaxKind::IfKeyword, _)) => {
            conditional_statement(parser).map(WorkflowStatement::Conditional)
        }
        Some((SyntaxKind::ScatterKeyword, _)) => {
            scatter_statement(parser).map(WorkflowStatement::Scatter)
        }
        Some((SyntaxKind::CallKeyword, _)) => {
            let start = parser.require(SyntaxKind::CallKeyword).start();
            call_statement(parser, start).map(WorkflowStatement::Call)
        }
        Some((SyntaxKind::Ident, span)) if is_missing_call(parser) => {
            let name = parser.source(span);
            parser.diagnostic(
                Diagnostic::error(format!("missing `call` keyword before `{name}`"))
                    .with_label("expected `call` keyword before this", span)
                    .with_fix("add the `call` keyword to call the task"),
            );
            call_statement(parser, span.start()).map(WorkflowStatement::Call)
        }
        Some((kind, _)) if TYPE_EXPECTED_SET.contains(kind.into_raw()) => {
            declaration(parser, DeclarationKind::Bound).map(WorkflowStatement::Declaration)
        }
        _ => {
            let (found, span) = parser.found();
            Err(expected_one_of(expected, found, span))
        }
    }
}

/// Determines if the parser is at an identifier that starts a call missing
/// its `call` keyword.
fn is_missing_call(parser: &Parser<'_>) -> bool {
    match parser.peek2() {
        Some(peek) => {
            peek.first.0 == SyntaxKind::Ident
                && MISSING_CALL_FOLLOW_SET.contains(peek.second.0.into_raw())
        }
        None => false,
    }
}

/// Parses an input section.
fn input_section(parser: &mut Parser<'_>) -> Result<InputSection, Diagnostic> {
    let start = parser.require(SyntaxKind::InputKeyword).start();
    let declarations = parser.matching_delimited(
        SyntaxKind::OpenBrace,
        SyntaxKind::CloseBrace,
        None,
        INPUT_ITEM_RECOVERY_SET,
        |parser| declaration(parser, DeclarationKind::Input),
    )?;

    Ok(InputSection {
        declarations,
        span: parser.span_from(start),
    })
}

/// Parses an output section.
fn output_section(parser: &mut Parser<'_>) -> Result<OutputSection, Diagnostic> {
    let start = parser.require(SyntaxKind::OutputKeyword).start();
    let declarations = parser.matching_delimited(
        SyntaxKind::OpenBrace,
        SyntaxKind::CloseBrace,
        None,
        OUTPUT_ITEM_RECOVERY_SET,
        |parser| declaration(parser, DeclarationKind::Bound),
    )?;

    Ok(OutputSection {
        declarations,
        span: parser.span_from(start),
    })
}

/// Parses a declaration.
///
/// An expression that fails to parse is recorded as missing; the parser
/// recovers with the current recovery set.
fn declaration(parser: &mut Parser<'_>, kind: DeclarationKind) -> Result<Declaration, Diagnostic> {
    let ty = ty(parser)?;
    let start = ty.span.start();

    let name = match parser.expect_ident(IDENT, "declaration name") {
        Ok(name) => Slot::Present(name),
        Err(e) if matches!(parser.peek(), Some((SyntaxKind::Assignment, _))) => {
            parser.diagnostic(e);
            Slot::Missing(Span::new(parser.span().start(), 0))
        }
        Err(e) => return Err(e),
    };

    let expr = match kind {
        DeclarationKind::Unbound => None,
        DeclarationKind::Input => {
            if parser.next_if(SyntaxKind::Assignment) {
                Some(expr_slot(parser))
            } else {
                None
            }
        }
        DeclarationKind::Bound => match parser.expect(SyntaxKind::Assignment) {
            Ok(_) => Some(expr_slot(parser)),
            Err(e) => Some(Slot::Missing(parser.recover(e))),
        },
    };

    Ok(Declaration {
        ty,
        name,
        expr,
        span: parser.span_from(start),
    })
}

/// Parses a type.
fn ty(parser: &mut Parser<'_>) -> Result<Type, Diagnostic> {
    parser.nested(type_at_depth)
}

/// Parses a type at the current nesting depth.
fn type_at_depth(parser: &mut Parser<'_>) -> Result<Type, Diagnostic> {
    let (kind, span) = parser.expect_in(TYPE_EXPECTED_SET, &["type"])?;
    let kind = match kind {
        SyntaxKind::BooleanTypeKeyword => TypeKind::Boolean,
        SyntaxKind::IntTypeKeyword => TypeKind::Int,
        SyntaxKind::FloatTypeKeyword => TypeKind::Float,
        SyntaxKind::StringTypeKeyword => TypeKind::String,
        SyntaxKind::FileTypeKeyword => TypeKind::File,
        SyntaxKind::DirectoryTypeKeyword => TypeKind::Directory,
        SyntaxKind::ObjectTypeKeyword => TypeKind::Object,
        SyntaxKind::ArrayTypeKeyword => {
            let element = parser.matching(SyntaxKind::OpenBracket, SyntaxKind::CloseBracket, ty)?;
            let non_empty = parser.next_if(SyntaxKind::Plus);
            TypeKind::Array {
                element: Box::new(Slot::Present(element)),
                non_empty,
            }
        }
        SyntaxKind::MapTypeKeyword => {
            let (key, value) = parser.matching(
                SyntaxKind::OpenBracket,
                SyntaxKind::CloseBracket,
                type_pair,
            )?;
            TypeKind::Map {
                key: Box::new(Slot::Present(key)),
                value: Box::new(Slot::Present(value)),
            }
        }
        SyntaxKind::PairTypeKeyword => {
            let (left, right) = parser.matching(
                SyntaxKind::OpenBracket,
                SyntaxKind::CloseBracket,
                type_pair,
            )?;
            TypeKind::Pair {
                left: Box::new(Slot::Present(left)),
                right: Box::new(Slot::Present(right)),
            }
        }
        _ => TypeKind::Named(parser.source(span).to_string()),
    };

    let optional = parser.next_if(SyntaxKind::QuestionMark);
    Ok(Type {
        kind,
        optional,
        span: parser.span_from(span.start()),
    })
}

/// Parses two comma-separated types.
fn type_pair(parser: &mut Parser<'_>) -> Result<(Type, Type), Diagnostic> {
    let first = ty(parser)?;
    parser.expect(SyntaxKind::Comma)?;
    let second = ty(parser)?;
    Ok((first, second))
}

/// Parses a command section.
fn command_section(parser: &mut Parser<'_>) -> Result<CommandSection, Diagnostic> {
    let start = parser.require(SyntaxKind::CommandKeyword).start();
    let (style, open, close) = match parser.peek() {
        Some((SyntaxKind::OpenBraceCommand, _)) => (
            CommandStyle::Braced,
            SyntaxKind::OpenBraceCommand,
            SyntaxKind::CloseBraceCommand,
        ),
        Some((SyntaxKind::OpenHeredoc, _)) => (
            CommandStyle::Heredoc,
            SyntaxKind::OpenHeredoc,
            SyntaxKind::CloseHeredoc,
        ),
        _ => {
            let (found, span) = parser.found();
            return Err(expected_one_of(&["`{`", "`<<<`"], found, span));
        }
    };

    let open_span = parser.require(open);
    let parts = quasi_literal_parts(parser, close);
    parser.consume_close_token(open, open_span, close);

    Ok(CommandSection {
        style,
        parts,
        span: parser.span_from(start),
    })
}

/// Parses the parts of a string, command, or heredoc up to (but not
/// including) the given close token.
///
/// Adjacent text tokens are merged into a single text part.
fn quasi_literal_parts(parser: &mut Parser<'_>, close: SyntaxKind) -> Vec<StringPart> {
    /// Flushes the pending text span as a text part.
    fn flush(parser: &Parser<'_>, parts: &mut Vec<StringPart>, text: &mut Option<Span>) {
        if let Some(span) = text.take() {
            parts.push(StringPart::Text {
                text: parser.source(span).to_string(),
                span,
            });
        }
    }

    let mut parts = Vec::new();
    let mut text: Option<Span> = None;
    while let Some((kind, span)) = parser.peek() {
        match kind {
            SyntaxKind::Text => {
                parser.next();
                text = Some(text.map(|t| t.cover(span)).unwrap_or(span));
            }
            SyntaxKind::PlaceholderOpen => {
                flush(parser, &mut parts, &mut text);
                parts.push(StringPart::Placeholder(placeholder(parser)));
            }
            _ => break,
        }
    }

    debug_assert!(
        parser.peek().is_none_or(|(kind, _)| kind == close),
        "quasi-literal region should end at its close token"
    );

    flush(parser, &mut parts, &mut text);
    parts
}

/// Parses a placeholder.
///
/// Errors within the placeholder are recovered at the placeholder's close.
fn placeholder(parser: &mut Parser<'_>) -> Placeholder {
    let open = parser.require(SyntaxKind::PlaceholderOpen);
    let options = placeholder_options(parser);

    let expr = match expr(parser) {
        Ok(expr) => Slot::Present(expr),
        Err(e) => Slot::Missing(parser.recover_with_set(e, PLACEHOLDER_RECOVERY_SET)),
    };

    if !parser.next_if(SyntaxKind::PlaceholderClose) {
        let (found, span) = parser.found();
        let e = unmatched(
            "placeholder start",
            open,
            SyntaxKind::PlaceholderClose.describe(),
            found.unwrap_or("end of input"),
            span,
        );
        parser.recover_with_set(e, PLACEHOLDER_RECOVERY_SET);
        parser.next_if(SyntaxKind::PlaceholderClose);
    }

    Placeholder {
        options,
        expr,
        span: parser.span_from(open.start()),
    }
}

/// Parses the options of a placeholder.
fn placeholder_options(parser: &mut Parser<'_>) -> Vec<PlaceholderOption> {
    let mut options = Vec::new();
    while let Some(peek) = parser.peek2() {
        let (kind, span) = peek.first;
        if peek.second.0 != SyntaxKind::Assignment {
            break;
        }

        match kind {
            SyntaxKind::Ident if matches!(parser.source(span), "sep" | "default") => {
                let sep = parser.source(span) == "sep";
                parser.next();
                parser.next();
                let value = placeholder_option_value(parser);
                options.push(if sep {
                    PlaceholderOption::Sep(value)
                } else {
                    PlaceholderOption::Default(value)
                });
            }
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                parser.next();
                parser.next();
                let first = placeholder_option_value(parser);

                let other = if kind == SyntaxKind::TrueKeyword {
                    SyntaxKind::FalseKeyword
                } else {
                    SyntaxKind::TrueKeyword
                };

                let second = match parser
                    .expect(other)
                    .and_then(|_| parser.expect(SyntaxKind::Assignment))
                {
                    Ok(_) => placeholder_option_value(parser),
                    Err(e) => {
                        parser.diagnostic(e);
                        Slot::Missing(Span::new(parser.span().start(), 0))
                    }
                };

                let (when_true, when_false) = if kind == SyntaxKind::TrueKeyword {
                    (first, second)
                } else {
                    (second, first)
                };

                options.push(PlaceholderOption::TrueFalse {
                    when_true,
                    when_false,
                });
            }
            _ => break,
        }
    }

    options
}

/// Parses the string value of a placeholder option.
fn placeholder_option_value(parser: &mut Parser<'_>) -> Slot<StringLiteral> {
    match string_literal(parser) {
        Ok(literal) => Slot::Present(literal),
        Err(e) => {
            parser.diagnostic(e);
            Slot::Missing(Span::new(parser.span().start(), 0))
        }
    }
}

/// Parses a string literal.
fn string_literal(parser: &mut Parser<'_>) -> Result<StringLiteral, Diagnostic> {
    let (open, open_span) = parser.expect_in(STRING_EXPECTED_SET, &["string"])?;
    let close = match open {
        SyntaxKind::OpenHeredoc => SyntaxKind::CloseHeredoc,
        quote => quote,
    };

    let parts = quasi_literal_parts(parser, close);
    parser.consume_close_token(open, open_span, close);

    Ok(StringLiteral {
        parts,
        span: parser.span_from(open_span.start()),
    })
}

/// Parses a `runtime`, `requirements`, or `hints` section.
fn runtime_section(
    parser: &mut Parser<'_>,
    keyword: SyntaxKind,
) -> Result<RuntimeSection, Diagnostic> {
    let start = parser.require(keyword).start();
    let items = parser.matching_delimited(
        SyntaxKind::OpenBrace,
        SyntaxKind::CloseBrace,
        None,
        RUNTIME_ITEM_RECOVERY_SET,
        runtime_item,
    )?;

    Ok(RuntimeSection {
        items,
        span: parser.span_from(start),
    })
}

/// Parses an item in a `runtime`, `requirements`, or `hints` section.
fn runtime_item(parser: &mut Parser<'_>) -> Result<RuntimeItem, Diagnostic> {
    let name = parser.expect_ident(ANY_IDENT, "runtime key")?;
    parser.expect(SyntaxKind::Colon)?;
    let value = expr_slot(parser);
    let start = name.span.start();
    Ok(RuntimeItem {
        name,
        value,
        span: parser.span_from(start),
    })
}

/// Parses a `meta` or `parameter_meta` section.
fn metadata_section(
    parser: &mut Parser<'_>,
    keyword: SyntaxKind,
) -> Result<MetadataSection, Diagnostic> {
    let start = parser.require(keyword).start();
    let items = parser.matching_delimited(
        SyntaxKind::OpenBrace,
        SyntaxKind::CloseBrace,
        None,
        METADATA_SECTION_RECOVERY_SET,
        metadata_item,
    )?;

    Ok(MetadataSection {
        items,
        span: parser.span_from(start),
    })
}

/// Parses a key-value item of a metadata section or object.
fn metadata_item(parser: &mut Parser<'_>) -> Result<MetadataItem, Diagnostic> {
    let name = parser.expect_ident(ANY_IDENT, "metadata key")?;
    parser.expect(SyntaxKind::Colon)?;
    let value = match metadata_value(parser) {
        Ok(value) => Slot::Present(value),
        Err(e) => Slot::Missing(parser.recover(e)),
    };

    let start = name.span.start();
    Ok(MetadataItem {
        name,
        value,
        span: parser.span_from(start),
    })
}

/// Parses a metadata value.
fn metadata_value(parser: &mut Parser<'_>) -> Result<MetadataValue, Diagnostic> {
    parser.nested(metadata_value_at_depth)
}

/// Parses a metadata value at the current nesting depth.
fn metadata_value_at_depth(parser: &mut Parser<'_>) -> Result<MetadataValue, Diagnostic> {
    match parser.peek() {
        Some((SyntaxKind::Minus, _)) => {
            parser.next();
            match parser.peek() {
                Some((SyntaxKind::Integer, span)) => {
                    parser.next();
                    integer(parser, span, true).map(MetadataValue::Integer)
                }
                Some((SyntaxKind::Float, span)) => {
                    parser.next();
                    float(parser, span).map(|f| MetadataValue::Float(-f))
                }
                _ => {
                    let (found, span) = parser.found();
                    Err(expected_found("number", found, span))
                }
            }
        }
        Some((SyntaxKind::Integer, span)) => {
            parser.next();
            integer(parser, span, false).map(MetadataValue::Integer)
        }
        Some((SyntaxKind::Float, span)) => {
            parser.next();
            float(parser, span).map(MetadataValue::Float)
        }
        Some((SyntaxKind::TrueKeyword, _)) => {
            parser.next();
            Ok(MetadataValue::Boolean(true))
        }
        Some((SyntaxKind::FalseKeyword, _)) => {
            parser.next();
            Ok(MetadataValue::Boolean(false))
        }
        Some((SyntaxKind::NullKeyword, _)) => {
            parser.next();
            Ok(MetadataValue::Null)
        }
        Some((kind, _)) if STRING_EXPECTED_SET.contains(kind.into_raw()) => {
            let literal = string_literal(parser)?;
            let text = match (literal.parts.first(), literal.parts.last()) {
                (Some(first), Some(last)) => parser.source(first.span().cover(last.span())),
                _ => "",
            };
            Ok(MetadataValue::String(text.to_string()))
        }
        Some((SyntaxKind::OpenBrace, _)) => parser
            .matching_delimited(
                SyntaxKind::OpenBrace,
                SyntaxKind::CloseBrace,
                Some(SyntaxKind::Comma),
                METADATA_OBJECT_RECOVERY_SET,
                metadata_item,
            )
            .map(MetadataValue::Object),
        Some((SyntaxKind::OpenBracket, _)) => parser
            .matching_delimited(
                SyntaxKind::OpenBracket,
                SyntaxKind::CloseBracket,
                Some(SyntaxKind::Comma),
                METADATA_ARRAY_RECOVERY_SET,
                metadata_value,
            )
            .map(MetadataValue::Array),
        _ => {
            let (found, span) = parser.found();
            Err(expected_one_of(METADATA_VALUE_EXPECTED_NAMES, found, span))
        }
    }
}

/// Parses a conditional statement.
fn conditional_statement(parser: &mut Parser<'_>) -> Result<ConditionalStatement, Diagnostic> {
    let start = parser.require(SyntaxKind::IfKeyword).start();
    let condition = parser.matching(SyntaxKind::OpenParen, SyntaxKind::CloseParen, expr)?;
    let body = statement_body(parser)?;

    Ok(ConditionalStatement {
        condition: Slot::Present(condition),
        body,
        span: parser.span_from(start),
    })
}

/// Parses a scatter statement.
fn scatter_statement(parser: &mut Parser<'_>) -> Result<ScatterStatement, Diagnostic> {
    let start = parser.require(SyntaxKind::ScatterKeyword).start();
    let (variable, expr) =
        parser.matching(SyntaxKind::OpenParen, SyntaxKind::CloseParen, |parser| {
            let variable = parser.expect_ident(IDENT, "scatter variable name")?;
            parser.expect(SyntaxKind::InKeyword)?;
            let expr = expr(parser)?;
            Ok((variable, expr))
        })?;
    let body = statement_body(parser)?;

    Ok(ScatterStatement {
        variable: Slot::Present(variable),
        expr: Slot::Present(expr),
        body,
        span: parser.span_from(start),
    })
}

/// Parses the braced body of a scatter or conditional statement.
fn statement_body(parser: &mut Parser<'_>) -> Result<Vec<Slot<WorkflowStatement>>, Diagnostic> {
    parser.matching_delimited(
        SyntaxKind::OpenBrace,
        SyntaxKind::CloseBrace,
        None,
        WORKFLOW_STATEMENT_RECOVERY_SET,
        |parser| workflow_statement(parser, WORKFLOW_STATEMENT_EXPECTED_NAMES),
    )
}

/// Parses a call statement following its `call` keyword (if present).
fn call_statement(parser: &mut Parser<'_>, start: usize) -> Result<CallStatement, Diagnostic> {
    let target = call_target(parser)?;

    let alias = if parser.next_if(SyntaxKind::AsKeyword) {
        Some(Slot::Present(
            parser.expect_ident(IDENT, "call output name")?,
        ))
    } else {
        None
    };

    let mut after = Vec::new();
    while parser.next_if(SyntaxKind::AfterKeyword) {
        after.push(Slot::Present(parser.expect_ident(IDENT, "task name")?));
    }

    let mut inputs = Vec::new();
    if let Some((SyntaxKind::OpenBrace, _)) = parser.peek() {
        // Given the optional `input:` that we need to parse after the open brace, we
        // unfortunately can't use `Parser::matching_delimited` here
        let open_span = parser.require(SyntaxKind::OpenBrace);

        if let Some(peek) = parser.peek2()
            && peek.first.0 == SyntaxKind::InputKeyword
            && peek.second.0 == SyntaxKind::Colon
        {
            parser.next();
            parser.next();
        }

        inputs = parser.delimited(
            SyntaxKind::CloseBrace,
            Some(SyntaxKind::Comma),
            CALL_INPUT_ITEM_RECOVERY_SET,
            call_input_item,
        );

        parser.consume_close_token(SyntaxKind::OpenBrace, open_span, SyntaxKind::CloseBrace);
    }

    Ok(CallStatement {
        target: Slot::Present(target),
        alias,
        after,
        inputs,
        span: parser.span_from(start),
    })
}

/// Parses a call target (i.e. a qualified name) in a call statement.
fn call_target(parser: &mut Parser<'_>) -> Result<CallTarget, Diagnostic> {
    let first = parser.expect_ident(IDENT, "call target name")?;
    let start = first.span.start();
    let mut names = vec![first];
    while parser.next_if(SyntaxKind::Dot) {
        names.push(parser.expect_ident(IDENT, "call target name")?);
    }

    Ok(CallTarget {
        names,
        span: parser.span_from(start),
    })
}

/// Parses a call input item.
fn call_input_item(parser: &mut Parser<'_>) -> Result<CallInput, Diagnostic> {
    let name = parser.expect_ident(ANY_IDENT, "call input key")?;
    let expr = if parser.next_if(SyntaxKind::Assignment) {
        Some(Slot::Present(expr(parser)?))
    } else {
        None
    };

    let start = name.span.start();
    Ok(CallInput {
        name,
        expr,
        span: parser.span_from(start),
    })
}

/// Parses an expression, recording it as missing upon failure.
///
/// The parser recovers from a failure with the current recovery set.
fn expr_slot(parser: &mut Parser<'_>) -> Slot<Expr> {
    match expr(parser) {
        Ok(expr) => Slot::Present(expr),
        Err(e) => Slot::Missing(parser.recover(e)),
    }
}

/// Parses an expression.
#[inline]
fn expr(parser: &mut Parser<'_>) -> Result<Expr, Diagnostic> {
    expr_with_precedence(parser, 0)
}

/// Parses an expression with the given minimum precedence.
///
/// See https://matklad.github.io/2020/04/13/simple-but-powerful-pratt-parsing.html
///
/// Every operation applied to the left-hand side nests the resulting tree one
/// level deeper.
fn expr_with_precedence(parser: &mut Parser<'_>, min_precedence: u8) -> Result<Expr, Diagnostic> {
    parser.nested(|parser| expr_at_depth(parser, min_precedence))
}

/// Parses an expression at the current nesting depth.
fn expr_at_depth(parser: &mut Parser<'_>, min_precedence: u8) -> Result<Expr, Diagnostic> {
    // First parse an atom or a prefix operation as the left-hand side
    let mut lhs = match parser.peek() {
        Some((kind, _)) if ATOM_EXPECTED_SET.contains(kind.into_raw()) => atom_expr(parser, kind)?,
        Some((kind, span)) if PREFIX_OPERATOR_EXPECTED_SET.contains(kind.into_raw()) => {
            parser.next();
            match min_integer(parser, kind) {
                Some(kind) => Expr {
                    kind,
                    span: parser.span_from(span.start()),
                },
                None => {
                    let (precedence, op) = prefix_precedence(kind);
                    let operand = expr_with_precedence(parser, precedence)?;
                    Expr {
                        kind: ExprKind::Unary {
                            op,
                            operand: Box::new(operand),
                        },
                        span: parser.span_from(span.start()),
                    }
                }
            }
        }
        _ => {
            let (found, span) = parser.found();
            return Err(expected_found("expression", found, span));
        }
    };

    loop {
        // Check for either an infix or postfix operation
        match parser.peek() {
            Some((kind, _)) if INFIX_OPERATOR_EXPECTED_SET.contains(kind.into_raw()) => {
                let (precedence, op) = infix_precedence(kind);
                if precedence < min_precedence {
                    break;
                }

                parser.deepen()?;
                parser.next();

                // All infix operators are left-associative
                let rhs = expr_with_precedence(parser, precedence + 1)?;
                let start = lhs.span.start();
                lhs = Expr {
                    kind: ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span: parser.span_from(start),
                };
            }
            Some((kind, _)) if POSTFIX_OPERATOR_EXPECTED_SET.contains(kind.into_raw()) => {
                if postfix_precedence(kind) < min_precedence {
                    break;
                }

                parser.deepen()?;
                lhs = match kind {
                    SyntaxKind::OpenParen => call_expr(parser, lhs)?,
                    SyntaxKind::OpenBracket => index_expr(parser, lhs)?,
                    _ => access_expr(parser, lhs)?,
                };
            }
            _ => break,
        }
    }

    Ok(lhs)
}

/// Parses a negated integer literal that is only representable when negated
/// (i.e. the minimum 64-bit signed integer).
///
/// Returns `None` without consuming anything for any other operand.
fn min_integer(parser: &mut Parser<'_>, prefix: SyntaxKind) -> Option<ExprKind> {
    if prefix != SyntaxKind::Minus {
        return None;
    }

    let (kind, span) = parser.peek()?;
    if kind != SyntaxKind::Integer || integer_magnitude(parser.source(span)) != Some(1 << 63) {
        return None;
    }

    parser.next();
    Some(ExprKind::Integer(i64::MIN))
}

/// Parses an atomic expression such as a literal.
///
/// Due to the WDL grammar having an ambiguity between parenthesized expressions
/// and pair literals, this function handles the former in addition to pair
/// literals.
fn atom_expr(parser: &mut Parser<'_>, peeked: SyntaxKind) -> Result<Expr, Diagnostic> {
    let start = parser.span().start();
    let kind = match peeked {
        SyntaxKind::NoneKeyword => {
            parser.next();
            ExprKind::None
        }
        SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
            parser.next();
            ExprKind::Boolean(peeked == SyntaxKind::TrueKeyword)
        }
        SyntaxKind::Integer => {
            let span = parser.require(SyntaxKind::Integer);
            ExprKind::Integer(integer(parser, span, false)?)
        }
        SyntaxKind::Float => {
            let span = parser.require(SyntaxKind::Float);
            ExprKind::Float(float(parser, span)?)
        }
        SyntaxKind::SingleQuote | SyntaxKind::DoubleQuote | SyntaxKind::OpenHeredoc => {
            ExprKind::String(string_literal(parser)?)
        }
        SyntaxKind::OpenBracket => ExprKind::Array(parser.matching_delimited(
            SyntaxKind::OpenBracket,
            SyntaxKind::CloseBracket,
            Some(SyntaxKind::Comma),
            EXPR_RECOVERY_SET,
            expr,
        )?),
        SyntaxKind::OpenBrace => ExprKind::Map(parser.matching_delimited(
            SyntaxKind::OpenBrace,
            SyntaxKind::CloseBrace,
            Some(SyntaxKind::Comma),
            MAP_RECOVERY_SET,
            map_entry,
        )?),
        SyntaxKind::OpenParen => return pair_or_paren_expr(parser),
        SyntaxKind::ObjectKeyword => {
            parser.next();
            ExprKind::Object(literal_object_fields(parser)?)
        }
        SyntaxKind::IfKeyword => if_expr(parser)?,
        _ => {
            let span = parser.require(SyntaxKind::Ident);
            let name = parser.source(span).to_string();

            // To disambiguate between a name reference and a struct literal,
            // peek ahead for `{`.
            if let Some((SyntaxKind::OpenBrace, _)) = parser.peek() {
                ExprKind::Struct {
                    name: Ident { name, span },
                    fields: literal_object_fields(parser)?,
                }
            } else {
                ExprKind::Name(name)
            }
        }
    };

    Ok(Expr {
        kind,
        span: parser.span_from(start),
    })
}

/// Parses a single entry in a literal map.
fn map_entry(parser: &mut Parser<'_>) -> Result<MapEntry, Diagnostic> {
    let key = expr(parser)?;
    parser.expect(SyntaxKind::Colon)?;
    let value = expr(parser)?;
    Ok(MapEntry {
        key,
        value: Slot::Present(value),
    })
}

/// Parses the braced fields of an object or struct literal.
fn literal_object_fields(parser: &mut Parser<'_>) -> Result<Vec<Slot<ObjectField>>, Diagnostic> {
    parser.matching_delimited(
        SyntaxKind::OpenBrace,
        SyntaxKind::CloseBrace,
        Some(SyntaxKind::Comma),
        LITERAL_OBJECT_RECOVERY_SET,
        |parser| {
            let name = parser.expect_ident(ANY_IDENT, "member name")?;
            parser.expect(SyntaxKind::Colon)?;
            let value = expr(parser)?;
            Ok(ObjectField {
                name,
                value: Slot::Present(value),
            })
        },
    )
}

/// Parses a pair literal or parenthesized expression.
fn pair_or_paren_expr(parser: &mut Parser<'_>) -> Result<Expr, Diagnostic> {
    let open_span = parser.require(SyntaxKind::OpenParen);
    let first = expr(parser)?;

    if parser.next_if(SyntaxKind::CloseParen) {
        // This was actually a parenthesized expression.
        return Ok(Expr {
            kind: first.kind,
            span: parser.span_from(open_span.start()),
        });
    }

    // At this point, it must be a pair literal
    parser.expect(SyntaxKind::Comma)?;
    let second = expr(parser)?;

    if !parser.next_if(SyntaxKind::CloseParen) {
        let (found, span) = parser.found();
        return Err(unmatched(
            SyntaxKind::OpenParen.describe(),
            open_span,
            SyntaxKind::CloseParen.describe(),
            found.unwrap_or("end of input"),
            span,
        ));
    }

    Ok(Expr {
        kind: ExprKind::Pair(Box::new(first), Box::new(Slot::Present(second))),
        span: parser.span_from(open_span.start()),
    })
}

/// Parses an `if` expression.
fn if_expr(parser: &mut Parser<'_>) -> Result<ExprKind, Diagnostic> {
    parser.require(SyntaxKind::IfKeyword);
    let condition = expr(parser)?;
    parser.expect(SyntaxKind::ThenKeyword)?;
    let then = expr(parser)?;
    parser.expect(SyntaxKind::ElseKeyword)?;
    let otherwise = expr(parser)?;
    Ok(ExprKind::If {
        condition: Box::new(Slot::Present(condition)),
        then: Box::new(Slot::Present(then)),
        otherwise: Box::new(Slot::Present(otherwise)),
    })
}

/// Parses a call expression.
fn call_expr(parser: &mut Parser<'_>, lhs: Expr) -> Result<Expr, Diagnostic> {
    let ExprKind::Name(name) = lhs.kind else {
        return Err(Diagnostic::error("only functions may be called")
            .with_label("this expression is not a function name", lhs.span));
    };

    let arguments = parser.matching_delimited(
        SyntaxKind::OpenParen,
        SyntaxKind::CloseParen,
        Some(SyntaxKind::Comma),
        EXPR_RECOVERY_SET,
        expr,
    )?;

    Ok(Expr {
        kind: ExprKind::Call {
            function: Ident {
                name,
                span: lhs.span,
            },
            arguments,
        },
        span: parser.span_from(lhs.span.start()),
    })
}

/// Parses an index expression.
fn index_expr(parser: &mut Parser<'_>, lhs: Expr) -> Result<Expr, Diagnostic> {
    let index = parser.matching(SyntaxKind::OpenBracket, SyntaxKind::CloseBracket, expr)?;
    let start = lhs.span.start();
    Ok(Expr {
        kind: ExprKind::Index {
            target: Box::new(lhs),
            index: Box::new(Slot::Present(index)),
        },
        span: parser.span_from(start),
    })
}

/// Parses an access expression.
fn access_expr(parser: &mut Parser<'_>, lhs: Expr) -> Result<Expr, Diagnostic> {
    parser.require(SyntaxKind::Dot);
    let member = parser.expect_ident(ANY_IDENT, "member name")?;
    let start = lhs.span.start();
    Ok(Expr {
        kind: ExprKind::Access {
            target: Box::new(lhs),
            member,
        },
        span: parser.span_from(start),
    })
}

/// Parses the magnitude of an integer literal.
///
/// Decimal, octal (`0` prefix), and hexadecimal (`0x` prefix) literals are
/// supported.
fn integer_magnitude(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        u64::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}

/// Converts an integer literal token into a 64-bit signed integer.
fn integer(parser: &Parser<'_>, span: Span, negative: bool) -> Result<i64, Diagnostic> {
    let value = integer_magnitude(parser.source(span)).and_then(|magnitude| {
        if negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        }
    });

    value.ok_or_else(|| {
        Diagnostic::error("literal integer exceeds the range for a 64-bit signed integer")
            .with_label("this literal integer is not in range", span)
    })
}

/// Converts a float literal token into a 64-bit float.
fn float(parser: &Parser<'_>, span: Span) -> Result<f64, Diagnostic> {
    match parser.source(span).parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(
            Diagnostic::error("literal float exceeds the range for a 64-bit float")
                .with_label("this literal float is not in range", span),
        ),
    }
}

/// Determines the precedence of a prefix operator.
///
/// All prefix operators are right-associative.
fn prefix_precedence(kind: SyntaxKind) -> (u8, UnaryOp) {
    match kind {
        SyntaxKind::Exclamation => (8, UnaryOp::Not),
        SyntaxKind::Minus => (8, UnaryOp::Negate),
        _ => panic!("unknown prefix operator token"),
    }
}

/// Determines the precedence of an infix operator.
fn infix_precedence(kind: SyntaxKind) -> (u8, BinaryOp) {
    match kind {
        SyntaxKind::LogicalOr => (1, BinaryOp::Or),
        SyntaxKind::LogicalAnd => (2, BinaryOp::And),
        SyntaxKind::Equal => (3, BinaryOp::Equal),
        SyntaxKind::NotEqual => (3, BinaryOp::NotEqual),
        SyntaxKind::Less => (4, BinaryOp::Less),
        SyntaxKind::LessEqual => (4, BinaryOp::LessEqual),
        SyntaxKind::Greater => (4, BinaryOp::Greater),
        SyntaxKind::GreaterEqual => (4, BinaryOp::GreaterEqual),
        SyntaxKind::Plus => (5, BinaryOp::Add),
        SyntaxKind::Minus => (5, BinaryOp::Subtract),
        SyntaxKind::Asterisk => (6, BinaryOp::Multiply),
        SyntaxKind::Slash => (6, BinaryOp::Divide),
        SyntaxKind::Percent => (6, BinaryOp::Modulo),
        SyntaxKind::Exponentiation => (7, BinaryOp::Exponentiate),
        _ => panic!("unknown infix operator token"),
    }
}

/// Determines the precedence of a postfix operator.
///
/// All postfix operators are left-associative.
fn postfix_precedence(kind: SyntaxKind) -> u8 {
    match kind {
        SyntaxKind::OpenParen => 9,
        SyntaxKind::OpenBracket => 10,
        SyntaxKind::Dot => 11,
        _ => panic!("unknown postfix operator token"),
    }
}
