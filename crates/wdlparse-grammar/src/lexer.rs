//! Module for the lexer implementation.
//!
//! The lexer produces a flat stream of [SyntaxToken]s, including trivia.
//!
//! WDL strings, commands, and heredocs are quasi-literal regions: their
//! interior is emitted as [SyntaxKind::Text] tokens except within placeholders
//! (`~{...}` or `${...}`), whose contents are lexed as regular WDL tokens.
//! Every region opened by the lexer is closed in the token stream; a missing
//! close is synthesized as a zero-width token and reported as a diagnostic.

use std::collections::VecDeque;

use logos::Logos;

use crate::Diagnostic;
use crate::Span;
use crate::diagnostic::Lines;
use crate::diagnostic::Position;

pub mod v1;

/// Represents a set of tokens as a bitset.
///
/// `TokenSet` operates on "raw" forms of tokens (i.e. `u8`) so that sets may
/// be created in const contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenSet(u128);

impl TokenSet {
    /// An empty token set.
    pub const EMPTY: Self = Self(0);

    /// Constructs a token set from a slice of tokens.
    pub const fn new(tokens: &[u8]) -> Self {
        let mut bits = 0u128;
        let mut i = 0;
        while i < tokens.len() {
            bits |= Self::mask(tokens[i]);
            i += 1;
        }
        Self(bits)
    }

    /// Unions two token sets together.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Checks if the token is contained in the set.
    pub const fn contains(&self, token: u8) -> bool {
        self.0 & Self::mask(token) != 0
    }

    /// Gets the count of tokens in the set.
    pub const fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the raw tokens in the set.
    pub fn iter(&self) -> impl Iterator<Item = u8> + use<> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }

            // The trailing zero count of a nonzero `u128` is always below 128
            let token = bits.trailing_zeros() as u8;
            bits ^= bits & bits.overflowing_neg().0;
            Some(token)
        })
    }

    /// Masks the given token to a `u128`.
    const fn mask(token: u8) -> u128 {
        1u128 << (token as usize)
    }
}

/// Represents a token for lexing WDL version statements.
///
/// This exists as a separate token type because WDL versions and
/// identifiers overlap on their regex.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum VersionStatementToken {
    /// Contiguous whitespace.
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// A comment.
    #[regex(r"#[^\r\n]*", allow_greedy = true)]
    Comment,

    /// A WDL version.
    #[regex(r"[a-zA-Z0-9][a-zA-Z0-9.\-]*")]
    Version,
}

/// The kind of a lexed token.
///
/// Every mode-specific token type of the lexer maps into this single kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SyntaxKind {
    /// Contiguous whitespace.
    Whitespace,
    /// A comment.
    Comment,
    /// A literal float.
    Float,
    /// A literal integer.
    Integer,
    /// An identifier.
    Ident,
    /// A version literal following the `version` keyword.
    Version,
    /// A single quote that opens or closes a string.
    SingleQuote,
    /// A double quote that opens or closes a string.
    DoubleQuote,
    /// Literal text of a string, command, or heredoc.
    Text,
    /// The `<<<` symbol.
    OpenHeredoc,
    /// The `>>>` symbol.
    CloseHeredoc,
    /// The `{` that opens a braced command.
    OpenBraceCommand,
    /// The `}` that closes a braced command.
    CloseBraceCommand,
    /// The `~{` or `${` that opens a placeholder.
    PlaceholderOpen,
    /// The `}` that closes a placeholder.
    PlaceholderClose,
    /// The `Array` type keyword.
    ArrayTypeKeyword,
    /// The `Boolean` type keyword.
    BooleanTypeKeyword,
    /// The `Directory` type keyword.
    DirectoryTypeKeyword,
    /// The `File` type keyword.
    FileTypeKeyword,
    /// The `Float` type keyword.
    FloatTypeKeyword,
    /// The `Int` type keyword.
    IntTypeKeyword,
    /// The `Map` type keyword.
    MapTypeKeyword,
    /// The `Object` type keyword.
    ObjectTypeKeyword,
    /// The `Pair` type keyword.
    PairTypeKeyword,
    /// The `String` type keyword.
    StringTypeKeyword,
    /// The `after` keyword.
    AfterKeyword,
    /// The `alias` keyword.
    AliasKeyword,
    /// The `as` keyword.
    AsKeyword,
    /// The `call` keyword.
    CallKeyword,
    /// The `command` keyword.
    CommandKeyword,
    /// The `else` keyword.
    ElseKeyword,
    /// The `false` keyword.
    FalseKeyword,
    /// The `hints` keyword.
    HintsKeyword,
    /// The `if` keyword.
    IfKeyword,
    /// The `in` keyword.
    InKeyword,
    /// The `import` keyword.
    ImportKeyword,
    /// The `input` keyword.
    InputKeyword,
    /// The `meta` keyword.
    MetaKeyword,
    /// The `None` keyword.
    NoneKeyword,
    /// The `null` keyword.
    NullKeyword,
    /// The `object` keyword.
    ObjectKeyword,
    /// The `output` keyword.
    OutputKeyword,
    /// The `parameter_meta` keyword.
    ParameterMetaKeyword,
    /// The `requirements` keyword.
    RequirementsKeyword,
    /// The `runtime` keyword.
    RuntimeKeyword,
    /// The `scatter` keyword.
    ScatterKeyword,
    /// The `struct` keyword.
    StructKeyword,
    /// The `task` keyword.
    TaskKeyword,
    /// The `then` keyword.
    ThenKeyword,
    /// The `true` keyword.
    TrueKeyword,
    /// The `version` keyword.
    VersionKeyword,
    /// The `workflow` keyword.
    WorkflowKeyword,
    /// The `{` symbol.
    OpenBrace,
    /// The `}` symbol.
    CloseBrace,
    /// The `[` symbol.
    OpenBracket,
    /// The `]` symbol.
    CloseBracket,
    /// The `=` symbol.
    Assignment,
    /// The `:` symbol.
    Colon,
    /// The `,` symbol.
    Comma,
    /// The `(` symbol.
    OpenParen,
    /// The `)` symbol.
    CloseParen,
    /// The `?` symbol.
    QuestionMark,
    /// The `!` symbol.
    Exclamation,
    /// The `+` symbol.
    Plus,
    /// The `-` symbol.
    Minus,
    /// The `||` symbol.
    LogicalOr,
    /// The `&&` symbol.
    LogicalAnd,
    /// The `*` symbol.
    Asterisk,
    /// The `**` symbol.
    Exponentiation,
    /// The `/` symbol.
    Slash,
    /// The `%` symbol.
    Percent,
    /// The `==` symbol.
    Equal,
    /// The `!=` symbol.
    NotEqual,
    /// The `<=` symbol.
    LessEqual,
    /// The `>=` symbol.
    GreaterEqual,
    /// The `<` symbol.
    Less,
    /// The `>` symbol.
    Greater,
    /// The `.` symbol.
    Dot,
    /// A character the lexer did not recognize.
    Unknown,

    // WARNING: this must always be the last variant.
    /// The exclusive maximum token value.
    MAX,
}

/// Asserts that SyntaxKind can fit in a TokenSet.
const _: () = assert!(SyntaxKind::MAX as u8 <= 128);

impl SyntaxKind {
    /// Converts the kind into its "raw" representation.
    pub const fn into_raw(self) -> u8 {
        self as u8
    }

    /// Determines if the kind is trivia that should be skipped over by the
    /// parser.
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }

    /// Determines if the kind opens a quasi-literal region or placeholder.
    pub fn is_region_open(self) -> bool {
        matches!(
            self,
            Self::OpenHeredoc | Self::OpenBraceCommand | Self::PlaceholderOpen
        )
    }

    /// Describes the kind for use in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Whitespace => "whitespace",
            Self::Comment => "comment",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Ident => "identifier",
            Self::Version => "version",
            Self::SingleQuote | Self::DoubleQuote => "string",
            Self::Text => "literal text",
            Self::OpenHeredoc => "`<<<`",
            Self::CloseHeredoc => "`>>>`",
            Self::OpenBraceCommand | Self::OpenBrace => "`{`",
            Self::CloseBraceCommand | Self::PlaceholderClose | Self::CloseBrace => "`}`",
            Self::PlaceholderOpen => "placeholder",
            Self::ArrayTypeKeyword => "`Array` keyword",
            Self::BooleanTypeKeyword => "`Boolean` keyword",
            Self::DirectoryTypeKeyword => "`Directory` keyword",
            Self::FileTypeKeyword => "`File` keyword",
            Self::FloatTypeKeyword => "`Float` keyword",
            Self::IntTypeKeyword => "`Int` keyword",
            Self::MapTypeKeyword => "`Map` keyword",
            Self::ObjectTypeKeyword => "`Object` keyword",
            Self::PairTypeKeyword => "`Pair` keyword",
            Self::StringTypeKeyword => "`String` keyword",
            Self::AfterKeyword => "`after` keyword",
            Self::AliasKeyword => "`alias` keyword",
            Self::AsKeyword => "`as` keyword",
            Self::CallKeyword => "`call` keyword",
            Self::CommandKeyword => "`command` keyword",
            Self::ElseKeyword => "`else` keyword",
            Self::FalseKeyword => "`false` keyword",
            Self::HintsKeyword => "`hints` keyword",
            Self::IfKeyword => "`if` keyword",
            Self::InKeyword => "`in` keyword",
            Self::ImportKeyword => "`import` keyword",
            Self::InputKeyword => "`input` keyword",
            Self::MetaKeyword => "`meta` keyword",
            Self::NoneKeyword => "`None` keyword",
            Self::NullKeyword => "`null` keyword",
            Self::ObjectKeyword => "`object` keyword",
            Self::OutputKeyword => "`output` keyword",
            Self::ParameterMetaKeyword => "`parameter_meta` keyword",
            Self::RequirementsKeyword => "`requirements` keyword",
            Self::RuntimeKeyword => "`runtime` keyword",
            Self::ScatterKeyword => "`scatter` keyword",
            Self::StructKeyword => "`struct` keyword",
            Self::TaskKeyword => "`task` keyword",
            Self::ThenKeyword => "`then` keyword",
            Self::TrueKeyword => "`true` keyword",
            Self::VersionKeyword => "`version` keyword",
            Self::WorkflowKeyword => "`workflow` keyword",
            Self::OpenBracket => "`[`",
            Self::CloseBracket => "`]`",
            Self::Assignment => "`=`",
            Self::Colon => "`:`",
            Self::Comma => "`,`",
            Self::OpenParen => "`(`",
            Self::CloseParen => "`)`",
            Self::QuestionMark => "`?`",
            Self::Exclamation => "`!`",
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::LogicalOr => "`||`",
            Self::LogicalAnd => "`&&`",
            Self::Asterisk => "`*`",
            Self::Exponentiation => "`**`",
            Self::Slash => "`/`",
            Self::Percent => "`%`",
            Self::Equal => "`==`",
            Self::NotEqual => "`!=`",
            Self::LessEqual => "`<=`",
            Self::GreaterEqual => "`>=`",
            Self::Less => "`<`",
            Self::Greater => "`>`",
            Self::Dot => "`.`",
            Self::Unknown => "unknown token",
            Self::MAX => "end of input",
        }
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxToken<'a> {
    /// The kind of the token.
    pub kind: SyntaxKind,
    /// The byte span of the token.
    pub span: Span,
    /// The source text of the token.
    ///
    /// Synthesized tokens have empty text.
    pub text: &'a str,
    /// The start position of the token.
    pub start: Position,
    /// The end position of the token.
    pub end: Position,
}

/// The quasi-literal regions and placeholders the lexer can be within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// A single-quoted string.
    SQString,
    /// A double-quoted string.
    DQString,
    /// A heredoc.
    Heredoc,
    /// A braced command.
    BraceCommand,
    /// A placeholder with the given count of unclosed interior braces.
    Placeholder(usize),
}

impl Mode {
    /// Gets the token kind that closes the mode.
    fn close_kind(self) -> SyntaxKind {
        match self {
            Self::SQString => SyntaxKind::SingleQuote,
            Self::DQString => SyntaxKind::DoubleQuote,
            Self::Heredoc => SyntaxKind::CloseHeredoc,
            Self::BraceCommand => SyntaxKind::CloseBraceCommand,
            Self::Placeholder(_) => SyntaxKind::PlaceholderClose,
        }
    }

    /// Creates the diagnostic for a mode that was never closed.
    fn unterminated(self, open: Span) -> Diagnostic {
        match self {
            Self::SQString | Self::DQString => unterminated_string(open),
            Self::Heredoc => unterminated_heredoc(open),
            Self::BraceCommand => unterminated_braced_command(open),
            Self::Placeholder(_) => unterminated_placeholder(open),
        }
    }
}

/// Creates an "unterminated string" diagnostic error.
fn unterminated_string(span: Span) -> Diagnostic {
    Diagnostic::error("an unterminated string was encountered")
        .with_label("this quote is not matched", span)
}

/// Creates an "unterminated heredoc" diagnostic error.
fn unterminated_heredoc(span: Span) -> Diagnostic {
    Diagnostic::error("an unterminated heredoc was encountered")
        .with_label("this `<<<` is not matched", span)
}

/// Creates an "unterminated braced command" diagnostic error.
fn unterminated_braced_command(span: Span) -> Diagnostic {
    Diagnostic::error("an unterminated braced command was encountered")
        .with_label("this `{` is not matched", span)
}

/// Creates an "unterminated placeholder" diagnostic error.
fn unterminated_placeholder(span: Span) -> Diagnostic {
    Diagnostic::error("an unterminated placeholder was encountered")
        .with_label("this placeholder is not closed", span)
        .with_fix("add a `}` to close the placeholder")
}

/// Creates an "unknown token" diagnostic error.
fn unknown_token(span: Span, text: &str) -> Diagnostic {
    let label = match text {
        "&" => "did you mean to use `&&` here?",
        "|" => "did you mean to use `||` here?",
        _ => "this is not a supported WDL token",
    };

    Diagnostic::error("an unknown token was encountered").with_label(label, span)
}

/// Implements a WDL lexer.
///
/// A lexer produces a stream of tokens from a WDL source string. The lexer
/// may be cloned to restart from its current position.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    /// The source being lexed.
    source: &'a str,
    /// The current byte offset into the source.
    offset: usize,
    /// The line map used to resolve token positions.
    lines: Lines,
    /// The stack of open regions with the span of the token that opened each.
    modes: Vec<(Mode, Span)>,
    /// The number of unclosed braces outside of any region.
    depth: usize,
    /// Whether the previous significant token was the `command` keyword.
    after_command: bool,
    /// Whether the next significant token should be lexed as a version.
    expect_version: bool,
    /// Tokens that were produced ahead of the current offset.
    pending: VecDeque<SyntaxToken<'a>>,
    /// The lexical diagnostics encountered so far.
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source string.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            lines: Lines::new(source),
            modes: Vec::new(),
            depth: 0,
            after_command: false,
            expect_version: false,
            pending: VecDeque::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Gets the source string of the given span.
    pub fn source(&self, span: Span) -> &'a str {
        &self.source[span.start()..span.end()]
    }

    /// Gets the lexical diagnostics encountered so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Lexes the remainder of the source, returning the tokens and the
    /// lexical diagnostics.
    pub fn finish(mut self) -> (Vec<SyntaxToken<'a>>, Vec<Diagnostic>) {
        let tokens = self.by_ref().collect();
        (tokens, self.diagnostics)
    }

    /// Creates a token of the given kind at the given span.
    fn token(&self, kind: SyntaxKind, span: Span) -> SyntaxToken<'a> {
        SyntaxToken {
            kind,
            span,
            text: self.source(span),
            start: self.lines.position(span.start()),
            end: self.lines.position(span.end()),
        }
    }

    /// Runs a mode-specific logos lexer for a single token at the current
    /// offset.
    fn lex_one<T>(&self) -> Option<(Result<T, ()>, Span)>
    where
        T: Logos<'a, Source = str, Error = (), Extras = ()>,
    {
        let mut lexer = T::lexer(self.source);
        lexer.bump(self.offset);
        let result = lexer.next()?;
        let mut span: Span = lexer.span().into();
        if span.is_empty() {
            // Always make progress past an unrecognized character
            let len = self.source[self.offset..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
            span = Span::new(self.offset, len);
        }

        Some((result, span))
    }

    /// Advances past the given span and produces a token for it.
    fn advance(&mut self, kind: SyntaxKind, span: Span) -> SyntaxToken<'a> {
        self.offset = span.end();
        if !kind.is_trivia() {
            self.after_command = kind == SyntaxKind::CommandKeyword;
        }

        self.token(kind, span)
    }

    /// Closes the innermost region with a zero-width token, reporting it as
    /// unterminated.
    fn close_unterminated(&mut self) -> Option<SyntaxToken<'a>> {
        let (mode, open) = self.modes.pop()?;
        self.diagnostics.push(mode.unterminated(open));
        Some(self.token(mode.close_kind(), Span::new(self.offset, 0)))
    }

    /// Produces the next token when outside of quasi-literal regions or
    /// within a placeholder.
    fn next_wdl(&mut self) -> Option<SyntaxToken<'a>> {
        if self.expect_version {
            match self.lex_one::<VersionStatementToken>() {
                Some((Ok(VersionStatementToken::Whitespace), span)) => {
                    return Some(self.advance(SyntaxKind::Whitespace, span));
                }
                Some((Ok(VersionStatementToken::Comment), span)) => {
                    return Some(self.advance(SyntaxKind::Comment, span));
                }
                Some((Ok(VersionStatementToken::Version), span)) => {
                    self.expect_version = false;
                    return Some(self.advance(SyntaxKind::Version, span));
                }
                _ => self.expect_version = false,
            }
        }

        let (result, span) = self.lex_one::<v1::Token>()?;
        let token = match result {
            Ok(token) => token,
            Err(()) => {
                let text = self.source(span);
                self.diagnostics.push(unknown_token(span, text));
                return Some(self.advance(SyntaxKind::Unknown, span));
            }
        };

        let placeholder = match self.modes.last() {
            Some((Mode::Placeholder(depth), _)) => Some(*depth),
            _ => None,
        };

        let kind = match token {
            v1::Token::SingleQuote => {
                self.modes.push((Mode::SQString, span));
                SyntaxKind::SingleQuote
            }
            v1::Token::DoubleQuote => {
                self.modes.push((Mode::DQString, span));
                SyntaxKind::DoubleQuote
            }
            v1::Token::OpenHeredoc => {
                self.modes.push((Mode::Heredoc, span));
                SyntaxKind::OpenHeredoc
            }
            v1::Token::OpenBrace if self.after_command => {
                self.modes.push((Mode::BraceCommand, span));
                SyntaxKind::OpenBraceCommand
            }
            v1::Token::OpenBrace => {
                match self.modes.last_mut() {
                    Some((Mode::Placeholder(depth), _)) => *depth += 1,
                    _ => self.depth += 1,
                }
                SyntaxKind::OpenBrace
            }
            v1::Token::CloseBrace => match self.modes.last_mut() {
                Some((Mode::Placeholder(0), _)) => {
                    self.modes.pop();
                    SyntaxKind::PlaceholderClose
                }
                Some((Mode::Placeholder(depth), _)) => {
                    *depth -= 1;
                    SyntaxKind::CloseBrace
                }
                _ => {
                    self.depth = self.depth.saturating_sub(1);
                    SyntaxKind::CloseBrace
                }
            },
            v1::Token::CloseHeredoc if placeholder.is_some() && self.in_heredoc() => {
                // The placeholder was left open; close every region up to and
                // including the heredoc being ended
                while let Some((mode, _)) = self.modes.last().copied() {
                    if mode == Mode::Heredoc {
                        break;
                    }

                    if let Some(token) = self.close_unterminated() {
                        self.pending.push_back(token);
                    }
                }

                self.modes.pop();
                let token = self.advance(SyntaxKind::CloseHeredoc, span);
                self.pending.push_back(token);
                return self.pending.pop_front();
            }
            v1::Token::Whitespace
                if placeholder.is_some()
                    && self.in_string()
                    && self.source(span).contains('\n') =>
            {
                // A placeholder within a string cannot span lines; close the
                // placeholder and the string before the line break
                while let Some((mode, _)) = self.modes.last().copied() {
                    let string = matches!(mode, Mode::SQString | Mode::DQString);
                    if let Some(token) = self.close_unterminated() {
                        self.pending.push_back(token);
                    }

                    if string {
                        break;
                    }
                }

                let token = self.advance(SyntaxKind::Whitespace, span);
                self.pending.push_back(token);
                return self.pending.pop_front();
            }
            v1::Token::VersionKeyword if self.modes.is_empty() && self.depth == 0 => {
                self.expect_version = true;
                SyntaxKind::VersionKeyword
            }
            token => token.into_syntax(),
        };

        Some(self.advance(kind, span))
    }

    /// Determines if the lexer is within a heredoc.
    fn in_heredoc(&self) -> bool {
        self.modes.iter().any(|(m, _)| *m == Mode::Heredoc)
    }

    /// Determines if the innermost quasi-literal region is a string.
    fn in_string(&self) -> bool {
        self.modes
            .iter()
            .rev()
            .find(|(m, _)| !matches!(m, Mode::Placeholder(_)))
            .map(|(m, _)| matches!(m, Mode::SQString | Mode::DQString))
            .unwrap_or(false)
    }

    /// Produces the next token within a string.
    fn next_string(&mut self, double: bool) -> Option<SyntaxToken<'a>> {
        let (close, newline, placeholder, span) = if double {
            let (result, span) = self.lex_one::<v1::DQStringToken>()?;
            (
                result == Ok(v1::DQStringToken::End),
                result == Ok(v1::DQStringToken::Newline),
                result == Ok(v1::DQStringToken::PlaceholderStart),
                span,
            )
        } else {
            let (result, span) = self.lex_one::<v1::SQStringToken>()?;
            (
                result == Ok(v1::SQStringToken::End),
                result == Ok(v1::SQStringToken::Newline),
                result == Ok(v1::SQStringToken::PlaceholderStart),
                span,
            )
        };

        if newline {
            // Leave the line break to be lexed by the enclosing mode
            return self.close_unterminated();
        }

        if close {
            self.modes.pop();
            let kind = if double {
                SyntaxKind::DoubleQuote
            } else {
                SyntaxKind::SingleQuote
            };
            return Some(self.advance(kind, span));
        }

        if placeholder {
            self.modes.push((Mode::Placeholder(0), span));
            return Some(self.advance(SyntaxKind::PlaceholderOpen, span));
        }

        Some(self.advance(SyntaxKind::Text, span))
    }

    /// Produces the next token within a heredoc.
    fn next_heredoc(&mut self) -> Option<SyntaxToken<'a>> {
        let (result, span) = self.lex_one::<v1::HeredocToken>()?;
        match result {
            Ok(v1::HeredocToken::End) => {
                self.modes.pop();
                Some(self.advance(SyntaxKind::CloseHeredoc, span))
            }
            Ok(v1::HeredocToken::PlaceholderStart) => {
                self.modes.push((Mode::Placeholder(0), span));
                Some(self.advance(SyntaxKind::PlaceholderOpen, span))
            }
            _ => Some(self.advance(SyntaxKind::Text, span)),
        }
    }

    /// Produces the next token within a braced command.
    fn next_brace_command(&mut self) -> Option<SyntaxToken<'a>> {
        let (result, span) = self.lex_one::<v1::BraceCommandToken>()?;
        match result {
            Ok(v1::BraceCommandToken::End) => {
                self.modes.pop();
                Some(self.advance(SyntaxKind::CloseBraceCommand, span))
            }
            Ok(v1::BraceCommandToken::PlaceholderStart) => {
                self.modes.push((Mode::Placeholder(0), span));
                Some(self.advance(SyntaxKind::PlaceholderOpen, span))
            }
            _ => Some(self.advance(SyntaxKind::Text, span)),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = SyntaxToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.pop_front() {
            return Some(token);
        }

        if self.offset >= self.source.len() {
            // Close any region left open at the end of the input
            return self.close_unterminated();
        }

        let token = match self.modes.last().map(|(m, _)| *m) {
            None | Some(Mode::Placeholder(_)) => self.next_wdl(),
            Some(Mode::SQString) => self.next_string(false),
            Some(Mode::DQString) => self.next_string(true),
            Some(Mode::Heredoc) => self.next_heredoc(),
            Some(Mode::BraceCommand) => self.next_brace_command(),
        };

        // A mode lexer only fails to produce a token at the end of input
        token.or_else(|| self.close_unterminated())
    }
}

/// Lexes the given source, returning every token (including trivia) and the
/// lexical diagnostics.
pub fn lex(source: &str) -> (Vec<SyntaxToken<'_>>, Vec<Diagnostic>) {
    Lexer::new(source).finish()
}
