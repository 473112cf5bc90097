//! Module for the parser implementation.
//!
//! The parser is a recursive descent parser over the non-trivia tokens
//! produced by the [Lexer]. It maintains a stack of recovery token sets that
//! the grammar functions use to resynchronize after an error.
//!
//! Quasi-literal regions (strings, commands, and placeholders) are always
//! balanced in the token stream, so recovery skips a region as a unit and
//! never resynchronizes past the close of an enclosing region.

use std::fmt;

use crate::Diagnostic;
use crate::Span;
use crate::lexer::Lexer;
use crate::lexer::SyntaxKind;
use crate::lexer::SyntaxToken;
use crate::lexer::TokenSet;
use crate::tree::Ident;
use crate::tree::Slot;

/// The maximum nesting depth of expressions, types, workflow statements, and
/// metadata values.
///
/// The depth also bounds the depth of the tree produced by the parser.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Utility type for displaying "expected" items in a parser expectation
/// diagnostic.
struct Expected<'a> {
    /// The set of expected items.
    items: &'a [&'a str],
}

impl<'a> Expected<'a> {
    /// Constructs a new `Expected`.
    fn new(items: &'a [&'a str]) -> Self {
        Self { items }
    }
}

impl fmt::Display for Expected<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.items.len();
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                if count == 2 {
                    write!(f, " or ")?;
                } else if i == count - 1 {
                    write!(f, ", or ")?;
                } else {
                    write!(f, ", ")?;
                }
            }

            write!(f, "{item}")?;
        }

        Ok(())
    }
}

/// Creates an "expected, but found" diagnostic error.
pub(crate) fn expected_found(expected: &str, found: Option<&str>, span: Span) -> Diagnostic {
    let found = found.unwrap_or("end of input");
    Diagnostic::error(format!("expected {expected}, but found {found}"))
        .with_label(format!("unexpected {found}"), span)
}

/// Creates an "expected one of, but found" diagnostic error.
pub(crate) fn expected_one_of(expected: &[&str], found: Option<&str>, span: Span) -> Diagnostic {
    let found = found.unwrap_or("end of input");
    Diagnostic::error(format!(
        "expected {expected}, but found {found}",
        expected = Expected::new(expected)
    ))
    .with_label(format!("unexpected {found}"), span)
}

/// Creates an "unmatched token" diagnostic error.
pub(crate) fn unmatched(
    open: &str,
    open_span: Span,
    close: &str,
    found: &str,
    span: Span,
) -> Diagnostic {
    expected_found(close, Some(found), span)
        .with_label(format!("this {open} is not matched"), open_span)
}

/// Represents the result of a `peek2` operation.
///
/// See [Parser::peek2].
#[derive(Debug, Copy, Clone)]
pub struct Peek2 {
    /// The first peeked token.
    pub first: (SyntaxKind, Span),
    /// The second peeked token.
    pub second: (SyntaxKind, Span),
}

/// Implements a WDL parser.
#[derive(Debug)]
pub struct Parser<'a> {
    /// The source being parsed.
    source: &'a str,
    /// The significant (non-trivia) tokens of the source.
    tokens: Vec<SyntaxToken<'a>>,
    /// For each token, the index of the token that matches it as the open or
    /// close of a quasi-literal region or placeholder.
    matches: Vec<Option<usize>>,
    /// The index of the next token.
    pos: usize,
    /// The recovery token set stack.
    recovery: Vec<TokenSet>,
    /// The diagnostics encountered so far.
    diagnostics: Vec<Diagnostic>,
    /// The current nesting depth.
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser for the given source.
    ///
    /// The source is lexed in full; lexical diagnostics are the first
    /// diagnostics of the parse.
    pub fn new(source: &'a str) -> Self {
        let (tokens, diagnostics) = Lexer::new(source).finish();

        // Unknown tokens were already reported by the lexer and are skipped
        // like trivia
        let tokens: Vec<_> = tokens
            .into_iter()
            .filter(|t| !t.kind.is_trivia() && t.kind != SyntaxKind::Unknown)
            .collect();
        let matches = Self::match_regions(&tokens);

        Self {
            source,
            tokens,
            matches,
            pos: 0,
            recovery: Default::default(),
            diagnostics,
            depth: 0,
        }
    }

    /// Pairs the open and close tokens of every region.
    fn match_regions(tokens: &[SyntaxToken<'_>]) -> Vec<Option<usize>> {
        let mut matches = vec![None; tokens.len()];
        let mut stack: Vec<(SyntaxKind, usize)> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            let open = match token.kind {
                SyntaxKind::SingleQuote | SyntaxKind::DoubleQuote => {
                    if !matches!(stack.last(), Some((kind, _)) if *kind == token.kind) {
                        stack.push((token.kind, i));
                        continue;
                    }

                    token.kind
                }
                SyntaxKind::CloseHeredoc => SyntaxKind::OpenHeredoc,
                SyntaxKind::CloseBraceCommand => SyntaxKind::OpenBraceCommand,
                SyntaxKind::PlaceholderClose => SyntaxKind::PlaceholderOpen,
                kind if kind.is_region_open() => {
                    stack.push((kind, i));
                    continue;
                }
                _ => continue,
            };

            if let Some((kind, start)) = stack.last().copied()
                && kind == open
            {
                stack.pop();
                matches[start] = Some(i);
                matches[i] = Some(start);
            }
        }

        matches
    }

    /// Gets the source being parsed at the given span.
    pub fn source(&self, span: Span) -> &'a str {
        self.source.get(span.start()..span.end()).unwrap_or_default()
    }

    /// Gets the length of the source being parsed.
    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    /// Gets the span of the next token, or an empty span at the end of the
    /// input.
    pub fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .unwrap_or_else(|| Span::new(self.source.len(), 0))
    }

    /// Gets the end offset of the last consumed token.
    pub fn last_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end())
            .unwrap_or(0)
    }

    /// Gets the span from the given start offset to the end of the last
    /// consumed token.
    pub fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.last_end().saturating_sub(start))
    }

    /// Gets the index of the next token.
    ///
    /// This is used to detect whether parsing made progress.
    pub fn token_index(&self) -> usize {
        self.pos
    }

    /// Peeks at the next token without consuming it.
    pub fn peek(&self) -> Option<(SyntaxKind, Span)> {
        self.tokens.get(self.pos).map(|t| (t.kind, t.span))
    }

    /// Peeks at the next and next-next tokens without consuming either token.
    pub fn peek2(&self) -> Option<Peek2> {
        let first = self.peek()?;
        let second = self.tokens.get(self.pos + 1)?;
        Some(Peek2 {
            first,
            second: (second.kind, second.span),
        })
    }

    /// Describes the next token for use in a diagnostic.
    ///
    /// Returns `None` for the description at the end of the input.
    pub fn found(&self) -> (Option<&'static str>, Span) {
        match self.peek() {
            Some((kind, span)) => (Some(kind.describe()), span),
            None => (None, self.span()),
        }
    }

    /// Consumes the next token, returning it in full.
    pub fn next_token(&mut self) -> Option<SyntaxToken<'a>> {
        let token = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(token)
    }

    /// Consumes the next token only if it matches the given token.
    ///
    /// Returns `true` if the token was consumed, `false` if otherwise.
    pub fn next_if(&mut self, kind: SyntaxKind) -> bool {
        match self.peek() {
            Some((k, _)) if k == kind => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Requires that the current token is the given token.
    ///
    /// # Panics
    ///
    /// Panics if the token is not the given token.
    pub fn require(&mut self, kind: SyntaxKind) -> Span {
        match self.next() {
            Some((k, span)) if k == kind => span,
            _ => panic!(
                "parser not at required token {kind}",
                kind = kind.describe()
            ),
        }
    }

    /// Expects the next token to be the given token.
    ///
    /// Returns an error if the token is not the given token.
    pub fn expect(&mut self, kind: SyntaxKind) -> Result<Span, Diagnostic> {
        self.expect_with_name(kind, kind.describe())
    }

    /// Expects the next token to be the given token, but uses the provided
    /// name in the error.
    ///
    /// Returns an error if the token is not the given token.
    pub fn expect_with_name(&mut self, kind: SyntaxKind, name: &str) -> Result<Span, Diagnostic> {
        match self.peek() {
            Some((k, span)) if k == kind => {
                self.pos += 1;
                Ok(span)
            }
            _ => {
                let (found, span) = self.found();
                Err(expected_found(name, found, span))
            }
        }
    }

    /// Expects the next token to be in the given token set.
    ///
    /// Returns an error if the token is not in the given set.
    pub fn expect_in(
        &mut self,
        tokens: TokenSet,
        expected: &[&str],
    ) -> Result<(SyntaxKind, Span), Diagnostic> {
        match self.peek() {
            Some((k, span)) if tokens.contains(k.into_raw()) => {
                self.pos += 1;
                Ok((k, span))
            }
            _ => {
                let (found, span) = self.found();
                Err(expected_one_of(expected, found, span))
            }
        }
    }

    /// Expects the next token to be in the given token set and returns it as
    /// an identifier.
    ///
    /// The given name describes the identifier in the error.
    pub fn expect_ident(&mut self, tokens: TokenSet, name: &str) -> Result<Ident, Diagnostic> {
        match self.tokens.get(self.pos) {
            Some(t) if tokens.contains(t.kind.into_raw()) => {
                self.pos += 1;
                Ok(Ident {
                    name: t.text.to_string(),
                    span: t.span,
                })
            }
            _ => {
                let (found, span) = self.found();
                Err(expected_found(name, found, span))
            }
        }
    }

    /// Parses a matching token pair that surrounds an item.
    ///
    /// This method parses the open token, calls the callback to parse the
    /// item, and then parses the close token.
    pub fn matching<T, F>(&mut self, open: SyntaxKind, close: SyntaxKind, cb: F) -> Result<T, Diagnostic>
    where
        F: FnOnce(&mut Self) -> Result<T, Diagnostic>,
    {
        let open_span = self.expect(open)?;
        let item = cb(self)?;

        match self.peek() {
            Some((k, _)) if k == close => {
                self.pos += 1;
                Ok(item)
            }
            _ => {
                let (found, span) = self.found();
                Err(unmatched(
                    open.describe(),
                    open_span,
                    close.describe(),
                    found.unwrap_or("end of input"),
                    span,
                ))
            }
        }
    }

    /// Parses a matching token pair that surrounds a delimited list of items.
    ///
    /// This method parses the open token, calls the callback for each
    /// delimited item, and then parses the close token.
    ///
    /// The provided recovery token set is used to recover within the delimited
    /// item list.
    pub fn matching_delimited<T, F>(
        &mut self,
        open: SyntaxKind,
        close: SyntaxKind,
        delimiter: Option<SyntaxKind>,
        recovery: TokenSet,
        cb: F,
    ) -> Result<Vec<Slot<T>>, Diagnostic>
    where
        F: FnMut(&mut Self) -> Result<T, Diagnostic>,
    {
        let open_span = self.expect(open)?;
        let items = self.delimited(close, delimiter, recovery, cb);
        self.consume_close_token(open, open_span, close);
        Ok(items)
    }

    /// Consumes a close token if it is the next token to be parsed.
    ///
    /// Otherwise, emits an "unmatched" diagnostic; the close is treated as
    /// present at the current position.
    pub fn consume_close_token(&mut self, open: SyntaxKind, open_span: Span, close: SyntaxKind) {
        if self.next_if(close) {
            return;
        }

        let (found, span) = self.found();
        self.diagnostic(unmatched(
            open.describe(),
            open_span,
            close.describe(),
            found.unwrap_or("end of input"),
            span,
        ));
    }

    /// Parses a delimited list of items until the given token.
    ///
    /// The provided recovery token set is used to recover within the
    /// delimited item list. An item that fails to parse is recorded as
    /// [Slot::Missing] with the span of the source skipped during recovery.
    ///
    /// The `until` token is not consumed.
    pub fn delimited<T, F>(
        &mut self,
        until: SyntaxKind,
        delimiter: Option<SyntaxKind>,
        recovery: TokenSet,
        mut cb: F,
    ) -> Vec<Slot<T>>
    where
        F: FnMut(&mut Self) -> Result<T, Diagnostic>,
    {
        let recovery = if let Some(delimiter) = delimiter {
            recovery.union(TokenSet::new(&[until.into_raw(), delimiter.into_raw()]))
        } else {
            recovery.union(TokenSet::new(&[until.into_raw()]))
        };

        let parent = self.recovery.last().copied();
        self.recovery.push(recovery);

        let mut items = Vec::new();
        let mut next = self.peek();
        while let Some((kind, _)) = next {
            if kind == until {
                break;
            }

            let start = self.pos;
            let diagnostics = self.diagnostics.len();
            match cb(self) {
                Ok(item) => items.push(Slot::Present(item)),
                Err(e) => {
                    // Determine if the token that started the item is recoverable in the
                    // parent recovery set; if so, restart there and let the parent handle it
                    if !recovery.contains(kind.into_raw())
                        && let Some(parent) = &parent
                        && parent.contains(kind.into_raw())
                    {
                        self.pos = start;
                        self.diagnostics.truncate(diagnostics);
                        break;
                    }

                    let skipped = self.recover(e);
                    items.push(Slot::Missing(skipped));

                    // Without progress the list can only continue at a delimiter
                    if self.pos == start
                        && (delimiter.is_none() || self.peek().map(|(k, _)| k) != delimiter)
                    {
                        break;
                    }
                }
            }

            next = self.peek();

            if let Some(delimiter) = delimiter
                && let Some((kind, _)) = next
            {
                if kind == until {
                    break;
                }

                if let Err(e) = self.expect(delimiter) {
                    // Attach a label to the diagnostic hinting at where we expected the
                    // delimiter to be
                    let end = self.last_end();
                    let e = if end > 0 {
                        e.with_label(
                            format!(
                                "consider adding a {desc} after this",
                                desc = delimiter.describe()
                            ),
                            Span::new(end - 1, 1),
                        )
                    } else {
                        e
                    };

                    self.recover(e);
                    self.next_if(delimiter);
                    if self.is_region_close(self.pos) {
                        break;
                    }
                }

                next = self.peek();
            }
        }

        self.recovery.pop();
        items
    }

    /// Parses a nested construct one level deeper than the current depth.
    ///
    /// The depth is restored once the callback returns, including any levels
    /// added by [Parser::deepen] within the callback.
    pub fn nested<T, F>(&mut self, cb: F) -> Result<T, Diagnostic>
    where
        F: FnOnce(&mut Self) -> Result<T, Diagnostic>,
    {
        let depth = self.depth;
        let result = self.deepen().and_then(|_| cb(self));
        self.depth = depth;
        result
    }

    /// Increases the nesting depth by one level.
    ///
    /// Returns an error once [MAX_NESTING_DEPTH] is exceeded; the construct
    /// at the current token is skipped and covered by the error's label.
    pub fn deepen(&mut self) -> Result<(), Diagnostic> {
        if self.depth >= MAX_NESTING_DEPTH {
            let span = self.skip_nested();
            return Err(Diagnostic::error("maximum nesting depth exceeded").with_label(
                format!("this nests deeper than {MAX_NESTING_DEPTH} levels"),
                span,
            ));
        }

        self.depth += 1;
        Ok(())
    }

    /// Skips the construct at the current token.
    ///
    /// A construct starting with an open bracket is skipped through its
    /// matching close. Otherwise, the rest of the enclosing block is skipped
    /// up to the `}` that closes it. Quasi-literal regions are skipped as a
    /// unit.
    fn skip_nested(&mut self) -> Span {
        let start = self.span().start();
        let first = self.pos;
        let group = self.peek().is_some_and(|(k, _)| closing_bracket(k).is_some());
        let mut closes = Vec::new();

        while let Some((kind, _)) = self.peek() {
            if self.is_region_close(self.pos) {
                break;
            }

            if let Some(close) = closing_bracket(kind) {
                closes.push(close);
            } else if is_close_bracket(kind) {
                match closes.last() {
                    Some(expected) if *expected == kind => {
                        closes.pop();
                    }
                    None if !group && kind != SyntaxKind::CloseBrace => {}
                    _ => break,
                }

                self.pos += 1;
                if group && closes.is_empty() {
                    break;
                }

                continue;
            }

            match self.matches[self.pos] {
                Some(close) if close > self.pos => self.pos = close + 1,
                _ => self.pos += 1,
            }
        }

        if self.pos == first {
            Span::new(start, self.span().len())
        } else {
            self.span_from(start)
        }
    }

    /// Adds a diagnostic to the parser output.
    pub fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Pushes a token set to the parser's recovery token set stack.
    pub fn push_recovery_set(&mut self, tokens: TokenSet) {
        self.recovery.push(tokens);
    }

    /// Pops a token set from the parser's recovery token set stack.
    pub fn pop_recovery_set(&mut self) {
        self.recovery.pop();
    }

    /// Recovers from an error by consuming all tokens not in the top-most
    /// recovery set.
    ///
    /// Recovery skips quasi-literal regions as a unit and stops at the close
    /// of an enclosing region.
    ///
    /// Returns the span of the skipped source; the span is empty if no tokens
    /// were skipped.
    pub fn recover(&mut self, mut diagnostic: Diagnostic) -> Span {
        let tokens = self.recovery.last().copied().unwrap_or(TokenSet::EMPTY);
        let start = self.span().start();
        let first = self.pos;

        while let Some((kind, span)) = self.peek() {
            if tokens.contains(kind.into_raw()) || self.is_region_close(self.pos) {
                break;
            }

            match self.matches[self.pos] {
                Some(close) if close > self.pos => {
                    // Skip the entire region; if the diagnostic label started at this
                    // token, extend it to cover the region
                    self.pos = close + 1;
                    let end = self.last_end();
                    for label in diagnostic.labels_mut() {
                        if label.span().start() == span.start() {
                            label.set_span(Span::new(span.start(), end - span.start()));
                        }
                    }
                }
                _ => self.pos += 1,
            }
        }

        self.diagnostics.push(diagnostic);

        if self.pos == first {
            Span::new(start, 0)
        } else {
            self.span_from(start)
        }
    }

    /// Performs recovery with the given recovery token set.
    pub fn recover_with_set(&mut self, diagnostic: Diagnostic, recovery: TokenSet) -> Span {
        self.recovery.push(recovery);
        let span = self.recover(diagnostic);
        self.recovery.pop();
        span
    }

    /// Determines if the token at the given index closes a region opened
    /// earlier in the token stream.
    fn is_region_close(&self, index: usize) -> bool {
        matches!(self.matches.get(index), Some(Some(open)) if *open < index)
    }

    /// Consumes the parser and returns the diagnostics.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Gets the close bracket matching the given open bracket.
fn closing_bracket(kind: SyntaxKind) -> Option<SyntaxKind> {
    match kind {
        SyntaxKind::OpenParen => Some(SyntaxKind::CloseParen),
        SyntaxKind::OpenBracket => Some(SyntaxKind::CloseBracket),
        SyntaxKind::OpenBrace => Some(SyntaxKind::CloseBrace),
        _ => None,
    }
}

/// Determines if the given token is a close bracket.
fn is_close_bracket(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::CloseParen | SyntaxKind::CloseBracket | SyntaxKind::CloseBrace
    )
}

impl Iterator for Parser<'_> {
    type Item = (SyntaxKind, Span);

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some((token.kind, token.span))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn expected_display() {
        assert_eq!(Expected::new(&["a"]).to_string(), "a");
        assert_eq!(Expected::new(&["a", "b"]).to_string(), "a or b");
        assert_eq!(Expected::new(&["a", "b", "c"]).to_string(), "a, b, or c");
    }

    #[test]
    fn recovery_skips_regions() {
        let mut parser = Parser::new(r#"x "a } b" y }"#);
        parser.next();
        let skipped = parser.recover_with_set(
            Diagnostic::error("test"),
            TokenSet::new(&[SyntaxKind::CloseBrace.into_raw()]),
        );
        assert_eq!(parser.peek().map(|(k, _)| k), Some(SyntaxKind::CloseBrace));
        assert_eq!(parser.span().start(), 12);
        assert_eq!(skipped, Span::new(2, 9));
    }

    #[test]
    fn recovery_stops_at_enclosing_region_close() {
        let mut parser = Parser::new(r#""~{ a b c }""#);
        parser.next();
        parser.next();
        parser.next();
        parser.recover_with_set(Diagnostic::error("test"), TokenSet::EMPTY);
        assert_eq!(
            parser.peek().map(|(k, _)| k),
            Some(SyntaxKind::PlaceholderClose)
        );
    }

    #[test]
    fn delimited_items() {
        let mut parser = Parser::new("[a, , b c]");
        let items = parser
            .matching_delimited(
                SyntaxKind::OpenBracket,
                SyntaxKind::CloseBracket,
                Some(SyntaxKind::Comma),
                TokenSet::new(&[SyntaxKind::Ident.into_raw()]),
                |parser| parser.expect_ident(TokenSet::new(&[SyntaxKind::Ident.into_raw()]), "name"),
            )
            .unwrap();

        let names: Vec<_> = items
            .iter()
            .map(|i| i.present().map(|i| i.name.as_str()))
            .collect();
        assert_eq!(names, [Some("a"), None, Some("b"), Some("c")]);

        let diagnostics = parser.finish();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].message(), "expected name, but found `,`");
        assert_eq!(diagnostics[1].message(), "expected `,`, but found identifier");
    }

    #[test]
    fn nesting_limit_skips_the_construct() {
        let mut parser = Parser::new("( a [ b ] ) c } d");
        parser.depth = MAX_NESTING_DEPTH;
        let start = parser.token_index();
        let e = parser.deepen().unwrap_err();
        assert_eq!(e.message(), "maximum nesting depth exceeded");
        assert!(parser.token_index() > start);
        assert_eq!(parser.span().start(), 12);
        assert_eq!(parser.depth, MAX_NESTING_DEPTH);

        let e = parser.nested(|_| Ok(())).unwrap_err();
        assert_eq!(e.message(), "maximum nesting depth exceeded");
        assert_eq!(parser.span().start(), 14);

        parser.depth = 0;
        assert!(parser.nested(|parser| parser.deepen()).is_ok());
        assert_eq!(parser.depth, 0);
    }

    #[test]
    fn unmatched_close_at_end_of_input() {
        let mut parser = Parser::new("{ a");
        let items = parser
            .matching_delimited(
                SyntaxKind::OpenBrace,
                SyntaxKind::CloseBrace,
                None,
                TokenSet::new(&[SyntaxKind::Ident.into_raw()]),
                |parser| parser.expect_ident(TokenSet::new(&[SyntaxKind::Ident.into_raw()]), "name"),
            )
            .unwrap();
        assert_eq!(items.len(), 1);

        let diagnostics = parser.finish();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message(),
            "expected `}`, but found end of input"
        );
        let labels: Vec<_> = diagnostics[0].labels().map(|l| l.message()).collect();
        assert_eq!(labels, ["unexpected end of input", "this `{` is not matched"]);
    }
}
