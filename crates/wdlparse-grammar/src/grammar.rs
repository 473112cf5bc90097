//! Module for the WDL grammar functions.

use crate::Diagnostic;
use crate::Span;
use crate::lexer::SyntaxKind;
use crate::parser::Parser;
use crate::tree::Document;
use crate::tree::Ident;
use crate::tree::Slot;
use crate::tree::VersionStatement;
use crate::version::SupportedVersion;

pub mod v1;

/// Parses a WDL document.
///
/// A document without a version statement is reported, but the remainder of
/// the document is still parsed as WDL 1.x.
pub fn document(parser: &mut Parser<'_>) -> Document {
    let version = match parser.peek() {
        Some((SyntaxKind::VersionKeyword, _)) => Slot::Present(version_statement(parser)),
        found => {
            let mut diagnostic =
                Diagnostic::error("a WDL document must start with a version statement");

            if let Some((_, span)) = found {
                diagnostic =
                    diagnostic.with_label("a version statement must come before this", span);
            }

            parser.diagnostic(diagnostic);
            Slot::Missing(Span::new(parser.span().start(), 0))
        }
    };

    let items = v1::items(parser);
    Document {
        version,
        items,
        span: Span::new(0, parser.source_len()),
    }
}

/// Parses the version statement of a WDL source file.
///
/// An unsupported version is reported as a warning.
fn version_statement(parser: &mut Parser<'_>) -> VersionStatement {
    let keyword = parser.require(SyntaxKind::VersionKeyword);

    let version = match parser.expect(SyntaxKind::Version) {
        Ok(span) => {
            let name = parser.source(span);
            if let Err(e) = name.parse::<SupportedVersion>() {
                parser.diagnostic(
                    Diagnostic::warning(e.to_string())
                        .with_label("this version of WDL is not supported", span)
                        .with_fix(format!(
                            "use a supported WDL version: {versions}",
                            versions = SupportedVersion::all()
                                .map(|v| v.to_string())
                                .collect::<Vec<_>>()
                                .join(", ")
                        )),
                );
            }

            Slot::Present(Ident {
                name: name.to_string(),
                span,
            })
        }
        Err(e) => {
            parser.diagnostic(e);
            Slot::Missing(Span::new(keyword.end(), 0))
        }
    };

    VersionStatement {
        version,
        span: parser.span_from(keyword.start()),
    }
}
