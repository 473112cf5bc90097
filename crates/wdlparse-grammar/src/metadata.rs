//! Extraction of basic document metadata directly from the token stream.
//!
//! The extraction does not depend on the parser: it scans the lexed tokens
//! for the `version`, `workflow`, and `task` keywords and the tokens that
//! follow them. As a result, it recovers metadata from documents the parser
//! reports errors for (unclosed braces, missing keywords, and so on).
//!
//! Only tokens outside of quasi-literal regions count; keywords appearing in
//! comments, strings, command bodies, or placeholders are ignored.

use std::borrow::Cow;

use indexmap::IndexSet;
use serde::Deserialize;
use serde::Serialize;

use crate::lexer::Lexer;
use crate::lexer::SyntaxKind;
use crate::lexer::SyntaxToken;

/// The basic metadata of a WDL document.
///
/// Each field is extracted independently of the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicMetadata {
    /// The version from the first version statement.
    pub version: Option<String>,
    /// The name of the first workflow.
    pub workflow_name: Option<String>,
    /// The names of the tasks, deduplicated, in the order first seen.
    pub task_names: IndexSet<String>,
}

/// Extracts the basic metadata of the given source.
///
/// This never fails; metadata that cannot be found is left empty.
pub fn extract_basic_metadata(source: &str) -> BasicMetadata {
    let tokens = outer_tokens(Lexer::new(source));

    let mut metadata = BasicMetadata::default();
    for pair in tokens.windows(2) {
        let (keyword, next) = (&pair[0], &pair[1]);
        match (keyword.kind, next.kind) {
            (SyntaxKind::VersionKeyword, SyntaxKind::Version) if metadata.version.is_none() => {
                metadata.version = Some(next.text.to_string());
            }
            (SyntaxKind::WorkflowKeyword, SyntaxKind::Ident)
                if metadata.workflow_name.is_none() =>
            {
                metadata.workflow_name = Some(next.text.to_string());
            }
            (SyntaxKind::TaskKeyword, SyntaxKind::Ident) => {
                if !metadata.task_names.contains(next.text) {
                    metadata.task_names.insert(next.text.to_string());
                }
            }
            _ => {}
        }
    }

    tracing::debug!(
        version = ?metadata.version,
        workflow = ?metadata.workflow_name,
        tasks = metadata.task_names.len(),
        "extracted basic metadata"
    );

    metadata
}

/// Extracts the basic metadata of the given bytes.
///
/// Invalid UTF-8 sequences are replaced before extraction.
pub fn extract_basic_metadata_bytes(bytes: &[u8]) -> BasicMetadata {
    let source: Cow<'_, str> = String::from_utf8_lossy(bytes);
    extract_basic_metadata(&source)
}

/// Collects the significant tokens that are outside of every quasi-literal
/// region and placeholder.
fn outer_tokens(lexer: Lexer<'_>) -> Vec<SyntaxToken<'_>> {
    let mut regions: Vec<SyntaxKind> = Vec::new();
    let mut tokens = Vec::new();

    for token in lexer {
        match token.kind {
            kind if kind.is_trivia() => {}
            SyntaxKind::SingleQuote | SyntaxKind::DoubleQuote => {
                if regions.last() == Some(&token.kind) {
                    regions.pop();
                } else {
                    regions.push(token.kind);
                }
            }
            kind if kind.is_region_open() => regions.push(kind),
            SyntaxKind::CloseHeredoc
            | SyntaxKind::CloseBraceCommand
            | SyntaxKind::PlaceholderClose => {
                regions.pop();
            }
            _ if regions.is_empty() => tokens.push(token),
            _ => {}
        }
    }

    tokens
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn names(metadata: &BasicMetadata) -> Vec<&str> {
        metadata.task_names.iter().map(String::as_str).collect()
    }

    #[test]
    fn well_formed() {
        let metadata = extract_basic_metadata(
            r#"version 1.0
task hello {
  command <<< echo hi >>>
}
workflow hello_workflow {
  call hello
}
"#,
        );

        assert_eq!(metadata.version.as_deref(), Some("1.0"));
        assert_eq!(metadata.workflow_name.as_deref(), Some("hello_workflow"));
        assert_eq!(names(&metadata), ["hello"]);
    }

    #[test]
    fn malformed() {
        let metadata = extract_basic_metadata(
            r#"version 1.1
task broken_task {
  input {
    Int count = "not a number"
  command <<<
    echo "Count: ~{count"
  >>>
}
workflow broken_workflow {
  broken_task { input: count = 1 }
"#,
        );

        assert_eq!(metadata.version.as_deref(), Some("1.1"));
        assert_eq!(metadata.workflow_name.as_deref(), Some("broken_workflow"));
        assert_eq!(names(&metadata), ["broken_task"]);
    }

    #[test]
    fn keywords_in_regions_do_not_count() {
        let metadata = extract_basic_metadata(
            r#"# workflow commented
version 1.2
task real {
  command <<<
    echo "task fake"
    task also_fake ~{ "workflow" }
  >>>
  String s = "workflow inner"
}
"#,
        );

        assert_eq!(metadata.version.as_deref(), Some("1.2"));
        assert_eq!(metadata.workflow_name, None);
        assert_eq!(names(&metadata), ["real"]);
    }

    #[test]
    fn task_names_are_deduplicated_in_first_seen_order() {
        let metadata = extract_basic_metadata(
            "task b {}\ntask a {}\ntask b {}\nworkflow w {}\nworkflow x {}",
        );

        assert_eq!(metadata.version, None);
        assert_eq!(metadata.workflow_name.as_deref(), Some("w"));
        assert_eq!(names(&metadata), ["b", "a"]);
    }

    #[test]
    fn empty_and_garbage() {
        assert_eq!(extract_basic_metadata(""), BasicMetadata::default());
        assert_eq!(
            extract_basic_metadata_bytes(&[0xff, 0xfe, b't', b'a', 0x00]),
            BasicMetadata::default()
        );
    }

    #[test]
    fn serialization() {
        let metadata = extract_basic_metadata("version 1.0\ntask t {}");
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"version":"1.0","workflow_name":null,"task_names":["t"]}"#
        );
    }
}
