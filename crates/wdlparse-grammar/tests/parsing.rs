//! The parser file tests.
//!
//! This test looks for directories in `tests/parsing`.
//!
//! Each directory is expected to contain:
//!
//! * `source.wdl` - the test input source to parse.
//! * `source.metadata` - the expected basic metadata of the source, as JSON.
//! * `source.status` - the expected parse status: the document version, the
//!   error state, and the severity and message of every diagnostic in
//!   emission order.
//!
//! Both `source.metadata` and `source.status` may be automatically generated
//! or updated by setting the `BLESS` environment variable when running this
//! test.

use std::env;
use std::ffi::OsStr;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use libtest_mimic::Trial;
use pretty_assertions::StrComparison;
use wdlparse_grammar::ParseOptions;
use wdlparse_grammar::ParseResult;
use wdlparse_grammar::parse;

/// Finds tests for this package.
fn find_tests() -> Vec<Trial> {
    let mut tests: Vec<_> = Path::new("tests")
        .join("parsing")
        .read_dir()
        .unwrap()
        .filter_map(|entry| {
            let entry = entry.expect("failed to read directory");
            let path = entry.path();
            if !path.is_dir() {
                return None;
            }

            let test_name = path
                .file_stem()
                .map(OsStr::to_string_lossy)
                .unwrap()
                .into_owned();
            Some(Trial::test(test_name, move || Ok(run_test(&path)?)))
        })
        .collect();

    tests.sort_by(|a, b| a.name().cmp(b.name()));
    tests
}

/// Formats the status of a parse.
fn format_status(result: &ParseResult) -> String {
    let mut status = String::new();
    writeln!(
        &mut status,
        "version: {version}",
        version = result.version().unwrap_or("none")
    )
    .unwrap();
    writeln!(
        &mut status,
        "document: {document}",
        document = if result.document().is_some() {
            "present"
        } else {
            "absent"
        }
    )
    .unwrap();
    writeln!(
        &mut status,
        "has_errors: {has_errors}",
        has_errors = result.has_errors()
    )
    .unwrap();
    writeln!(
        &mut status,
        "diagnostics: {count}",
        count = result.diagnostics_count()
    )
    .unwrap();

    for diagnostic in result.diagnostics() {
        writeln!(
            &mut status,
            "{severity}: {message}",
            severity = diagnostic.severity(),
            message = diagnostic.message()
        )
        .unwrap();
    }

    status
}

/// Compares a test result.
fn compare_result(path: &Path, result: &str) -> Result<(), anyhow::Error> {
    let result = result.replace("\r\n", "\n");
    if env::var_os("BLESS").is_some() {
        fs::write(path, &result).with_context(|| {
            format!(
                "failed to write result file `{path}`",
                path = path.display()
            )
        })?;
        return Ok(());
    }

    let expected = fs::read_to_string(path)
        .with_context(|| format!("failed to read result file `{path}`", path = path.display()))?
        .replace("\r\n", "\n");

    if expected != result {
        anyhow::bail!(
            "result from `{path}` is not as expected:\n{diff}",
            path = path.display(),
            diff = StrComparison::new(&expected, &result),
        );
    }

    Ok(())
}

/// Runs a test.
fn run_test(test: &Path) -> Result<(), anyhow::Error> {
    let path = test.join("source.wdl");
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read source file `{path}`", path = path.display()))?
        .replace("\r\n", "\n");

    let result = parse(
        &source,
        ParseOptions {
            verbose: false,
            extract_metadata: true,
        },
    );

    let metadata = result
        .basic_metadata()
        .context("metadata extraction was requested")?;
    compare_result(
        &path.with_extension("metadata"),
        &format!("{json}\n", json = serde_json::to_string_pretty(metadata)?),
    )?;
    compare_result(&path.with_extension("status"), &format_status(&result))?;
    Ok(())
}

fn main() {
    let args = libtest_mimic::Arguments::from_args();
    let tests = find_tests();
    libtest_mimic::run(&args, tests).exit();
}
