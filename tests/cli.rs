//! CLI tests.
//!
//! This test looks for directories in `tests/cli` containing an `args` file.
//!
//! Each directory may contain:
//!
//! * `args` - the arguments to run `wdlparse` with, split as a shell would.
//! * `inputs` - a directory of files copied into a temporary directory that
//!   the command runs in.
//! * `outputs` - a directory of files expected in the temporary directory
//!   after the command runs.
//! * `stdout` - the expected standard output of the command.
//! * `status` - the expected exit status of the command.
//! * `stderr.contains` - lines expected somewhere in the standard error of
//!   the command. Log lines carry timestamps, so standard error is never
//!   compared exactly.
//!
//! The `stdout` and `status` files may be automatically generated or updated
//! by setting the `BLESS` environment variable when running this test.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use anyhow::Result;
use anyhow::bail;
use assert_cmd::Command;
use libtest_mimic::Trial;
use pretty_assertions::StrComparison;
use tempfile::TempDir;
use walkdir::WalkDir;

/// The output of a command.
struct CommandOutput {
    /// The standard output of the command.
    stdout: String,
    /// The standard error of the command.
    stderr: String,
    /// The exit status of the command.
    status: i32,
}

/// Finds the tests in `tests/cli`.
fn find_tests() -> Vec<Trial> {
    let mut tests: Vec<_> = Path::new("tests")
        .join("cli")
        .read_dir()
        .unwrap()
        .filter_map(|entry| {
            let entry = entry.expect("failed to read directory");
            let path = entry.path();
            if !path.join("args").is_file() {
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

/// Copies every file under `source` to the same relative path under `target`.
fn recursive_copy(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .context("failed to strip path prefix from source")?;
        let to = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&to)
                .with_context(|| format!("failed to create directory `{}`", to.display()))?;
        } else {
            fs::copy(entry.path(), &to)
                .with_context(|| format!("failed to copy file to `{}`", to.display()))?;
        }
    }

    Ok(())
}

/// Runs `wdlparse` with the test's arguments in the given directory.
fn run_wdlparse(test: &Path, working_dir: &Path) -> Result<CommandOutput> {
    let args_path = test.join("args");
    let args = fs::read_to_string(&args_path)
        .with_context(|| format!("failed to read `{}`", args_path.display()))?;
    let Some(args) = shlex::split(&args) else {
        bail!("`{}` is not valid shell syntax", args_path.display());
    };

    let output = Command::cargo_bin("wdlparse")?
        .current_dir(working_dir)
        .args(args)
        .output()
        .context("failed to run `wdlparse`")?;

    Ok(CommandOutput {
        stdout: String::from_utf8(output.stdout).context("standard output is not UTF-8")?,
        stderr: String::from_utf8(output.stderr).context("standard error is not UTF-8")?,
        status: output.status.code().unwrap_or(-1),
    })
}

/// Compares a result against the expected result in a file.
fn compare_result(path: &Path, result: &str) -> Result<()> {
    let result = result.replace("\r\n", "\n");
    if env::var_os("BLESS").is_some() {
        fs::write(path, &result)
            .with_context(|| format!("failed to write result file `{}`", path.display()))?;
        return Ok(());
    }

    let expected = fs::read_to_string(path)
        .with_context(|| format!("failed to read result file `{}`", path.display()))?
        .replace("\r\n", "\n");

    if expected != result {
        bail!(
            "result from `{path}` is not as expected:\n{diff}",
            path = path.display(),
            diff = StrComparison::new(&expected, &result),
        );
    }

    Ok(())
}

/// Compares every expected output file against the working directory.
fn compare_outputs(expected: &Path, working_dir: &Path) -> Result<()> {
    if !expected.is_dir() {
        return Ok(());
    }

    for entry in WalkDir::new(expected) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(expected)
            .context("failed to strip path prefix from outputs")?;
        let actual_path = working_dir.join(relative);
        let actual = fs::read_to_string(&actual_path)
            .with_context(|| format!("expected output `{}` was not written", relative.display()))?;
        let expected = fs::read_to_string(entry.path())?;
        if expected != actual {
            bail!(
                "output `{path}` is not as expected:\n{diff}",
                path = relative.display(),
                diff = StrComparison::new(&expected, &actual),
            );
        }
    }

    Ok(())
}

/// Runs a test.
fn run_test(test: &Path) -> Result<()> {
    let working_dir = TempDir::new().context("failed to create temporary directory")?;
    let inputs = test.join("inputs");
    if inputs.is_dir() {
        recursive_copy(&inputs, working_dir.path())?;
    }

    let output = run_wdlparse(test, working_dir.path())?;
    compare_result(&test.join("stdout"), &output.stdout)?;
    compare_result(&test.join("status"), &format!("{}\n", output.status))?;
    compare_outputs(&test.join("outputs"), working_dir.path())?;

    let contains = test.join("stderr.contains");
    if contains.is_file() {
        for line in fs::read_to_string(&contains)?.lines() {
            if !output.stderr.contains(line) {
                bail!(
                    "standard error does not contain `{line}`:\n{stderr}",
                    stderr = output.stderr
                );
            }
        }
    }

    Ok(())
}

fn main() {
    let args = libtest_mimic::Arguments::from_args();
    let tests = find_tests();
    libtest_mimic::run(&args, tests).exit();
}
