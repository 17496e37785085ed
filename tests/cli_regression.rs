// Regression tests for the CLI wrapper: diagnostics render through miette,
// and extraction results (or rejections) surface through exit codes.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

#[test]
fn cli_reports_miette_diagnostics_on_parse_error() {
    let bad_file = "tests/bad_method.java";
    fs::write(bad_file, "void f() { g( }" /* unclosed call */).unwrap();

    let mut cmd = Command::cargo_bin("hoist").unwrap();
    cmd.arg("format").arg(bad_file);
    cmd.assert()
        .failure()
        .stderr(contains("hoist::parse").or(contains("Parse error")));

    let _ = fs::remove_file(bad_file);
}

#[test]
fn cli_extracts_and_prints_the_result() {
    let file = "tests/extract_input.java";
    fs::write(file, "void f() { use(a.b); }").unwrap();

    let mut cmd = Command::cargo_bin("hoist").unwrap();
    cmd.args([
        "extract", file, "--range", "1:16-1:18", "--name", "x", "--type", "int",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("int x = a.b;").and(contains("use(x);")));

    let _ = fs::remove_file(file);
}

#[test]
fn cli_rejection_exits_nonzero() {
    let file = "tests/reject_input.java";
    fs::write(file, "void f() { use(a.b); }").unwrap();

    let mut cmd = Command::cargo_bin("hoist").unwrap();
    cmd.args([
        "extract", file, "--range", "1:16-1:19", "--name", "x", "--type", "int",
    ]);
    cmd.assert()
        .failure()
        .stderr(contains("no extractable expression"));

    let _ = fs::remove_file(file);
}
