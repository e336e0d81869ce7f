//! Runs the command line interface on the programs in `tests/programs`.
//!
//! A program `name.mj` with a sibling `name.out` is expected to succeed and
//! print exactly the contents of `name.out`.
//!
//! ```sh
//! cargo test --test integration
//! ```

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::{fs, path::PathBuf, process::Command};

const ROOT_DIR: &str = env!("CARGO_MANIFEST_DIR");

fn program(name: &str) -> PathBuf {
    [ROOT_DIR, "tests", "programs", name].iter().collect()
}

fn expected_output(name: &str) -> String {
    let path = program(name).with_extension("out");
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read reference file {:?}: {}", path, e))
}

fn compiler(args: &[&str], name: &str) -> Command {
    let mut cmd = Command::cargo_bin("compiler-cli").unwrap();
    cmd.env("TERM", "dumb"); // disable color output
    cmd.args(args).arg(program(name));
    cmd
}

fn assert_runs(name: &str) {
    compiler(&["--interpret"], name)
        .assert()
        .success()
        .stdout(predicate::str::similar(expected_output(name)).from_utf8())
        .stderr(predicate::str::is_empty().from_utf8());
}

#[test]
fn interpret_fib() {
    assert_runs("fib.mj");
}

#[test]
fn interpret_mixed_numeric_types() {
    assert_runs("mixed.mj");
}

#[test]
fn interpret_dynamic_dispatch() {
    assert_runs("shapes.mj");
}

#[test]
fn interpret_deep_recursion() {
    assert_runs("deep_recursion.mj");
}

#[test]
fn interpret_is_the_default_action() {
    compiler(&[], "fib.mj")
        .assert()
        .success()
        .stdout(predicate::str::similar(expected_output("fib.mj")).from_utf8());
}

#[test]
fn lextest_prints_tokens_and_eof() {
    compiler(&["--lextest"], "lex.mj")
        .assert()
        .success()
        .stdout(predicate::str::similar(expected_output("lex.mj")).from_utf8());
}

#[test]
fn lexical_error_at_the_opening_quote() {
    compiler(&["--lextest"], "unterminated.mj")
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::contains("error: Unterminated string literal\n")
                .and(predicate::str::contains(" 3 | "))
                .and(predicate::str::contains("Compilation aborted due to an error"))
                .from_utf8(),
        );
}

#[test]
fn check_reports_success() {
    compiler(&["--check"], "shapes.mj")
        .assert()
        .success()
        .stdout(predicate::str::is_empty().from_utf8())
        .stderr(
            predicate::str::contains("Compilation finished successfully without warnings")
                .from_utf8(),
        );
}

#[test]
fn check_reports_incomparable_operands() {
    compiler(&["--check"], "type_error.mj")
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::contains("boolean")
                .and(predicate::str::contains("int"))
                .and(predicate::str::contains("Compilation aborted due to an error"))
                .from_utf8(),
        );
}

#[test]
fn type_errors_prevent_interpretation() {
    compiler(&["--interpret"], "type_error.mj")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty().from_utf8());
}

#[test]
fn missing_main_method() {
    compiler(&["--check"], "no_main.mj")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no 'public static void main' method found").from_utf8());
}

#[test]
fn runtime_error_after_output() {
    compiler(&[], "null_deref.mj")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::similar("1\n").from_utf8())
        .stderr(predicate::str::contains("null pointer dereference").from_utf8());
}

#[test]
fn print_ast_is_stable() {
    let output = compiler(&["--print-ast"], "shapes.mj").output().unwrap();
    assert!(output.status.success());
    let printed = String::from_utf8(output.stdout).unwrap();
    assert!(printed.starts_with("class Main {\n"));
    assert!(printed.contains("abstract class Named implements Shape {\n"));

    let dir = std::env::temp_dir().join(format!("print-ast-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let reprinted_input = dir.join("shapes.mj");
    fs::write(&reprinted_input, &printed).unwrap();

    let mut cmd = Command::cargo_bin("compiler-cli").unwrap();
    cmd.env("TERM", "dumb")
        .arg("--print-ast")
        .arg(&reprinted_input)
        .assert()
        .success()
        .stdout(predicate::str::similar(printed).from_utf8());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn emit_ir_contains_every_method() {
    compiler(&["--emit-ir"], "shapes.mj")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("define i32 @Rect.area(ptr %0) {")
                .and(predicate::str::contains("define ptr @Square.name(ptr %0) {"))
                .and(predicate::str::contains("call ptr @Rect.name(ptr %0)"))
                .and(predicate::str::contains("call void @mjrt_cast.Named(ptr %"))
                .from_utf8(),
        );
}

#[test]
fn actions_are_mutually_exclusive() {
    compiler(&["--check", "--lextest"], "fib.mj")
        .assert()
        .failure();
}

#[test]
fn missing_input_file() {
    compiler(&[], "does_not_exist.mj")
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::starts_with("error: cannot read ")
                .and(predicate::str::contains("caused by: "))
                .from_utf8(),
        );
}
