//! CLI integration tests using the real bundle-harness binary

mod common;

use assert_cmd::Command;
use common::TestOutput;
use predicates::prelude::*;

#[allow(deprecated)]
fn harness_cmd() -> Command {
    Command::cargo_bin("bundle-harness").unwrap()
}

const NODE_GRAPH: &str = r#"
bundles:
  - type: js
    filePath: /out/index.js
    entry: main
    assets:
      - { id: main, filePath: /src/index.js, env: { context: node } }
"#;

fn node_output(source: &str) -> TestOutput {
    let output = TestOutput::new();
    output.write_file("dist/index.js", source);
    output.write_file("graph.yaml", NODE_GRAPH);
    output
}

#[test]
fn test_help_output() {
    harness_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_version_output() {
    harness_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bundle-harness"))
        .stdout(predicate::str::contains("Build info"));
}

#[test]
fn test_run_prints_export() {
    let output = node_output(r#"module.exports = { answer: require("./lib").value };"#);
    output.write_file("dist/lib.js", r#"exports.value = "forty-two";"#);

    harness_cmd()
        .current_dir(&output.path)
        .args(["run", "graph.yaml", "--root", "dist", "--mount", "/out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"answer\": \"forty-two\""));
}

#[test]
fn test_run_with_globals() {
    let output = node_output("module.exports = [FLAG, NAME];");

    harness_cmd()
        .current_dir(&output.path)
        .args([
            "run",
            "graph.yaml",
            "--root",
            "dist",
            "--mount",
            "/out",
            "--global",
            "FLAG=true",
            "--global",
            "NAME=plain",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"))
        .stdout(predicate::str::contains("\"plain\""));
}

#[test]
fn test_run_raw_lists_bindings() {
    let output = node_output("var marker = 1;");

    harness_cmd()
        .current_dir(&output.path)
        .args(["run", "graph.yaml", "-r", "dist", "-m", "/out", "--raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marker"))
        .stdout(predicate::str::contains("require"));
}

#[test]
fn test_run_reports_thrown_error() {
    let output = node_output(r#"throw new TypeError("broken bundle");"#);

    harness_cmd()
        .current_dir(&output.path)
        .args(["run", "graph.yaml", "--root", "dist", "--mount", "/out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TypeError: broken bundle"));
}

#[test]
fn test_run_with_config_file() {
    let output = node_output(r#"var result = "from config"; module.exports = "ignored";"#);
    output.write_file("harness.yaml", "output_global: result\n");

    harness_cmd()
        .current_dir(&output.path)
        .args([
            "--config",
            "harness.yaml",
            "run",
            "graph.yaml",
            "--root",
            "dist",
            "--mount",
            "/out",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("from config"));
}

#[test]
fn test_check_passes() {
    let output = node_output("");
    output.write_file(
        "expected.yaml",
        "- name: index.js\n  type: js\n  assets: [index.js]\n",
    );

    harness_cmd()
        .current_dir(&output.path)
        .args(["check", "graph.yaml", "expected.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("layout matches 1 expected bundles"));
}

#[test]
fn test_check_reports_mismatch() {
    let output = node_output("");
    output.write_file("expected.json", r#"[{"assets": ["other.js"]}]"#);

    harness_cmd()
        .current_dir(&output.path)
        .args(["check", "graph.yaml", "expected.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("assets mismatch"));
}

#[test]
fn test_completions_bash() {
    harness_cmd()
        .args(["completions", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bundle-harness"));
}

#[test]
fn test_completions_unknown_shell() {
    harness_cmd()
        .args(["completions", "--shell", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown shell"));
}
