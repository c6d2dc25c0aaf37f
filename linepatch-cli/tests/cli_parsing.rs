//! End-to-end CLI tests. Notifications and type checking are always disabled here.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn linepatch() -> Command {
    Command::cargo_bin("linepatch").expect("linepatch binary")
}

fn create_temp_project() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    let root = td.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(
        root.join("src").join("greet.py"),
        "def greet():\n    print(\"hi\")\n    return 1\n",
    )
    .unwrap();
    td
}

fn write_batch(root: &Path, json: serde_json::Value) -> std::path::PathBuf {
    let path = root.join("batch.json");
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    path
}

fn apply(root: &Path) -> Command {
    let mut cmd = linepatch();
    cmd.current_dir(root)
        .arg("apply")
        .arg("batch.json")
        .arg("--no-notify")
        .arg("--no-type-check");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_apply_replace_block_succeeds() {
    let temp = create_temp_project();
    write_batch(
        temp.path(),
        serde_json::json!({
            "orderId": "order-1",
            "patches": [
                {"op": "replace-block", "file": "src/greet.py", "start": 2, "end": 2,
                 "block": "print(\"hello\")"}
            ]
        }),
    );

    let output = apply(temp.path()).output().expect("run");
    assert!(output.status.success());

    let result = stdout_json(&output);
    assert_eq!(result["batch_id"], "order-1");
    assert_eq!(result["success"], true);
    assert_eq!(result["results"][0]["written"], true);
    assert_eq!(
        fs::read_to_string(temp.path().join("src/greet.py")).unwrap(),
        "def greet():\n    print(\"hello\")\n    return 1\n"
    );
}

#[test]
fn test_apply_out_of_range_exits_one_and_keeps_going() {
    let temp = create_temp_project();
    write_batch(
        temp.path(),
        serde_json::json!({
            "patches": [
                {"op": "insert-after", "file": "src/greet.py", "line": 40, "block": "x = 1"},
                {"op": "append", "file": "src/greet.py", "block": "greet()"}
            ]
        }),
    );

    let output = apply(temp.path()).output().expect("run");
    assert_eq!(output.status.code(), Some(1));

    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert_eq!(result["failed"], 1);
    assert_eq!(result["results"][0]["error"]["kind"], "range");
    assert_eq!(result["results"][1]["success"], true);
    assert!(
        fs::read_to_string(temp.path().join("src/greet.py"))
            .unwrap()
            .ends_with("return 1\ngreet()\n")
    );
}

#[test]
fn test_apply_dry_run_leaves_files_untouched() {
    let temp = create_temp_project();
    let before = fs::read_to_string(temp.path().join("src/greet.py")).unwrap();
    write_batch(
        temp.path(),
        serde_json::json!({
            "patches": [{"op": "prepend", "file": "src/greet.py", "block": "import sys"}]
        }),
    );

    let output = apply(temp.path()).arg("--dry-run").output().expect("run");
    assert!(output.status.success());

    let result = stdout_json(&output);
    assert_eq!(result["dry_run"], true);
    assert_eq!(result["results"][0]["written"], false);
    assert!(
        result["results"][0]["diff"]
            .as_str()
            .unwrap()
            .contains("+import sys")
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("src/greet.py")).unwrap(),
        before
    );
}

#[test]
fn test_schema_violation_exits_two_without_writing() {
    let temp = create_temp_project();
    let before = fs::read_to_string(temp.path().join("src/greet.py")).unwrap();
    fs::create_dir_all(temp.path().join(".mission_control")).unwrap();
    fs::write(
        temp.path().join(".mission_control/tasks.json"),
        r#"{"tasks": [{"id": "T1", "files": ["src/other.py"], "allowedOperations": ["append"]}]}"#,
    )
    .unwrap();
    write_batch(
        temp.path(),
        serde_json::json!({
            "patches": [
                {"op": "append", "file": "src/greet.py", "block": "x", "taskId": "T1"}
            ]
        }),
    );

    apply(temp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not allowed"));
    assert_eq!(
        fs::read_to_string(temp.path().join("src/greet.py")).unwrap(),
        before
    );
}

#[test]
fn test_malformed_batch_exits_one() {
    let temp = create_temp_project();
    write_batch(
        temp.path(),
        serde_json::json!({
            "patches": [{"op": "replace-block", "file": "src/greet.py", "start": 1, "block": "x"}]
        }),
    );

    apply(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("requires 'end'"));
}

#[test]
fn test_missing_batch_file_fails() {
    let temp = create_temp_project();
    apply(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch.json"));
}

#[test]
fn test_apply_reads_batch_from_stdin() {
    let temp = create_temp_project();
    let batch = serde_json::json!({
        "patches": [{"op": "insert-before", "file": "src/greet.py", "line": 1, "block": "# greeting"}]
    });

    linepatch()
        .current_dir(temp.path())
        .args(["apply", "-", "--no-notify", "--no-type-check"])
        .write_stdin(batch.to_string())
        .assert()
        .success();
    assert!(
        fs::read_to_string(temp.path().join("src/greet.py"))
            .unwrap()
            .starts_with("# greeting\ndef greet():\n")
    );
}

#[test]
fn test_out_and_summary_md_are_written() {
    let temp = create_temp_project();
    write_batch(
        temp.path(),
        serde_json::json!({
            "orderId": "order-md",
            "patches": [{"op": "append", "file": "src/greet.py", "block": "greet()"}]
        }),
    );

    apply(temp.path())
        .args(["--out", "artifacts/result.json", "--summary-md", "artifacts/summary.md"])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("artifacts/result.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["schema"], "linepatch.result.v1");
    assert_eq!(json["batch_id"], "order-md");

    let md = fs::read_to_string(temp.path().join("artifacts/summary.md")).unwrap();
    assert!(md.contains("order-md"));
    assert!(md.contains("```diff"));
}

#[test]
fn test_project_root_flag_resolves_paths() {
    let temp = create_temp_project();
    let batch = write_batch(
        temp.path(),
        serde_json::json!({
            "patches": [{"op": "append", "file": "src/greet.py", "block": "greet()"}]
        }),
    );

    linepatch()
        .arg("apply")
        .arg(&batch)
        .arg("--project-root")
        .arg(temp.path())
        .args(["--no-notify", "--no-type-check"])
        .assert()
        .success();
    assert!(
        fs::read_to_string(temp.path().join("src/greet.py"))
            .unwrap()
            .ends_with("greet()\n")
    );
}

#[test]
fn test_validate_reports_ok() {
    let temp = create_temp_project();
    write_batch(
        temp.path(),
        serde_json::json!({
            "patches": [{"op": "append", "file": "src/greet.py", "block": "x"}]
        }),
    );

    linepatch()
        .current_dir(temp.path())
        .args(["validate", "batch.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("batch is valid (1 operations)"));
}

#[test]
fn test_config_file_can_disable_notifications() {
    let temp = create_temp_project();
    fs::write(
        temp.path().join("linepatch.toml"),
        "[notify]\nenabled = false\n[typecheck]\nenabled = false\n",
    )
    .unwrap();
    write_batch(
        temp.path(),
        serde_json::json!({
            "patches": [{"op": "append", "file": "src/greet.py", "block": "x"}]
        }),
    );

    linepatch()
        .current_dir(temp.path())
        .args(["apply", "batch.json"])
        .assert()
        .success();
}

#[test]
fn test_invalid_config_fails() {
    let temp = create_temp_project();
    fs::write(temp.path().join("linepatch.toml"), "[notify]\nbogus = 1\n").unwrap();
    write_batch(temp.path(), serde_json::json!({"patches": []}));

    apply(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("linepatch.toml"));
}

#[test]
fn test_unknown_subcommand_fails() {
    linepatch().arg("explode").assert().failure();
}
