//! End-to-end CLI tests over a temp workspace.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn pyfix() -> Command {
    Command::cargo_bin("pyfix").expect("pyfix binary")
}

fn create_workspace() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    let root = td.path();

    fs::write(
        root.join("plan.json"),
        serde_json::to_string_pretty(&serde_json::json!({
            "name": "cleanup",
            "description": "print hygiene",
            "version": 1.0,
            "transformations": [{
                "type": "plugin_call",
                "description": "print to logging",
                "plugin_name": "print_to_logging"
            }]
        }))
        .unwrap(),
    )
    .unwrap();

    fs::write(root.join("mod.py"), "print(\"x\")\n").unwrap();
    td
}

#[test]
fn validate_accepts_a_good_plan() {
    let temp = create_workspace();

    pyfix()
        .current_dir(temp.path())
        .args(["validate", "--plan", "plan.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn validate_rejects_unknown_plugin() {
    let temp = create_workspace();
    fs::write(
        temp.path().join("bad.json"),
        serde_json::json!({
            "name": "bad",
            "description": "d",
            "version": 1.0,
            "transformations": [{
                "type": "plugin_call",
                "description": "d",
                "plugin_name": "does_not_exist"
            }]
        })
        .to_string(),
    )
    .unwrap();

    pyfix()
        .current_dir(temp.path())
        .args(["validate", "--plan", "bad.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does_not_exist"));
}

#[test]
fn run_without_apply_is_a_dry_run() {
    let temp = create_workspace();

    pyfix()
        .current_dir(temp.path())
        .args(["run", "--plan", "plan.json", "mod.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run: `true`"));

    // Dry-run: file untouched, no backup.
    let content = fs::read_to_string(temp.path().join("mod.py")).unwrap();
    assert_eq!(content, "print(\"x\")\n");
    assert!(!temp.path().join("mod.py.pyfix.bak").exists());
}

#[test]
fn run_with_apply_rewrites_and_backs_up() {
    let temp = create_workspace();

    pyfix()
        .current_dir(temp.path())
        .args(["run", "--plan", "plan.json", "mod.py", "--apply"])
        .assert()
        .success();

    let content = fs::read_to_string(temp.path().join("mod.py")).unwrap();
    assert_eq!(content, "import logging\nlogging.info(\"x\")\n");

    let backup = fs::read_to_string(temp.path().join("mod.py.pyfix.bak")).unwrap();
    assert_eq!(backup, "print(\"x\")\n");
}

#[test]
fn run_emits_json_summary_on_request() {
    let temp = create_workspace();

    let output = pyfix()
        .current_dir(temp.path())
        .args(["run", "--plan", "plan.json", "mod.py", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&output).expect("json summary");
    assert_eq!(summary["plan_name"], "cleanup");
    assert_eq!(summary["files_succeeded"], 1);
}

#[test]
fn plugins_lists_builtins() {
    let temp = create_workspace();

    pyfix()
        .current_dir(temp.path())
        .arg("plugins")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("synthesize_docstrings")
                .and(predicate::str::contains("remove_unused_imports"))
                .and(predicate::str::contains("print_to_logging")),
        );
}

#[test]
fn plugins_discovers_manifest_directory() {
    let temp = create_workspace();
    let plugin_dir = temp.path().join("pyfix-plugins");
    fs::create_dir_all(&plugin_dir).unwrap();
    fs::write(
        plugin_dir.join("isort.json"),
        serde_json::json!({
            "transformers": [{
                "kind": "external",
                "name": "isort",
                "description": "Sorts imports",
                "command": "isort"
            }]
        })
        .to_string(),
    )
    .unwrap();

    pyfix()
        .current_dir(temp.path())
        .arg("plugins")
        .assert()
        .success()
        .stdout(predicate::str::contains("isort"));
}

#[test]
fn preview_prints_a_diff_without_writing() {
    let temp = create_workspace();

    pyfix()
        .current_dir(temp.path())
        .args(["preview", "--plan", "plan.json", "mod.py"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("-print(\"x\")")
                .and(predicate::str::contains("+logging.info(\"x\")")),
        );

    let content = fs::read_to_string(temp.path().join("mod.py")).unwrap();
    assert_eq!(content, "print(\"x\")\n");
}

#[test]
fn run_exits_nonzero_when_a_file_fails() {
    let temp = create_workspace();

    pyfix()
        .current_dir(temp.path())
        .args(["run", "--plan", "plan.json", "missing.py"])
        .assert()
        .failure();
}

#[test]
fn run_requires_target_files() {
    let temp = create_workspace();

    pyfix()
        .current_dir(temp.path())
        .args(["run", "--plan", "plan.json"])
        .assert()
        .failure();
}
