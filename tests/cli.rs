use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const APP_JS: &str = "function run() {\n  console.log(\"a\", f(1,2));\n  console.log(\n    \"value:\", x\n  );\n  // console.log(\"kept\")\n  return 1;\n}\n";
const APP_JS_STRIPPED: &str = "function run() {\n  // console.log(\"kept\")\n  return 1;\n}\n";

fn setup_test_directory() -> tempfile::TempDir {
    let dir = tempdir().unwrap();

    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/app.js"), APP_JS).unwrap();
    fs::write(dir.path().join("src/clean.ts"), "export const a = 1;\n").unwrap();
    fs::write(
        dir.path().join("src/notes.txt"),
        "console.log(\"not a script\");\n",
    )
    .unwrap();

    fs::create_dir_all(dir.path().join("node_modules/dep")).unwrap();
    fs::write(
        dir.path().join("node_modules/dep/index.js"),
        "console.log(\"dependency\");\n",
    )
    .unwrap();

    dir
}

#[test]
fn test_no_arguments_prints_usage() {
    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_unknown_action_prints_usage() {
    let dir = setup_test_directory();

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path())
        .arg("purge")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage"));

    // Nothing was touched
    assert_eq!(fs::read_to_string(dir.path().join("src/app.js")).unwrap(), APP_JS);
}

#[test]
fn test_extra_arguments_print_usage() {
    let dir = setup_test_directory();

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path())
        .arg("delete")
        .arg("now")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage"));

    assert!(!dir.path().join("src/app.js.bak").exists());
}

#[test]
fn test_report_lists_matches() {
    let dir = setup_test_directory();
    let app = dir.path().join("src").join("app.js");

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "File: {}\nLine 2: console.log(\"a\", f(1,2));\n\n",
            app.display()
        )))
        .stdout(predicate::str::contains(format!(
            "File: {}\nLines 3-5:   console.log(\n    \"value:\", x\n  );\n\n",
            app.display()
        )))
        .stdout(predicate::str::contains("dependency").not())
        .stdout(predicate::str::contains("not a script").not())
        .stdout(predicate::str::contains("kept").not());

    // Report mode never writes
    assert_eq!(fs::read_to_string(&app).unwrap(), APP_JS);
    assert!(!dir.path().join("src/app.js.bak").exists());
}

#[test]
fn test_delete_strips_and_creates_backup() {
    let dir = setup_test_directory();
    let app = dir.path().join("src").join("app.js");
    let backup = dir.path().join("src").join("app.js.bak");

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path())
        .arg("delete")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Updated file: {} (backup created at {})\n",
            app.display(),
            backup.display()
        )));

    assert_eq!(fs::read_to_string(&app).unwrap(), APP_JS_STRIPPED);
    assert_eq!(fs::read_to_string(&backup).unwrap(), APP_JS);

    // Files without calls, skipped trees and other extensions are left alone
    assert!(!dir.path().join("src/clean.ts.bak").exists());
    assert!(!dir.path().join("src/notes.txt.bak").exists());
    assert!(!dir.path().join("node_modules/dep/index.js.bak").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("node_modules/dep/index.js")).unwrap(),
        "console.log(\"dependency\");\n"
    );
}

#[test]
fn test_delete_twice_changes_nothing_more() {
    let dir = setup_test_directory();

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path()).arg("delete").assert().success();

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path())
        .arg("delete")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    // The backup still holds the pre-delete original
    assert_eq!(
        fs::read_to_string(dir.path().join("src/app.js.bak")).unwrap(),
        APP_JS
    );
}

#[test]
fn test_revert_restores_original() {
    let dir = setup_test_directory();
    let app = dir.path().join("src").join("app.js");

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path()).arg("delete").assert().success();

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path())
        .arg("revert")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Reverted file: {} (backup deleted)\n",
            app.display()
        )));

    assert_eq!(fs::read(&app).unwrap(), APP_JS.as_bytes());
    assert!(!dir.path().join("src/app.js.bak").exists());
}

#[test]
fn test_revert_reaches_into_skipped_directories() {
    let dir = setup_test_directory();
    let dep = dir.path().join("node_modules/dep/index.js");
    fs::write(dir.path().join("node_modules/dep/index.js.bak"), "restored\n").unwrap();

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path())
        .arg("revert")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reverted file:"));

    assert_eq!(fs::read_to_string(&dep).unwrap(), "restored\n");
    assert!(!dir.path().join("node_modules/dep/index.js.bak").exists());
}

#[test]
fn test_missing_directory_fails() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path().join("does-not-exist"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error walking through directory"));
}

#[test]
fn test_long_statement_is_truncated() {
    let dir = tempdir().unwrap();
    let long = format!("console.log(\"{}\");\n", "y".repeat(700));
    fs::write(dir.path().join("long.js"), &long).unwrap();

    let expected = format!("Line 1: console.log(\"{}...\n", "y".repeat(497 - 13));

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(expected));
}

#[cfg(unix)]
#[test]
fn test_symlinked_root_is_walked() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("real")).unwrap();
    fs::write(dir.path().join("real/app.js"), "console.log(1);\n").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path().join("link"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Line 1: console.log(1);"));
}

#[cfg(unix)]
#[test]
fn test_delete_leaves_symlink_targets_alone() {
    let dir = setup_test_directory();
    let outside = tempdir().unwrap();
    let target = outside.path().join("shared.js");
    fs::write(&target, "console.log(\"shared\");\n").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("src/linked.js")).unwrap();

    let mut cmd = Command::cargo_bin("logstrip").unwrap();
    cmd.arg(dir.path())
        .arg("delete")
        .assert()
        .success()
        .stdout(predicate::str::contains("linked.js").not());

    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "console.log(\"shared\");\n"
    );
    assert!(!dir.path().join("src/linked.js.bak").exists());
    assert!(!outside.path().join("shared.js.bak").exists());
}
