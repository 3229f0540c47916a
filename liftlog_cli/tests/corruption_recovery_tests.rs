//! Corruption recovery tests for the liftlog binary.
//!
//! These tests verify the system can handle:
//! - Corrupted storage files
//! - Unreadable individual records
//! - Missing and empty files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("liftlog"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_table_is_not_overwritten() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let workouts_path = data_dir.join("workouts.json");
    fs::write(&workouts_path, "{ invalid json }}}}").expect("Failed to write corrupted table");

    cli(data_dir)
        .args(["log", "squat:3x5@80"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt storage file"));

    // Reads fail too, and the unreadable file is left for manual recovery
    cli(data_dir).arg("history").assert().failure();
    assert_eq!(
        fs::read_to_string(&workouts_path).unwrap(),
        "{ invalid json }}}}"
    );
}

#[test]
fn test_unreadable_record_is_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["log", "lunge:3x10", "--date", "2024-05-02"])
        .assert()
        .success();

    // Splice a record that is valid JSON but not a workout into the table
    let path = data_dir.join("workouts.json");
    let mut table: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    table["garbage"] = serde_json::json!({ "date": "yesterday" });
    fs::write(&path, table.to_string()).unwrap();

    let output = cli(data_dir).arg("history").output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().lines().count(), 1);
}

#[test]
fn test_empty_files() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    for name in ["workouts.json", "exercises.json", "profile.json", "settings.json"] {
        fs::write(data_dir.join(name), "").unwrap();
    }

    cli(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts logged."));
    cli(data_dir)
        .args(["log", "crunch:2x15"])
        .assert()
        .success();
}

#[test]
fn test_missing_data_dir_is_created_on_first_write() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("does").join("not").join("exist");

    cli(&data_dir)
        .arg("recommend")
        .assert()
        .success();
    assert!(!data_dir.exists());

    cli(&data_dir)
        .args(["log", "walking:1x30"])
        .assert()
        .success();
    assert!(data_dir.join("workouts.json").exists());
}
