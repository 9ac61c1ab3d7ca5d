//! Integration tests for the medmonitor binary.
//!
//! Each test runs against its own database and config file in a temp dir.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Env {
    _dir: TempDir,
    db: PathBuf,
    config: PathBuf,
}

/// Helper to create an isolated data directory
fn setup() -> Env {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("data").join("medmonitor.db");
    let config = dir.path().join("config.toml");
    fs::write(&config, "[dosing]\ndefault_quantity = 1\n").unwrap();
    Env {
        _dir: dir,
        db,
        config,
    }
}

impl Env {
    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("medmonitor"));
        cmd.arg("--db").arg(&self.db).arg("--config").arg(&self.config);
        cmd
    }

    fn add_user(&self, name: &str, age: &str) {
        self.cmd()
            .args(["add-user", "--name", name, "--age", age])
            .assert()
            .success();
    }

    fn add_medication(&self, inventory: &str, threshold: &str) {
        self.cmd()
            .args([
                "add-medication",
                "--user-id",
                "1",
                "--name",
                "Aspirin",
                "--dose",
                "1 tablet",
                "--timing",
                "08:00",
                "--inventory",
                inventory,
                "--refill-threshold",
                threshold,
            ])
            .assert()
            .success();
    }
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("medmonitor"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Medication inventory, dose history and reminders",
        ));
}

#[test]
fn test_creates_database_directory() {
    let env = setup();
    env.add_user("Anna", "34");
    assert!(env.db.exists());
}

#[test]
fn test_add_user_rejects_bad_age() {
    let env = setup();
    env.cmd()
        .args(["add-user", "--name", "Anna", "--age", "thirty"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("age must be a whole number"));
}

#[test]
fn test_search_users() {
    let env = setup();
    env.add_user("Anna", "34");
    env.add_user("Bob", "50");
    env.add_user("Susan", "61");

    env.cmd()
        .args(["search", "an"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Anna"))
        .stdout(predicate::str::contains("Susan"))
        .stdout(predicate::str::contains("Bob").not());
}

#[test]
fn test_take_then_postpone_signals_refill() {
    let env = setup();
    env.add_user("Anna", "34");
    env.add_medication("5", "5");

    env.cmd()
        .args(["take", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inventory: 4"))
        .stdout(predicate::str::contains("Refill needed: Aspirin has 4 left"));

    env.cmd()
        .args(["postpone", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inventory: 4"))
        .stdout(predicate::str::contains("Refill needed"));

    env.cmd()
        .args(["history", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("taken"))
        .stdout(predicate::str::contains("postponed"));
}

#[test]
fn test_take_without_refill() {
    let env = setup();
    env.add_user("Anna", "34");
    env.add_medication("30", "5");

    env.cmd()
        .args(["take", "1", "--quantity", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inventory: 28"))
        .stdout(predicate::str::contains("Refill needed").not());
}

#[test]
fn test_take_unknown_medication_fails() {
    let env = setup();
    env.cmd()
        .args(["take", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Medication not found: 99"));
}

#[test]
fn test_update_and_list_medication() {
    let env = setup();
    env.add_user("Anna", "34");
    env.add_medication("10", "");

    env.cmd()
        .args([
            "update-medication",
            "1",
            "--user-id",
            "1",
            "--name",
            "Aspirin",
            "--dose",
            "2 tablets",
            "--timing",
            "09:15",
            "--inventory",
            "40",
        ])
        .assert()
        .success();

    env.cmd()
        .args(["list", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 tablets"))
        .stdout(predicate::str::contains("09:15"));
}

#[test]
fn test_export_json() {
    let env = setup();
    env.add_user("Anna", "34");
    env.add_medication("10", "5");
    env.cmd().args(["skip", "1"]).assert().success();

    let output = env.cmd().args(["export"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["metadata"]["event_count"], 1);
    assert_eq!(json["medications"][0]["skipped"], 1);
    assert_eq!(json["medications"][0]["medication"]["inventory_count"], 10);
}

#[test]
fn test_export_csv() {
    let env = setup();
    env.add_user("Anna", "34");
    env.add_medication("10", "5");
    env.cmd().args(["take", "1"]).assert().success();

    env.cmd()
        .args(["export", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("medication_id,user_id"))
        .stdout(predicate::str::contains("Aspirin,taken"));
}

#[test]
fn test_watch_once() {
    let env = setup();
    env.cmd().args(["watch", "--once"]).assert().success();
}

#[test]
fn test_watch_rejects_zero_interval() {
    let env = setup();
    env.cmd()
        .args(["watch", "--interval", "0", "--once"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--interval"));
}
