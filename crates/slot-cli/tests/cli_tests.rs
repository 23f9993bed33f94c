//! Integration tests for the `slots` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to run every subcommand
//! against the JSON event fixtures, with `--now` pinning the clock so the
//! future-only filter is deterministic.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

const NOW: &str = "2024-01-01T08:00:00Z";

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// A `slots` command with a pinned clock and no credential env leaking in.
fn slots() -> Command {
    let mut cmd = Command::cargo_bin("slots").unwrap();
    cmd.args(["--now", NOW])
        .env_remove("SLOTS_CONFIG")
        .env_remove("SLOTS_CREDENTIAL")
        .env_remove("SLOTS_CREDENTIAL_A")
        .env_remove("SLOTS_CREDENTIAL_B")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout must be JSON")
}

fn slot_starts(body: &serde_json::Value) -> Vec<String> {
    body["slots"]
        .as_array()
        .expect("slots array")
        .iter()
        .map(|s| s["start"].as_str().unwrap().to_string())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// suggest
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn suggest_skips_busy_morning() {
    let output = slots()
        .args(["suggest", "--credential", &fixture("alice.json"), "--days", "7"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let body = stdout_json(&output);
    // Standup and focus time both block the single-window search.
    assert_eq!(
        slot_starts(&body),
        vec![
            "2024-01-01T11:00:00Z",
            "2024-01-01T12:00:00Z",
            "2024-01-01T13:00:00Z",
            "2024-01-01T14:00:00Z",
            "2024-01-01T15:00:00Z",
        ]
    );
}

#[test]
fn suggest_reads_credential_from_env() {
    Command::cargo_bin("slots")
        .unwrap()
        .args(["--now", NOW, "suggest", "--days", "90"])
        .env("SLOTS_CREDENTIAL", fixture("alice.json"))
        .env_remove("SLOTS_CONFIG")
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-01T11:00:00Z"))
        .stdout(predicate::str::contains("2024-01-15T09:00:00Z"));
}

#[test]
fn suggest_honors_timezone_flag() {
    Command::cargo_bin("slots")
        .unwrap()
        .args([
            "--now",
            "2024-01-01T00:00:00Z",
            "--timezone",
            "Asia/Tokyo",
            "suggest",
            "--credential",
            &fixture("alice.json"),
            "--days",
            "1",
        ])
        .env_remove("SLOTS_CONFIG")
        .assert()
        .success()
        // 10:00 in Tokyo.
        .stdout(predicate::str::contains("2024-01-01T01:00:00Z"));
}

#[test]
fn suggest_uses_config_file() {
    let output = slots()
        .args(["--config", &fixture("config.json")])
        .args(["suggest", "--credential", &fixture("alice.json"), "--days", "7"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(slot_starts(&stdout_json(&output)).len(), 2);
}

#[test]
fn suggest_without_credential_is_validation_error() {
    slots()
        .args(["suggest", "--days", "7"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"error\""))
        .stdout(predicate::str::contains("Missing required field: credential"));
}

#[test]
fn suggest_with_zero_days_is_validation_error() {
    slots()
        .args(["suggest", "--credential", &fixture("alice.json"), "--days", "0"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("windowDays must be positive"));
}

#[test]
fn suggest_with_huge_days_is_validation_error() {
    slots()
        .args(["suggest", "--credential", &fixture("alice.json"), "--days", "4294967295"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("windowDays out of range"));
}

// ─────────────────────────────────────────────────────────────────────────────
// range / common
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn range_ignores_focus_time() {
    let output = slots()
        .args([
            "range",
            "--credential",
            &fixture("alice.json"),
            "--start",
            "2024-01-01T09:00:00Z",
            "--end",
            "2024-01-01T12:00:00Z",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        slot_starts(&stdout_json(&output)),
        vec!["2024-01-01T10:00:00Z", "2024-01-01T11:00:00Z"]
    );
}

#[test]
fn common_intersects_file_and_listing() {
    let output = slots()
        .args([
            "common",
            "--credential-a",
            &fixture("alice.json"),
            "--credential-b",
            &fixture("bob.json"),
            "--start",
            "2024-01-01T09:00:00Z",
            "--end",
            "2024-01-01T13:00:00Z",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        slot_starts(&stdout_json(&output)),
        vec!["2024-01-01T10:00:00Z", "2024-01-01T12:00:00Z"]
    );
}

#[test]
fn common_is_symmetric() {
    let run = |a: &str, b: &str| {
        let output = slots()
            .args([
                "common",
                "--credential-a",
                &fixture(a),
                "--credential-b",
                &fixture(b),
                "--start",
                "2024-01-01T09:00:00Z",
                "--end",
                "2024-01-01T18:00:00Z",
                "--max-count",
                "10",
            ])
            .output()
            .unwrap();
        stdout_json(&output)
    };

    assert_eq!(run("alice.json", "bob.json"), run("bob.json", "alice.json"));
}

#[test]
fn common_with_missing_file_is_upstream_error() {
    slots()
        .args([
            "common",
            "--credential-a",
            &fixture("alice.json"),
            "--credential-b",
            &fixture("nobody.json"),
            "--start",
            "2024-01-01T09:00:00Z",
            "--end",
            "2024-01-01T13:00:00Z",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Upstream fetch failed"));
}

#[test]
fn unparsable_event_file_is_upstream_error() {
    slots()
        .args([
            "range",
            "--credential",
            &fixture("not_json.json"),
            "--start",
            "2024-01-01T09:00:00Z",
            "--end",
            "2024-01-01T13:00:00Z",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("cannot parse"));
}

#[test]
fn inverted_range_is_validation_error() {
    slots()
        .args([
            "range",
            "--credential",
            &fixture("alice.json"),
            "--start",
            "2024-01-01T13:00:00Z",
            "--end",
            "2024-01-01T09:00:00Z",
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Invalid request"));
}

// ─────────────────────────────────────────────────────────────────────────────
// check / events
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_reports_busy_and_free() {
    let check = |start: &str, end: &str| {
        let output = slots()
            .args([
                "check",
                "--credential",
                &fixture("alice.json"),
                "--start",
                start,
                "--end",
                end,
            ])
            .output()
            .unwrap();
        assert!(output.status.success());
        stdout_json(&output)["ok"].as_bool().unwrap()
    };

    // Focus time counts for the check endpoint.
    assert!(!check("2024-01-01T10:30:00Z", "2024-01-01T11:30:00Z"));
    assert!(check("2024-01-01T12:00:00Z", "2024-01-01T13:00:00Z"));
}

#[test]
fn events_passes_records_through() {
    let output = slots()
        .args([
            "events",
            "--credential",
            &fixture("bob.json"),
            "--start",
            "2024-01-01T00:00:00Z",
            "--end",
            "2024-01-02T00:00:00Z",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let body = stdout_json(&output);
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["summary"], "1:1");
    assert_eq!(events[1]["transparency"], "transparent");
}

// ─────────────────────────────────────────────────────────────────────────────
// Global flags
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn unknown_timezone_fails() {
    slots()
        .args(["--timezone", "Nowhere/City", "suggest", "--days", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown timezone"));
}

#[test]
fn invalid_now_fails() {
    Command::cargo_bin("slots")
        .unwrap()
        .args(["--now", "yesterday", "suggest", "--days", "7"])
        .env_remove("SLOTS_CONFIG")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --now value"));
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("slots")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("suggest"))
        .stdout(predicate::str::contains("common"))
        .stdout(predicate::str::contains("check"));
}
