//! Integration tests for the `slots` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the compute,
//! check, and cancel subcommands through the actual binary, including
//! stdin/stdout piping, file I/O, clock pinning, and error exits.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use chrono::DateTime;
use predicates::prelude::*;
use serde_json::Value;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn slots() -> Command {
    let mut cmd = Command::cargo_bin("slots").unwrap();
    cmd.env_remove("SLOTS_LOG");
    cmd
}

fn slot_starts(stdout: &[u8]) -> Vec<String> {
    let groups: Value = serde_json::from_slice(stdout).expect("stdout must be JSON");
    groups
        .as_array()
        .expect("top level must be an array")
        .iter()
        .flat_map(|g| g["hours"].as_array().unwrap().iter())
        .map(|s| {
            let start = s["start"].as_str().unwrap();
            DateTime::parse_from_rfc3339(start).unwrap().to_rfc3339()
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Compute subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn compute_file_to_stdout() {
    let output = slots()
        .args(["compute", "-i", &fixture("workday.json")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let starts = slot_starts(&output);
    // 09:00..16:30 is 16 slots; the 12:00-13:00 booking removes two.
    assert_eq!(starts.len(), 14);
    assert_eq!(starts[0], "2024-01-01T09:00:00+00:00");
    assert!(!starts.contains(&"2024-01-01T12:00:00+00:00".to_string()));
    assert!(!starts.contains(&"2024-01-01T12:30:00+00:00".to_string()));
    assert!(starts.contains(&"2024-01-01T13:00:00+00:00".to_string()));
}

#[test]
fn compute_stdin_to_stdout() {
    let input = r#"{
        "start": "2024-01-01T00:00:00Z",
        "end": "2024-01-01T02:00:00Z",
        "now": "2023-12-31T00:00:00Z"
    }"#;

    let output = slots()
        .arg("compute")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(slot_starts(&output).len(), 4);
}

#[test]
fn compute_file_to_file() {
    let output_path = std::env::temp_dir().join("slots-test-compute-output.json");
    let _ = std::fs::remove_file(&output_path);

    slots()
        .args(["compute", "-i", &fixture("workday.json"), "-o"])
        .arg(&output_path)
        .assert()
        .success();

    let content = std::fs::read(&output_path).expect("output file must exist");
    assert_eq!(slot_starts(&content).len(), 14);

    let _ = std::fs::remove_file(&output_path);
}

#[test]
fn compute_pretty_prints() {
    slots()
        .args(["compute", "--pretty", "-i", &fixture("workday.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  {"))
        .stdout(predicate::str::contains("\"hours\""));
}

#[test]
fn compute_slot_minutes_override() {
    let output = slots()
        .args(["compute", "--slot-minutes", "60", "-i", &fixture("workday.json")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    // 09..16 hourly is 8 slots; the 12:00 booking removes one.
    assert_eq!(slot_starts(&output).len(), 7);
}

#[test]
fn compute_now_flag_overrides_request() {
    let output = slots()
        .args([
            "compute",
            "--now",
            "2024-01-01T15:10:00Z",
            "-i",
            &fixture("workday.json"),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(
        slot_starts(&output),
        vec!["2024-01-01T15:30:00+00:00", "2024-01-01T16:00:00+00:00", "2024-01-01T16:30:00+00:00"]
    );
}

#[test]
fn compute_named_timezone_shifts_output() {
    let input = r#"{
        "start": "2024-01-01T00:00:00Z",
        "end": "2024-01-01T01:00:00Z",
        "timezone": "Europe/Berlin",
        "now": "2023-12-31T00:00:00Z"
    }"#;

    slots()
        .arg("compute")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-01T01:00:00+01:00"));
}

#[test]
fn compute_empty_availability_prints_empty_array() {
    let input = r#"{
        "start": "2024-01-01T00:00:00Z",
        "end": "2024-01-02T00:00:00Z",
        "availability": []
    }"#;

    slots()
        .arg("compute")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn compute_inverted_range_fails() {
    let input = r#"{"start": "2024-01-02T00:00:00Z", "end": "2024-01-01T00:00:00Z"}"#;

    slots()
        .arg("compute")
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to compute slots"));
}

#[test]
fn compute_bad_slot_length_fails() {
    slots()
        .args(["compute", "--slot-minutes", "45", "-i", &fixture("workday.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("45"));
}

#[test]
fn compute_unknown_timezone_fails() {
    let input = r#"{
        "start": "2024-01-01T00:00:00Z",
        "end": "2024-01-02T00:00:00Z",
        "timezone": "Mars/Olympus"
    }"#;

    slots()
        .arg("compute")
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Mars/Olympus"));
}

#[test]
fn compute_invalid_json_fails() {
    slots()
        .arg("compute")
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse slot request"));
}

#[test]
fn compute_missing_file_fails() {
    slots()
        .args(["compute", "-i", "/nonexistent/request.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn invalid_now_flag_fails() {
    slots()
        .args(["compute", "--now", "yesterday", "-i", &fixture("workday.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --now value"));
}

#[test]
fn debug_logging_goes_to_stderr() {
    let output = slots()
        .args(["--log-level", "debug", "compute", "-i", &fixture("workday.json")])
        .assert()
        .success()
        .stderr(predicate::str::is_empty().not())
        .get_output()
        .stdout
        .clone();

    assert_eq!(slot_starts(&output).len(), 14);
}

// ─────────────────────────────────────────────────────────────────────────────
// Check subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_admits_open_slot() {
    slots()
        .args(["check", "-i", &fixture("booking.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"admitted\""))
        .stdout(predicate::str::contains("2024-01-01T10:00:00"));
}

#[test]
fn check_rejects_conflict() {
    let booking = std::fs::read_to_string(fixture("booking.json")).unwrap();
    let conflicting = booking
        .replace("2024-01-01T10:00:00+00:00", "2024-01-01T12:00:00+00:00")
        .replace("2024-01-01T10:30:00+00:00", "2024-01-01T12:30:00+00:00");

    slots()
        .arg("check")
        .write_stdin(conflicting)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Booking rejected"));
}

#[test]
fn check_rejects_past_request_with_pinned_clock() {
    slots()
        .args([
            "check",
            "--now",
            "2024-01-01T11:00:00Z",
            "-i",
            &fixture("booking.json"),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Booking rejected"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Cancel subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn cancel_well_in_advance_succeeds() {
    slots()
        .args([
            "cancel",
            "--now",
            "2024-01-01T09:00:00Z",
            "-i",
            &fixture("session.json"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff("ok\n"));
}

#[test]
fn cancel_at_start_fails() {
    slots()
        .args([
            "cancel",
            "--now",
            "2024-01-01T09:59:30Z",
            "-i",
            &fixture("session.json"),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cancellation rejected"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Usage
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn no_subcommand_shows_usage() {
    slots()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn version_flag() {
    slots()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("slots"));
}
