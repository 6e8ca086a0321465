//! End-to-end CLI tests for the casedocs binary.
//!
//! These only exercise argument handling; no test here touches the network.

use assert_cmd::Command;
use predicates::prelude::*;

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("casedocs").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("CMA case pages"))
        .stdout(predicate::str::contains("--out"))
        .stdout(predicate::str::contains("--only-derogations"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("casedocs").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("casedocs"));
}

/// Test that the output folder is mandatory.
#[test]
fn test_binary_missing_out_returns_error() {
    let mut cmd = Command::cargo_bin("casedocs").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--out"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("casedocs").unwrap();
    cmd.args(["--out", "bundle", "--invalid-flag"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that conflicting discovery modes are rejected before any work starts.
#[test]
fn test_binary_conflicting_modes_rejected() {
    let mut cmd = Command::cargo_bin("casedocs").unwrap();
    cmd.args([
        "--out",
        "bundle",
        "--all-merger-cases",
        "--all-merger-cases-with-outcomes",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot be used with"));
}

/// Test that conflicting category filters are rejected.
#[test]
fn test_binary_conflicting_filters_rejected() {
    let mut cmd = Command::cargo_bin("casedocs").unwrap();
    cmd.args([
        "--out",
        "bundle",
        "--only-derogations",
        "--only-full-text-decisions",
    ])
    .assert()
    .failure();
}

/// Test that an out-of-range delay is rejected.
#[test]
fn test_binary_delay_out_of_range_rejected() {
    let mut cmd = Command::cargo_bin("casedocs").unwrap();
    cmd.args(["--out", "bundle", "--delay-ms", "60001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("60001"));
}
