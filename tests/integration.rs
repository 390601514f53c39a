use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_flag() {
    let mut cmd = Command::cargo_bin("nvsharptop").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("nvsharptop"))
        .stdout(predicate::str::contains("GPU dashboard"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("nvsharptop").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nvsharptop"));
}

#[test]
fn test_invalid_argument() {
    let mut cmd = Command::cargo_bin("nvsharptop").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_list_flag_succeeds_without_gpu() {
    // Works both with real hardware and on machines without nvidia-smi,
    // where it degrades to a notice instead of failing.
    let mut cmd = Command::cargo_bin("nvsharptop").unwrap();
    cmd.arg("--list").assert().success().stdout(
        predicate::str::contains("No GPU devices detected").or(predicate::str::contains(":")),
    );
}

#[test]
fn test_once_flag_succeeds_without_gpu() {
    let mut cmd = Command::cargo_bin("nvsharptop").unwrap();
    cmd.arg("--once").assert().success();
}

#[test]
fn test_invalid_interval_values_fall_back() {
    // Garbage numeric values fall back to documented defaults instead of
    // aborting argument parsing.
    let mut cmd = Command::cargo_bin("nvsharptop").unwrap();
    cmd.args(["-s", "garbage", "-d", "nope"])
        .arg("--list")
        .assert()
        .success();
}

#[test]
fn test_threshold_and_glyph_options_accepted() {
    let mut cmd = Command::cargo_bin("nvsharptop").unwrap();
    cmd.args(["--warn", "50", "--high", "90", "--background", "dot"])
        .arg("--list")
        .assert()
        .success();
}
