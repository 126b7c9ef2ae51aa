//! Binary-surface tests for the `mcprobe` CLI
//!
//! Exercises the compiled binary end to end with `assert_cmd`: the happy
//! path against the stub server, the fail-fast path for a missing server
//! executable, and pre-spawn configuration errors.

use assert_cmd::Command;
use predicates::prelude::*;

/// A full probe run against the stub server prints labeled server lines and
/// a PASS verdict, and exits zero.
#[test]
fn test_probe_passes_against_stub_server() {
    let stub = env!("CARGO_BIN_EXE_stub_mcp_server");

    Command::cargo_bin("mcprobe")
        .unwrap()
        .args([
            "--tool",
            "echo",
            "--args",
            r#"{"message":"smoke"}"#,
            stub,
        ])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("SERVER:"))
        .stdout(predicate::str::contains("smoke"))
        .stdout(predicate::str::contains("PASS"));
}

/// A missing server executable must fail fast with a clear spawn error,
/// never hang.
#[test]
fn test_missing_executable_fails_fast() {
    Command::cargo_bin("mcprobe")
        .unwrap()
        .args(["/nonexistent/binary/that/does/not/exist", "mcp-server"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to spawn"));
}

/// Without a server on the CLI or in a config file, validation rejects the
/// run before anything is spawned.
#[test]
fn test_no_server_is_a_config_error() {
    Command::cargo_bin("mcprobe")
        .unwrap()
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .stderr(predicate::str::contains("server command is required"));
}

/// Malformed `--args` JSON is rejected before the server is spawned.
#[test]
fn test_malformed_args_json_rejected() {
    let stub = env!("CARGO_BIN_EXE_stub_mcp_server");

    Command::cargo_bin("mcprobe")
        .unwrap()
        .args(["--args", "{broken", stub])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

/// An unknown tool produces a FAIL verdict and a non-zero exit.
#[test]
fn test_unknown_tool_fails_with_fail_verdict() {
    let stub = env!("CARGO_BIN_EXE_stub_mcp_server");

    Command::cargo_bin("mcprobe")
        .unwrap()
        .args(["--tool", "no_such_tool", stub])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"));
}
