//! CLI integration tests for respo
//!
//! Tests the respo CLI commands end-to-end using assert_cmd. Every test
//! points RESPO_CONFIG_DIR at a scratch directory so nothing touches
//! the real config, and none of them reach the network.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a command with an isolated config directory
fn respo_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("respo").unwrap();
    cmd.env("RESPO_CONFIG_DIR", config_dir.path());
    cmd
}

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Triage paid research studies"));
}

#[test]
fn test_version_output() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["--version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("respo"));
}

#[test]
fn test_config_list_shows_defaults() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vendor.base_url = https://app.respondent.io"))
        .stdout(predicate::str::contains("search.show_eligible = true"))
        .stdout(predicate::str::contains("filter.range_policy = midpoint"));
}

#[test]
fn test_config_set_and_get_round_trip() {
    let dir = TempDir::new().unwrap();

    respo_cmd(&dir)
        .args(["config", "set", "vendor.profile_id", "prof-123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vendor.profile_id = prof-123"));

    respo_cmd(&dir)
        .args(["config", "get", "vendor.profile_id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prof-123"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["config", "set", "nope.nothing", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_config_reset() {
    let dir = TempDir::new().unwrap();

    respo_cmd(&dir)
        .args(["config", "set", "search.page_size", "10"])
        .assert()
        .success();

    respo_cmd(&dir)
        .args(["config", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reset to defaults"));

    respo_cmd(&dir)
        .args(["config", "get", "search.page_size"])
        .assert()
        .success()
        .stdout(predicate::str::contains("50"));
}

#[test]
fn test_config_path_points_into_config_dir() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_credentials_set_show_clear() {
    let dir = TempDir::new().unwrap();

    respo_cmd(&dir)
        .args([
            "credentials",
            "set",
            "--cookie",
            "connect.sid=s%3Asecret-session-value",
            "--authorization",
            "Bearer a-very-long-token-value-here",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Credential stored"));

    // Show must not leak the full secret values
    respo_cmd(&dir)
        .args(["credentials", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("connect.sid"))
        .stdout(predicate::str::contains("secret-session-value").not())
        .stdout(predicate::str::contains("token-value-here").not());

    respo_cmd(&dir)
        .args(["credentials", "clear"])
        .assert()
        .success();

    respo_cmd(&dir)
        .args(["credentials", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No credential stored"));
}

#[test]
fn test_credentials_set_requires_something() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["credentials", "set"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one --cookie"));
}

#[test]
fn test_credentials_set_rejects_malformed_cookie() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["credentials", "set", "--cookie", "not-a-pair"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME=VALUE"));
}

#[test]
fn test_credentials_set_rejects_bad_expiry() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args([
            "credentials",
            "set",
            "--cookie",
            "sid=abc",
            "--expires-at",
            "tomorrow",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RFC 3339"));
}

#[test]
fn test_auth_without_credential_fails_fast() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["auth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no stored credential"));
}

#[test]
fn test_hide_requires_a_criterion() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["hide"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("supply --id"));
}

#[test]
fn test_hide_rejects_id_combined_with_threshold() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["hide", "--id", "abc", "--hourly-rate", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be combined"));
}

#[test]
fn test_hide_rejects_unknown_research_kind() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["hide", "--not-kind", "telepathic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown research kind"));
}

#[test]
fn test_projects_without_credential_fails_fast() {
    let dir = TempDir::new().unwrap();
    respo_cmd(&dir)
        .args(["projects"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no stored credential"));
}
