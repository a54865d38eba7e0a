//! Integration tests for the privileged and unprivileged entry points.
//!
//! Whether the suite runs as root or not, each case fails before anything
//! on the host is modified: a non-root `provision` is refused, a root one
//! stops at the missing project directory, and `launch`/`doctor` stop at
//! the identity, interpreter or layout check.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::cli_tests::quant_deploy;

const KINDS: [&str; 4] = [
    "PrivilegeError",
    "EnvironmentError",
    "LayoutError",
    "ConfigError",
];

#[test]
fn test_provision_fails_without_writing_anything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("no-such-project");

    quant_deploy()
        .arg("provision")
        .env("DEPLOY_PROJECT_DIR", &missing)
        .env("DEPLOY_USER", "quant-deploy-test-user")
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"))
        .stderr(predicate::str::contains("hint:"));

    assert!(!missing.exists());
}

#[test]
fn test_launch_in_empty_home_exits_one() {
    let home = tempfile::tempdir().expect("tempdir");

    quant_deploy()
        .arg("launch")
        .env("HOME", home.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));

    assert!(
        !home.path().join(".streamlit").exists(),
        "nothing may be bootstrapped when preflight fails"
    );
}

#[test]
fn test_doctor_json_reports_typed_error() {
    let home = tempfile::tempdir().expect("tempdir");

    let output = quant_deploy()
        .args(["doctor", "--json"])
        .env("HOME", home.path())
        .output()
        .expect("run doctor");

    assert_eq!(output.status.code(), Some(1));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON on stdout");
    assert_eq!(doc["error"], true);
    let kind = doc["kind"].as_str().expect("kind");
    assert!(KINDS.contains(&kind), "unexpected kind {kind}");
    assert!(doc["hint"].as_str().is_some_and(|h| !h.is_empty()));
}

#[test]
fn test_identity_is_checked_before_configuration() {
    let home = tempfile::tempdir().expect("tempdir");
    let root = nix::unistd::geteuid().is_root();

    let output = quant_deploy()
        .args(["doctor", "--json"])
        .env("HOME", home.path())
        .env("DASHBOARD_PORT", "abc")
        .output()
        .expect("run doctor");
    assert_eq!(output.status.code(), Some(1));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON on stdout");
    let expected = if root { "PrivilegeError" } else { "ConfigError" };
    assert_eq!(doc["kind"], expected);

    let output = quant_deploy()
        .args(["provision", "--json"])
        .env("DASHBOARD_PORT", "abc")
        .env("DEPLOY_USER", "quant-deploy-test-user")
        .output()
        .expect("run provision");
    assert_eq!(output.status.code(), Some(1));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON on stdout");
    let expected = if root { "ConfigError" } else { "PrivilegeError" };
    assert_eq!(doc["kind"], expected);
}
