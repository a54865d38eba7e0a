//! Tests for the `preflight` application service.
//!
//! Checks run in a fixed order and stop at the first failure; only the
//! permission step mutates anything.

#![allow(clippy::expect_used)]

use quant_deploy::application::services::preflight::run_preflight;
use quant_deploy::domain::config::{DeployConfig, REQUIRED_PROJECT_DIRS};
use quant_deploy::domain::error::ErrorKind;
use quant_deploy::domain::preflight::CheckName;

use crate::helpers::{VALID_SECRETS, config, err_output, ok_output};
use crate::mocks::{MemFs, NoopReporter, ROOT, RecordingRunner, TRADER, WarnCollector};

/// A filesystem with the full project layout and the given secrets file.
fn host(cfg: &DeployConfig, secrets: Option<(&str, u32)>) -> MemFs {
    let mut fs = MemFs::new().with_dir(&cfg.project_dir);
    for dir in REQUIRED_PROJECT_DIRS {
        fs = fs.with_dir(cfg.project_dir.join(dir));
    }
    match secrets {
        Some((content, mode)) => fs.with_file(&cfg.secrets_file, content, mode),
        None => fs,
    }
}

#[tokio::test]
async fn test_preflight_passes_every_check_in_order() {
    let cfg = config();
    let fs = host(&cfg, Some((VALID_SECRETS, 0o600)));
    let runner = RecordingRunner::healthy();

    let report = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter)
        .await
        .expect("preflight passes");

    assert_eq!(report.passed, CheckName::ORDER.to_vec());
    assert_eq!(report.interpreter_version, "3.11.4");
    assert!(!report.permissions_tightened);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn test_preflight_as_root_fails_before_running_anything() {
    let cfg = config();
    let fs = host(&cfg, Some((VALID_SECRETS, 0o644)));
    let runner = RecordingRunner::healthy();

    let err = run_preflight(&cfg, &ROOT, &runner, &fs, &NoopReporter)
        .await
        .expect_err("root must be rejected");

    assert_eq!(err.kind(), ErrorKind::PrivilegeError);
    assert!(runner.calls().is_empty(), "no command may run as root");
    assert_eq!(fs.file_mode(&cfg.secrets_file), Some(0o644), "nothing mutated");
}

#[tokio::test]
async fn test_preflight_rejects_old_interpreter() {
    let cfg = config();
    let fs = host(&cfg, Some((VALID_SECRETS, 0o600)));
    let runner = RecordingRunner::new().on("python3 --version", || Ok(ok_output(b"Python 3.8.10\n")));

    let err = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter)
        .await
        .expect_err("3.8 is too old");

    assert_eq!(err.kind(), ErrorKind::EnvironmentError);
    assert!(err.message().contains("3.8.10"));
}

#[tokio::test]
async fn test_preflight_reads_version_from_stderr() {
    let cfg = config();
    let fs = host(&cfg, Some((VALID_SECRETS, 0o600)));
    let runner = RecordingRunner::new().on("python3 --version", || {
        Ok(std::process::Output {
            status: crate::helpers::exit_status(0),
            stdout: Vec::new(),
            stderr: b"Python 3.9.0\n".to_vec(),
        })
    });

    let report = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter)
        .await
        .expect("older interpreters print the version on stderr");
    assert_eq!(report.interpreter_version, "3.9.0");
}

#[tokio::test]
async fn test_preflight_missing_interpreter_is_environment_error() {
    let cfg = config();
    let fs = host(&cfg, Some((VALID_SECRETS, 0o600)));
    let runner = RecordingRunner::new().on("python3", || anyhow::bail!("failed to spawn python3"));

    let err = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter)
        .await
        .expect_err("no interpreter");
    assert_eq!(err.kind(), ErrorKind::EnvironmentError);
}

#[tokio::test]
async fn test_preflight_names_every_missing_directory() {
    let cfg = config();
    let fs = MemFs::new()
        .with_dir(&cfg.project_dir)
        .with_dir(cfg.project_dir.join("core"))
        .with_dir(cfg.project_dir.join("ui"))
        .with_file(&cfg.secrets_file, VALID_SECRETS, 0o600);
    let runner = RecordingRunner::healthy();

    let err = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter)
        .await
        .expect_err("layout incomplete");

    assert_eq!(err.kind(), ErrorKind::LayoutError);
    for dir in ["backtesting", "config", "data", "execution", "strategies"] {
        assert!(err.message().contains(dir), "{dir} missing from: {}", err.message());
    }
    assert!(!err.message().contains("core"));
}

#[tokio::test]
async fn test_preflight_absent_secrets_names_the_exact_path() {
    let cfg = config();
    let fs = host(&cfg, None);
    let runner = RecordingRunner::healthy();

    let err = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter)
        .await
        .expect_err("secrets absent");

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    let expected = "/home/trader/.config/doge_quant/.env";
    assert!(
        err.message().contains(expected) || err.hint().contains(expected),
        "diagnostic must name {expected}: {err}"
    );
}

#[tokio::test]
async fn test_preflight_missing_key_is_config_error() {
    let cfg = config();
    let fs = host(&cfg, Some(("OKX_API_KEY=key\nOKX_SECRET_KEY=secret\n", 0o600)));
    let runner = RecordingRunner::healthy();

    let err = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter)
        .await
        .expect_err("passphrase missing");

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert!(err.message().contains("OKX_PASSPHRASE"));
}

#[tokio::test]
async fn test_preflight_empty_value_counts_as_missing() {
    let cfg = config();
    let secrets = "OKX_API_KEY=key\nOKX_SECRET_KEY=\nOKX_PASSPHRASE=phrase\n";
    let fs = host(&cfg, Some((secrets, 0o600)));
    let runner = RecordingRunner::healthy();

    let err = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter)
        .await
        .expect_err("empty secret key");
    assert!(err.message().contains("OKX_SECRET_KEY"));
}

#[tokio::test]
async fn test_preflight_tightens_world_readable_secrets() {
    let cfg = config();
    let fs = host(&cfg, Some((VALID_SECRETS, 0o644)));
    let runner = RecordingRunner::healthy();

    let report = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter)
        .await
        .expect("permissions are fixed, not fatal");

    assert!(report.permissions_tightened);
    assert_eq!(fs.file_mode(&cfg.secrets_file), Some(0o600));
}

#[tokio::test]
async fn test_preflight_tightens_even_when_a_key_is_missing() {
    let cfg = config();
    let fs = host(&cfg, Some(("OKX_API_KEY=key\n", 0o664)));
    let runner = RecordingRunner::healthy();

    let _ = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter).await;
    assert_eq!(fs.file_mode(&cfg.secrets_file), Some(0o600));
}

#[tokio::test]
async fn test_preflight_warns_when_twitter_token_is_absent() {
    let cfg = config();
    let secrets = "OKX_API_KEY=key\nOKX_SECRET_KEY=secret\nOKX_PASSPHRASE=phrase\n";
    let fs = host(&cfg, Some((secrets, 0o600)));
    let runner = RecordingRunner::healthy();
    let reporter = WarnCollector::default();

    let report = run_preflight(&cfg, &TRADER, &runner, &fs, &reporter)
        .await
        .expect("warning is not fatal");

    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("TWITTER_BEARER_TOKEN"));
    let seen = reporter.warnings.lock().expect("lock").clone();
    assert!(seen.iter().any(|w| w.contains("TWITTER_BEARER_TOKEN")));
}

#[tokio::test]
async fn test_preflight_failing_version_check_is_environment_error() {
    let cfg = config();
    let fs = host(&cfg, Some((VALID_SECRETS, 0o600)));
    let runner = RecordingRunner::new().on("python3 --version", || Ok(err_output(127, b"not found")));

    let err = run_preflight(&cfg, &TRADER, &runner, &fs, &NoopReporter)
        .await
        .expect_err("version check failed");
    assert_eq!(err.kind(), ErrorKind::EnvironmentError);
}
