//! Tests for the runtime bootstrap that runs between preflight and launch.

#![allow(clippy::expect_used)]

use quant_deploy::application::services::bootstrap::{
    ensure_ui_config, ensure_venv, launch_spec, prepare_runtime,
};
use quant_deploy::domain::config::{DeployConfig, EnvOverrides};
use quant_deploy::domain::descriptors;

use crate::helpers::{config, config_with, err_output};
use crate::mocks::{MemFs, NoopReporter, RecordingRunner, WarnCollector};

#[tokio::test]
async fn test_launch_binds_default_port_when_env_unset() {
    let cfg = config();
    let fs = MemFs::new();
    let runner = RecordingRunner::healthy();

    let spec = prepare_runtime(&cfg, &runner, &fs, &NoopReporter)
        .await
        .expect("bootstrap succeeds");

    assert_eq!(spec.arg_value("--server.port"), Some("8501"));
    assert_eq!(spec.arg_value("--server.address"), Some("0.0.0.0"));
    assert_eq!(spec.program, cfg.venv_bin("streamlit"));
    assert_eq!(spec.working_dir, cfg.project_dir);
    assert_eq!(spec.args[..2], ["run", "ui/streamlit_ui.py"]);
}

#[tokio::test]
async fn test_bootstrap_runs_steps_in_order() {
    let cfg = config();
    let fs = MemFs::new();
    let runner = RecordingRunner::healthy();

    prepare_runtime(&cfg, &runner, &fs, &NoopReporter)
        .await
        .expect("bootstrap succeeds");

    let venv = cfg.venv_dir.display().to_string();
    let pip = cfg.venv_bin("pip").display().to_string();
    let python = cfg.venv_bin("python").display().to_string();
    let calls = runner.calls();
    assert_eq!(calls[0], format!("python3 -m venv {venv}"));
    assert_eq!(calls[1], format!("{pip} install --upgrade pip"));
    assert!(calls[2].starts_with(&format!("{pip} install --upgrade streamlit")));
    assert!(calls[3].starts_with(&format!("{python} -c import nltk")));
    assert!(calls[3].contains("vader_lexicon"));
}

#[tokio::test]
async fn test_existing_venv_is_reused() {
    let cfg = config();
    let fs = MemFs::new().with_file(cfg.venv_bin("python"), "", 0o755);
    let runner = RecordingRunner::healthy();

    let created = ensure_venv(&cfg, &runner, &fs, &NoopReporter)
        .await
        .expect("reuse");

    assert!(!created);
    assert!(!runner.called("python3 -m venv"));
}

#[tokio::test]
async fn test_requirements_file_is_preferred() {
    let cfg = config();
    let fs = MemFs::new().with_file(cfg.requirements_file(), "streamlit\n", 0o644);
    let runner = RecordingRunner::healthy();

    prepare_runtime(&cfg, &runner, &fs, &NoopReporter)
        .await
        .expect("bootstrap succeeds");

    let pip = cfg.venv_bin("pip").display().to_string();
    let requirements = cfg.requirements_file().display().to_string();
    assert!(runner.called(&format!("{pip} install --upgrade -r {requirements}")));
}

#[tokio::test]
async fn test_dependency_failure_is_fatal() {
    let cfg = config();
    let fs = MemFs::new();
    let pip = cfg.venv_bin("pip").display().to_string();
    let runner = RecordingRunner::healthy().on(&format!("{pip} install --upgrade streamlit"), || {
        Ok(err_output(1, b"ERROR: No matching distribution found for streamlit"))
    });

    let err = prepare_runtime(&cfg, &runner, &fs, &NoopReporter)
        .await
        .expect_err("pip failed");

    assert!(format!("{err:#}").contains("No matching distribution"));
    assert_eq!(fs.content(&cfg.ui_config_file), None);
}

#[tokio::test]
async fn test_data_fetch_failure_only_warns() {
    let cfg = config();
    let fs = MemFs::new();
    let python = cfg.venv_bin("python").display().to_string();
    let runner = RecordingRunner::healthy()
        .on(&format!("{python} -c"), || Ok(err_output(1, b"URLError")));
    let reporter = WarnCollector::default();

    prepare_runtime(&cfg, &runner, &fs, &reporter)
        .await
        .expect("data fetch failure is not fatal");

    let warnings = reporter.warnings.lock().expect("lock").clone();
    assert!(warnings.iter().any(|w| w.contains("vader_lexicon")));
}

#[test]
fn test_ui_config_is_created_with_configured_port() {
    let cfg = config_with(EnvOverrides {
        dashboard_port: Some("9000".to_string()),
        ..EnvOverrides::default()
    });
    let fs = MemFs::new();

    assert!(ensure_ui_config(&cfg, &fs).expect("create"));
    let content = fs.content(&cfg.ui_config_file).expect("written");
    assert!(content.contains("port = 9000"));
}

#[test]
fn test_existing_ui_config_is_never_overwritten() {
    let cfg = config();
    let fs = MemFs::new().with_file(&cfg.ui_config_file, "# mine\n", 0o644);

    assert!(!ensure_ui_config(&cfg, &fs).expect("keep"));
    assert_eq!(fs.content(&cfg.ui_config_file).as_deref(), Some("# mine\n"));
}

#[test]
fn test_browser_port_is_passed_only_when_set() {
    let cfg = config();
    assert_eq!(launch_spec(&cfg).arg_value("--browser.serverPort"), None);

    let cfg = config_with(EnvOverrides {
        streamlit_browser_server_port: Some("443".to_string()),
        ..EnvOverrides::default()
    });
    assert_eq!(launch_spec(&cfg).arg_value("--browser.serverPort"), Some("443"));
}

#[test]
fn test_launch_flags_override_environment() {
    let cfg = config_with(EnvOverrides {
        dashboard_port: Some("9000".to_string()),
        ..EnvOverrides::default()
    })
    .with_ui_overrides(Some("127.0.0.1".to_string()), Some("8600"))
    .expect("valid flags");

    let spec = launch_spec(&cfg);
    assert_eq!(spec.arg_value("--server.address"), Some("127.0.0.1"));
    assert_eq!(spec.arg_value("--server.port"), Some("8600"));
}

/// Environment the installed unit hands to `launch`: its `Environment=`
/// lines followed by the secrets file, later definitions winning.
fn unit_environment(unit: &str, env_file: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = unit
        .lines()
        .filter_map(|l| l.strip_prefix("Environment="))
        .filter_map(|kv| kv.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    pairs.extend(env_file.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
    pairs
}

#[test]
fn test_unit_lets_environment_file_choose_the_port() {
    let unit = descriptors::service_unit(&config());
    let exec = unit
        .lines()
        .find_map(|l| l.strip_prefix("ExecStart="))
        .expect("ExecStart present");
    let launch_args: Vec<&str> = exec.split_whitespace().skip(1).collect();
    assert_eq!(launch_args, ["launch"], "the unit must not pin the bind address");

    let env = EnvOverrides::from_pairs(unit_environment(
        &unit,
        &[("STREAMLIT_SERVER_PORT", "9100")],
    ))
    .expect("env");
    let cfg = DeployConfig::resolve(
        &env,
        std::path::Path::new(crate::helpers::HOME),
        "/usr/local/bin/quant-deploy".into(),
    )
    .expect("config");

    assert_eq!(launch_spec(&cfg).arg_value("--server.port"), Some("9100"));
}

#[test]
fn test_unit_defaults_apply_without_environment_file() {
    let unit = descriptors::service_unit(&config());
    let env = EnvOverrides::from_pairs(unit_environment(&unit, &[])).expect("env");
    let cfg = DeployConfig::resolve(
        &env,
        std::path::Path::new(crate::helpers::HOME),
        "/usr/local/bin/quant-deploy".into(),
    )
    .expect("config");

    let spec = launch_spec(&cfg);
    assert_eq!(spec.arg_value("--server.port"), Some("8501"));
    assert_eq!(spec.arg_value("--server.address"), Some("0.0.0.0"));
}
