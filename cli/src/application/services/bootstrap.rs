//! Application service: runtime bootstrap after a successful preflight.
//!
//! Creates or reuses the virtual runtime directory, installs the dependency
//! set, fetches the sentiment lexicon, makes sure the UI configuration file
//! exists, and describes the UI process to start. Replacing the current
//! process with it is the caller's job.

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, LocalFs, ProgressReporter};
use crate::domain::config::{DEFAULT_DEPENDENCIES, DeployConfig, NLTK_DATASET, UI_ENTRYPOINT};
use crate::domain::descriptors;

const VENV_TIMEOUT: Duration = Duration::from_secs(300);
const PIP_TIMEOUT: Duration = Duration::from_secs(1800);
const DATA_FETCH_TIMEOUT: Duration = Duration::from_secs(600);

/// The UI process to exec into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    /// Value following `flag` in the argument list.
    #[must_use]
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Prepare the runtime and return the UI process description.
///
/// # Errors
///
/// Returns an error if the virtual environment cannot be created, the
/// dependency installation fails, or the UI config file cannot be written.
/// A failed data-asset fetch is reported as a warning only.
pub async fn prepare_runtime(
    cfg: &DeployConfig,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<LaunchSpec> {
    ensure_venv(cfg, runner, fs, reporter).await?;
    install_dependencies(cfg, runner, fs, reporter).await?;
    fetch_data_assets(cfg, runner, reporter).await;
    if ensure_ui_config(cfg, fs)? {
        reporter.success(&format!("created {}", cfg.ui_config_file.display()));
    }
    Ok(launch_spec(cfg))
}

/// Create the virtual runtime directory unless it already holds an interpreter.
///
/// Returns `true` when a new environment was created.
///
/// # Errors
///
/// Returns an error if `python -m venv` fails.
pub async fn ensure_venv(
    cfg: &DeployConfig,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<bool> {
    if fs.exists(&cfg.venv_bin("python")) {
        tracing::debug!(venv = %cfg.venv_dir.display(), "reusing virtual environment");
        return Ok(false);
    }
    reporter.step(&format!(
        "creating virtual environment in {}...",
        cfg.venv_dir.display()
    ));
    let venv = cfg.venv_dir.display().to_string();
    let output = runner
        .run_with_timeout(&cfg.python, &["-m", "venv", &venv], VENV_TIMEOUT)
        .await
        .context("creating virtual environment")?;
    ensure_success(&output, "python -m venv")?;
    tracing::info!(venv = %venv, "virtual environment created");
    Ok(true)
}

/// Upgrade pip, then install `requirements.txt` or the built-in dependency set.
///
/// # Errors
///
/// Returns an error with pip's stderr if either installation fails.
pub async fn install_dependencies(
    cfg: &DeployConfig,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let pip = cfg.venv_bin("pip").display().to_string();

    reporter.step("upgrading pip...");
    let output = runner
        .run_with_timeout(&pip, &["install", "--upgrade", "pip"], PIP_TIMEOUT)
        .await
        .context("upgrading pip")?;
    ensure_success(&output, "pip install --upgrade pip")?;

    let requirements = cfg.requirements_file();
    let output = if fs.exists(&requirements) {
        reporter.step(&format!("installing {}...", requirements.display()));
        let requirements = requirements.display().to_string();
        runner
            .run_with_timeout(
                &pip,
                &["install", "--upgrade", "-r", &requirements],
                PIP_TIMEOUT,
            )
            .await
    } else {
        reporter.step("installing dashboard dependencies...");
        let mut args = vec!["install", "--upgrade"];
        args.extend_from_slice(DEFAULT_DEPENDENCIES);
        runner.run_with_timeout(&pip, &args, PIP_TIMEOUT).await
    }
    .context("installing dependencies")?;
    ensure_success(&output, "pip install")?;

    reporter.success("dependencies installed");
    Ok(())
}

/// Download the sentiment lexicon. NLTK skips datasets already present.
pub async fn fetch_data_assets(
    cfg: &DeployConfig,
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
) {
    let python = cfg.venv_bin("python").display().to_string();
    let script = format!("import nltk; nltk.download('{NLTK_DATASET}', quiet=True)");
    reporter.step(&format!("fetching {NLTK_DATASET}..."));
    let result = runner
        .run_with_timeout(&python, &["-c", &script], DATA_FETCH_TIMEOUT)
        .await
        .and_then(|output| ensure_success(&output, "nltk.download"));
    if let Err(e) = result {
        tracing::warn!(error = %format!("{e:#}"), "data asset fetch failed");
        reporter.warn(&format!(
            "could not fetch {NLTK_DATASET}; sentiment analysis may be unavailable"
        ));
    }
}

/// Write the UI config file from its template if it does not exist yet.
///
/// Returns `true` when the file was created. An existing file is never touched.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created.
pub fn ensure_ui_config(cfg: &DeployConfig, fs: &impl LocalFs) -> Result<bool> {
    let path = &cfg.ui_config_file;
    if fs.exists(path) {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.write(path, &descriptors::ui_config(cfg))?;
    tracing::info!(path = %path.display(), port = cfg.ui.port, "UI config created");
    Ok(true)
}

/// Describe the UI process bound to the configured address.
#[must_use]
pub fn launch_spec(cfg: &DeployConfig) -> LaunchSpec {
    let mut args = vec![
        "run".to_string(),
        UI_ENTRYPOINT.to_string(),
        "--server.address".to_string(),
        cfg.ui.host.clone(),
        "--server.port".to_string(),
        cfg.ui.port.to_string(),
        "--server.headless".to_string(),
        "true".to_string(),
    ];
    if let Some(browser_port) = cfg.ui.browser_port {
        args.push("--browser.serverPort".to_string());
        args.push(browser_port.to_string());
    }
    LaunchSpec {
        program: cfg.venv_bin("streamlit"),
        args,
        working_dir: cfg.project_dir.clone(),
        env: vec![("PYTHONUNBUFFERED".to_string(), "1".to_string())],
    }
}

fn ensure_success(output: &Output, what: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let tail: Vec<&str> = stderr.lines().rev().take(20).collect();
    let tail: Vec<&str> = tail.into_iter().rev().collect();
    anyhow::bail!("{what} failed ({})\n{}", output.status, tail.join("\n"));
}
