//! Application service: preflight validation use-case.
//!
//! Gathers facts through ports and feeds them to the pure predicates in
//! `crate::domain::preflight`, in fixed order, stopping at the first failure.
//! The only mutation is forcing the secrets file to mode `0600`.

use crate::application::ports::{CommandRunner, HostIdentity, LocalFs, ProgressReporter};
use crate::domain::config::{DeployConfig, REQUIRED_PROJECT_DIRS};
use crate::domain::error::DeployError;
use crate::domain::preflight::{
    CheckName, PreflightReport, Role, check_identity, check_interpreter, check_layout,
    check_secrets_content, check_secrets_present,
};
use crate::domain::secrets::{OWNER_ONLY_MODE, Secrets, is_owner_only};

/// Run every launcher precondition.
///
/// # Errors
///
/// Returns the typed error of the first failing check; later checks are not run.
pub async fn run_preflight(
    cfg: &DeployConfig,
    identity: &impl HostIdentity,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<PreflightReport, DeployError> {
    let mut passed = Vec::with_capacity(CheckName::ORDER.len());

    reporter.step("checking execution identity...");
    check_identity(Role::Launcher, identity.effective_uid())?;
    passed.push(CheckName::Identity);

    reporter.step(&format!("checking {}...", cfg.python));
    let version_output = interpreter_version_output(runner, &cfg.python).await;
    let version = check_interpreter(&cfg.python, version_output.as_deref())?;
    tracing::debug!(%version, python = %cfg.python, "interpreter resolved");
    passed.push(CheckName::Interpreter);

    reporter.step("checking project layout...");
    let missing: Vec<&str> = REQUIRED_PROJECT_DIRS
        .iter()
        .copied()
        .filter(|d| !fs.is_dir(&cfg.project_dir.join(d)))
        .collect();
    check_layout(&cfg.project_dir, &missing)?;
    passed.push(CheckName::Layout);

    reporter.step("checking secrets file...");
    check_secrets_present(&cfg.secrets_file, fs.exists(&cfg.secrets_file))?;
    passed.push(CheckName::SecretsPresent);

    let permissions_tightened = enforce_owner_only(cfg, fs)?;
    if permissions_tightened {
        reporter.warn(&format!(
            "restricted {} to owner read/write (0600)",
            cfg.secrets_file.display()
        ));
    }
    passed.push(CheckName::SecretsPermissions);

    let content = fs.read_to_string(&cfg.secrets_file).map_err(|e| {
        DeployError::config(
            format!("cannot read secrets file {}: {e:#}", cfg.secrets_file.display()),
            "make sure the file is readable by the service user",
        )
    })?;
    let secrets = Secrets::parse(&content);
    check_secrets_content(&cfg.secrets_file, &secrets)?;
    passed.push(CheckName::SecretsContent);

    let warnings = secrets.warnings();
    for warning in &warnings {
        tracing::warn!("{warning}");
        reporter.warn(warning);
    }

    reporter.success("preflight checks passed");
    Ok(PreflightReport {
        passed,
        interpreter_version: version.to_string(),
        permissions_tightened,
        warnings,
    })
}

/// Combined stdout/stderr of `<python> --version`, or `None` if it did not run cleanly.
async fn interpreter_version_output(runner: &impl CommandRunner, python: &str) -> Option<String> {
    match runner.run(python, &["--version"]).await {
        Ok(output) if output.status.success() => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            Some(text)
        }
        Ok(output) => {
            tracing::debug!(status = %output.status, "{python} --version failed");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "{python} could not be spawned");
            None
        }
    }
}

/// Force mode `0600`. Returns whether the mode had to change.
fn enforce_owner_only(cfg: &DeployConfig, fs: &impl LocalFs) -> Result<bool, DeployError> {
    let path = &cfg.secrets_file;
    let was_owner_only = fs.mode(path).is_ok_and(is_owner_only);
    fs.set_permissions(path, OWNER_ONLY_MODE).map_err(|e| {
        DeployError::config(
            format!("cannot restrict permissions on {}: {e:#}", path.display()),
            format!("run: chmod 600 {}", path.display()),
        )
    })?;
    if !was_owner_only {
        tracing::info!(path = %path.display(), "secrets file permissions tightened");
    }
    Ok(!was_owner_only)
}
