//! Preflight predicates: pure functions, no I/O, no async.
//!
//! Each predicate takes already-gathered facts and returns `Ok` or a typed
//! [`DeployError`]. The application service gathers the facts through ports
//! and runs the predicates in [`CheckName::ORDER`], stopping at the first
//! failure.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::domain::config::{MIN_PYTHON_VERSION, REQUIRED_SECRET_KEYS};
use crate::domain::error::DeployError;
use crate::domain::secrets::{Secrets, example_content};

/// Named preflight steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckName {
    Identity,
    Interpreter,
    Layout,
    SecretsPresent,
    SecretsPermissions,
    SecretsContent,
}

impl CheckName {
    pub const ORDER: [CheckName; 6] = [
        CheckName::Identity,
        CheckName::Interpreter,
        CheckName::Layout,
        CheckName::SecretsPresent,
        CheckName::SecretsPermissions,
        CheckName::SecretsContent,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Interpreter => "interpreter",
            Self::Layout => "layout",
            Self::SecretsPresent => "secrets-present",
            Self::SecretsPermissions => "secrets-permissions",
            Self::SecretsContent => "secrets-content",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the privilege boundary a step belongs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Installs system descriptors; requires root.
    Provisioner,
    /// Runs the dashboard; forbids root.
    Launcher,
}

/// Outcome of a successful preflight run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    pub passed: Vec<CheckName>,
    pub interpreter_version: String,
    /// `true` when the secrets file mode had to be changed to `0600`.
    pub permissions_tightened: bool,
    pub warnings: Vec<String>,
}

// ── Predicates ───────────────────────────────────────────────────────────────

/// Enforce the identity rule for `role` given the effective uid.
///
/// # Errors
///
/// `PrivilegeError` when the provisioner is not root or the launcher is root.
pub fn check_identity(role: Role, euid: u32) -> Result<(), DeployError> {
    match (role, euid == 0) {
        (Role::Provisioner, false) => Err(DeployError::privilege(
            format!("provisioning must run as root (effective uid is {euid})"),
            "re-run with: sudo quant-deploy provision",
        )),
        (Role::Launcher, true) => Err(DeployError::privilege(
            "the dashboard must not run as root",
            "run as the service user, e.g.: sudo -u ubuntu quant-deploy launch",
        )),
        _ => Ok(()),
    }
}

/// Extract a version from `Python 3.10.12`-style output.
///
/// Pre-release suffixes such as `3.13.0rc1` are truncated to their numeric
/// part; a missing patch component counts as `0`.
#[must_use]
pub fn parse_interpreter_version(output: &str) -> Option<semver::Version> {
    let token = output
        .split_whitespace()
        .find(|t| t.starts_with(|c: char| c.is_ascii_digit()))?;
    let mut parts = token.split('.').map(|p| {
        let digits: String = p.chars().take_while(char::is_ascii_digit).collect();
        digits.parse::<u64>().ok()
    });
    let major = parts.next().flatten()?;
    let minor = parts.next().flatten()?;
    let patch = parts.next().flatten().unwrap_or(0);
    Some(semver::Version::new(major, minor, patch))
}

/// Require a resolvable interpreter at or above the minimum version.
///
/// `version_output` is `None` when the program could not be run at all.
///
/// # Errors
///
/// `EnvironmentError` when the interpreter is missing, unparsable or too old.
pub fn check_interpreter(
    program: &str,
    version_output: Option<&str>,
) -> Result<semver::Version, DeployError> {
    let hint = format!(
        "install Python {}.{} or newer and make sure `{program}` is on PATH \
         (or set DEPLOY_PYTHON)",
        MIN_PYTHON_VERSION.major, MIN_PYTHON_VERSION.minor
    );
    let Some(output) = version_output else {
        return Err(DeployError::environment(
            format!("`{program}` was not found on PATH"),
            hint,
        ));
    };
    let Some(version) = parse_interpreter_version(output) else {
        return Err(DeployError::environment(
            format!("cannot determine the version of `{program}` from: {}", output.trim()),
            hint,
        ));
    };
    if version < MIN_PYTHON_VERSION {
        return Err(DeployError::environment(
            format!("`{program}` is version {version}, need {MIN_PYTHON_VERSION} or newer"),
            hint,
        ));
    }
    Ok(version)
}

/// Require every expected project directory.
///
/// # Errors
///
/// `LayoutError` listing all missing directories.
pub fn check_layout(project_dir: &Path, missing: &[&str]) -> Result<(), DeployError> {
    if missing.is_empty() {
        return Ok(());
    }
    Err(DeployError::layout(
        format!(
            "project directory {} is missing: {}",
            project_dir.display(),
            missing.join(", ")
        ),
        "check out the complete doge_quant project there, or set DEPLOY_PROJECT_DIR",
    ))
}

/// Require the project directory itself (provisioning).
///
/// # Errors
///
/// `LayoutError` when the directory does not exist.
pub fn check_project_dir(project_dir: &Path, exists: bool) -> Result<(), DeployError> {
    if exists {
        return Ok(());
    }
    Err(DeployError::layout(
        format!("project directory {} does not exist", project_dir.display()),
        "clone the project first, or set DEPLOY_PROJECT_DIR",
    ))
}

/// Require the secrets file.
///
/// # Errors
///
/// `ConfigError` naming the exact expected path.
pub fn check_secrets_present(path: &Path, exists: bool) -> Result<(), DeployError> {
    if exists {
        return Ok(());
    }
    Err(DeployError::config(
        format!("secrets file not found: {}", path.display()),
        format!(
            "create {} containing\n{}then run: chmod 600 {}",
            path.display(),
            indent(&example_content(REQUIRED_SECRET_KEYS)),
            path.display()
        ),
    ))
}

/// Require every credential key.
///
/// # Errors
///
/// `ConfigError` listing the missing keys.
pub fn check_secrets_content(path: &Path, secrets: &Secrets) -> Result<(), DeployError> {
    let missing = secrets.missing_keys(REQUIRED_SECRET_KEYS);
    if missing.is_empty() {
        return Ok(());
    }
    Err(DeployError::config(
        format!(
            "secrets file {} is missing required keys: {}",
            path.display(),
            missing.join(", ")
        ),
        format!("add non-empty values for {} to {}", missing.join(", "), path.display()),
    ))
}

fn indent(block: &str) -> String {
    block.lines().fold(String::new(), |mut out, line| {
        out.push_str("      ");
        out.push_str(line);
        out.push('\n');
        out
    })
}

// ── Unit tests ───────────────────────────────────────────────────────────────
