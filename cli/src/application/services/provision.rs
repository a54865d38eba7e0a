//! Application service: host provisioning use-case.
//!
//! Renders the systemd unit and nginx site, installs them at their canonical
//! paths, validates the proxy configuration, and hands the service to the
//! supervisor. Every run overwrites both descriptors, so repeating it
//! converges to the same files.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{CommandRunner, HostIdentity, LocalFs, ProgressReporter};
use crate::domain::config::DeployConfig;
use crate::domain::descriptors;
use crate::domain::error::DeployError;
use crate::domain::preflight::{Role, check_identity, check_project_dir};

/// What happened to a descriptor file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

impl WriteOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        }
    }
}

/// What happened to the `sites-enabled` symlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    Created,
    AlreadyLinked,
    Replaced,
}

impl LinkOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyLinked => "already linked",
            Self::Replaced => "replaced",
        }
    }
}

/// Summary of a successful provisioning run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub unit: WriteOutcome,
    pub proxy: WriteOutcome,
    pub link: LinkOutcome,
    /// `systemctl is-active` verdict after starting.
    pub active: bool,
    /// `systemctl status` text, echoed to the operator.
    pub status: String,
    pub proxy_url: String,
    pub direct_url: String,
    pub log_command: String,
}

/// Install and start the dashboard service.
///
/// # Errors
///
/// - `PrivilegeError` when not running as root (nothing is written).
/// - `LayoutError` when the project directory does not exist.
/// - `EnvironmentError` when `nginx` or `systemctl` cannot be run.
/// - `ConfigError` when `nginx -t` rejects the configuration; no daemon is reloaded.
/// - Any failing `systemctl` step, with its stderr.
pub async fn run_provision(
    cfg: &DeployConfig,
    identity: &impl HostIdentity,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<ProvisionReport> {
    check_identity(Role::Provisioner, identity.effective_uid())?;
    check_project_dir(&cfg.project_dir, fs.is_dir(&cfg.project_dir))?;
    require_tool(runner, "nginx", &["-v"], "apt-get install nginx").await?;
    require_tool(runner, "systemctl", &["--version"], "use a systemd-based host").await?;

    reporter.step("writing service unit...");
    let unit_path = cfg.unit_path();
    let unit = write_descriptor(fs, &unit_path, &descriptors::service_unit(cfg))?;
    reporter.success(&format!("{} ({})", unit_path.display(), unit.as_str()));

    reporter.step("writing proxy site...");
    let site_path = cfg.proxy_site_path();
    let proxy = write_descriptor(fs, &site_path, &descriptors::proxy_site(cfg))?;
    reporter.success(&format!("{} ({})", site_path.display(), proxy.as_str()));

    let link = ensure_link(fs, &site_path, &cfg.proxy_link_path())?;
    tracing::info!(?link, link_path = %cfg.proxy_link_path().display(), "proxy site enabled");

    reporter.step("validating proxy configuration...");
    validate_proxy(runner).await?;

    reporter.step("reloading nginx and systemd...");
    systemctl(runner, &["reload", "nginx"]).await?;
    systemctl(runner, &["daemon-reload"]).await?;

    // `restart` starts an inactive unit and moves a running one onto the rewritten files.
    reporter.step(&format!("restarting {}...", cfg.service_name));
    systemctl(runner, &["restart", &cfg.service_name]).await?;
    systemctl(runner, &["enable", &cfg.service_name]).await?;

    let active = is_active(runner, &cfg.service_name).await;
    let status = service_status(runner, &cfg.service_name).await;
    if active {
        reporter.success(&format!("{} is active", cfg.service_name));
    } else {
        reporter.warn(&format!(
            "{} is not active yet; inspect with: {}",
            cfg.service_name,
            cfg.log_command()
        ));
    }

    let address = host_address(runner).await;
    Ok(ProvisionReport {
        unit,
        proxy,
        link,
        active,
        status,
        proxy_url: proxy_url(&address, cfg.proxy.listen_port),
        direct_url: format!("http://{address}:{}/", cfg.ui.port),
        log_command: cfg.log_command(),
    })
}

// ── Steps ─────────────────────────────────────────────────────────────────────

async fn require_tool(
    runner: &impl CommandRunner,
    program: &str,
    args: &[&str],
    remedy: &str,
) -> Result<(), DeployError> {
    match runner.run(program, args).await {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::debug!(error = %format!("{e:#}"), "{program} unavailable");
            Err(DeployError::environment(
                format!("`{program}` is not available on this host"),
                remedy,
            ))
        }
    }
}

/// Overwrite `path` with `content`, reporting how it compares to what was there.
///
/// # Errors
///
/// Returns an error if the parent directory or the file cannot be written.
pub fn write_descriptor(fs: &impl LocalFs, path: &Path, content: &str) -> Result<WriteOutcome> {
    let previous = fs.read_to_string(path).ok();
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.write(path, content)?;
    let outcome = match previous {
        None => WriteOutcome::Created,
        Some(old) if descriptors::digest(&old) == descriptors::digest(content) => {
            WriteOutcome::Unchanged
        }
        Some(_) => WriteOutcome::Updated,
    };
    tracing::debug!(path = %path.display(), ?outcome, "descriptor written");
    Ok(outcome)
}

/// Point `link` at `target`. A link that already points there is left alone.
///
/// # Errors
///
/// Returns an error if a stale entry cannot be removed or the link cannot be created.
pub fn ensure_link(fs: &impl LocalFs, target: &Path, link: &Path) -> Result<LinkOutcome> {
    let outcome = match fs.read_link(link) {
        Some(current) if current == target => return Ok(LinkOutcome::AlreadyLinked),
        Some(_) => LinkOutcome::Replaced,
        None if fs.entry_exists(link) => LinkOutcome::Replaced,
        None => LinkOutcome::Created,
    };
    if outcome == LinkOutcome::Replaced {
        fs.remove_file(link)?;
    }
    if let Some(parent) = link.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.symlink(target, link)?;
    Ok(outcome)
}

async fn validate_proxy(runner: &impl CommandRunner) -> Result<(), DeployError> {
    let output = runner.run("nginx", &["-t"]).await.map_err(|e| {
        DeployError::config(
            format!("could not run nginx -t: {e:#}"),
            "check the nginx installation",
        )
    })?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(DeployError::config(
        format!("nginx rejected the configuration:\n{}", stderr.trim_end()),
        "fix the reported file and re-run: sudo quant-deploy provision",
    ))
}

async fn systemctl(runner: &impl CommandRunner, args: &[&str]) -> Result<Output> {
    let command = format!("systemctl {}", args.join(" "));
    let output = runner
        .run("systemctl", args)
        .await
        .with_context(|| command.clone())?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{command} failed ({}): {}", output.status, stderr.trim());
    }
    tracing::debug!("{command} ok");
    Ok(output)
}

async fn is_active(runner: &impl CommandRunner, service: &str) -> bool {
    runner
        .run("systemctl", &["is-active", service])
        .await
        .is_ok_and(|o| o.status.success())
}

/// `systemctl status` exits non-zero for inactive units; the text is wanted either way.
async fn service_status(runner: &impl CommandRunner, service: &str) -> String {
    match runner
        .run("systemctl", &["status", service, "--no-pager"])
        .await
    {
        Ok(output) => String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
        Err(e) => format!("status unavailable: {e:#}"),
    }
}

/// First address reported by `hostname -I`, or `localhost`.
async fn host_address(runner: &impl CommandRunner) -> String {
    runner
        .run("hostname", &["-I"])
        .await
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| {
            String::from_utf8_lossy(&o.stdout)
                .split_whitespace()
                .next()
                .map(str::to_owned)
        })
        .unwrap_or_else(|| "localhost".to_string())
}

fn proxy_url(address: &str, listen_port: u16) -> String {
    if listen_port == 80 {
        format!("http://{address}/")
    } else {
        format!("http://{address}:{listen_port}/")
    }
}
