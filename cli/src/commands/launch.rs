//! `quant-deploy launch`: validate, bootstrap and hand over to the UI.
//!
//! This is the command the systemd unit runs, without flags. On success the
//! process image is replaced by the UI server and this function never returns.

use anyhow::Result;
use clap::Args;

use crate::app::{AppContext, HomeSource};
use crate::application::ports::ProgressReporter;
use crate::application::services::bootstrap::prepare_runtime;
use crate::application::services::preflight::run_preflight;
use crate::domain::preflight::Role;
use crate::infra::launcher;
use crate::output::TerminalReporter;

/// Arguments for the launch command.
#[derive(Args)]
pub struct LaunchArgs {
    /// Bind address for the UI (overrides DASHBOARD_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port for the UI (overrides DASHBOARD_PORT)
    #[arg(long)]
    pub port: Option<String>,
}

/// Run the launch command.
///
/// # Errors
///
/// Returns the first failing preflight check, a bootstrap failure, or the
/// `exec` error if the UI cannot be started.
pub async fn run(app: &AppContext, args: LaunchArgs) -> Result<()> {
    app.require_role(Role::Launcher)?;
    let cfg = app
        .load_config(HomeSource::Current)?
        .with_ui_overrides(args.host, args.port.as_deref())?;

    let reporter = TerminalReporter::new(&app.output);
    let report = run_preflight(&cfg, &app.identity, &app.runner, &app.fs, &reporter).await?;
    tracing::info!(
        interpreter = %report.interpreter_version,
        tightened = report.permissions_tightened,
        "preflight passed"
    );

    let spec = prepare_runtime(&cfg, &app.runner, &app.fs, &reporter).await?;
    reporter.success(&format!("starting UI on {}:{}", cfg.ui.host, cfg.ui.port));
    drop(reporter);

    Err(launcher::exec_replace(&spec))
}
