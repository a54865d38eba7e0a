//! Process replacement for the long-running UI.

use std::os::unix::process::CommandExt;
use std::process::Command;

use anyhow::anyhow;

use crate::application::services::bootstrap::LaunchSpec;

/// Build the command described by `spec` without running it.
#[must_use]
pub fn command(spec: &LaunchSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).current_dir(&spec.working_dir);
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }
    cmd
}

/// Replace the current process with the UI. Only returns if `exec` fails.
#[must_use]
pub fn exec_replace(spec: &LaunchSpec) -> anyhow::Error {
    tracing::info!(program = %spec.program.display(), args = ?spec.args, "exec");
    let err = command(spec).exec();
    anyhow!(err).context(format!("cannot exec {}", spec.program.display()))
}
