//! Application context: unified state passed to every command handler.
//!
//! `AppContext` carries the output context, rendering mode and the host
//! adapters. It is built once in `Cli::run()`; configuration is resolved from
//! the process environment here and nowhere else.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::HostIdentity;
use crate::domain::config::{DeployConfig, EnvOverrides};
use crate::domain::error::DeployError;
use crate::domain::preflight::{Role, check_identity};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::StdFs;
use crate::infra::identity::{NixIdentity, home_of};
use crate::output::OutputContext;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags passed from the top-level CLI.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Whose home directory anchors the default paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeSource {
    /// The invoking user (`launch`, `doctor`).
    Current,
    /// The configured service user (`provision`, `render`), which differs
    /// from the invoking user under `sudo`.
    ServiceUser,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Host process runner.
    pub runner: TokioCommandRunner,
    /// Host filesystem.
    pub fs: StdFs,
    /// Effective identity of this process.
    pub identity: NixIdentity,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &OutputFlags) -> Self {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON mode keeps stdout for the document alone.
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet || flags.json),
            mode,
            runner: TokioCommandRunner::default(),
            fs: StdFs,
            identity: NixIdentity,
        }
    }

    /// Enforce the identity rule for `role`. Commands call this before
    /// resolving any configuration.
    ///
    /// # Errors
    ///
    /// Returns `PrivilegeError` when the effective uid does not fit `role`.
    pub fn require_role(&self, role: Role) -> Result<(), DeployError> {
        check_identity(role, self.identity.effective_uid())
    }

    /// Resolve the deployment configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for malformed values, or an error when no home
    /// directory can be determined.
    pub fn load_config(&self, home: HomeSource) -> Result<DeployConfig> {
        let env = EnvOverrides::from_pairs(std::env::vars())?;
        let home_dir = match home {
            HomeSource::Current => dirs::home_dir().context("cannot determine home directory")?,
            HomeSource::ServiceUser => {
                let user = env.service_user();
                home_of(&user).unwrap_or_else(|| PathBuf::from("/home").join(&user))
            }
        };
        let launcher = std::env::current_exe().context("cannot determine executable path")?;
        tracing::debug!(home = %home_dir.display(), launcher = %launcher.display(), "resolving configuration");
        Ok(DeployConfig::resolve(&env, &home_dir, launcher)?)
    }
}
