//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`; never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait; no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Host Identity Port ────────────────────────────────────────────────────────

/// Abstracts the execution identity so privilege rules can be tested.
pub trait HostIdentity {
    /// Effective uid of the current process.
    fn effective_uid(&self) -> u32;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Abstracts the filesystem operations provisioning and launching perform.
pub trait LocalFs {
    /// `true` if anything (file, directory or symlink target) exists at `path`.
    fn exists(&self, path: &Path) -> bool;
    /// `true` if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;
    /// Create `path` and all missing parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// Read a UTF-8 file.
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Create or truncate `path` and write `content`.
    fn write(&self, path: &Path, content: &str) -> Result<()>;
    /// Permission bits of `path`.
    fn mode(&self, path: &Path) -> Result<u32>;
    /// Replace the permission bits of `path`.
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
    /// Target of the symlink at `path`, or `None` if `path` is not a symlink.
    fn read_link(&self, path: &Path) -> Option<PathBuf>;
    /// `true` if `path` itself exists, even as a dangling symlink.
    fn entry_exists(&self, path: &Path) -> bool;
    /// Create a symlink at `link` pointing to `target`.
    fn symlink(&self, target: &Path, link: &Path) -> Result<()>;
    /// Remove a file or symlink.
    fn remove_file(&self, path: &Path) -> Result<()>;
}
