//! `TerminalReporter`: presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// On a TTY, `step()` drives a spinner and finished lines are printed above
/// it; otherwise (journal, pipes) every event goes through the
/// `OutputContext` helpers. Quiet contexts never get a spinner, so the
/// helpers' own `quiet` gate covers both paths.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Option<ProgressBar>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        let spinner = ctx.show_progress().then(|| progress::spinner(""));
        Self { ctx, spinner }
    }

    /// Clear the spinner so later output starts on a clean line.
    pub fn finish(&self) {
        if let Some(pb) = &self.spinner {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        match &self.spinner {
            Some(pb) => pb.set_message(message.to_string()),
            None => self.ctx.info(message),
        }
    }

    fn success(&self, message: &str) {
        match &self.spinner {
            Some(pb) => pb.println(format!("  {} {message}", "✓".style(self.ctx.styles.success))),
            None => self.ctx.success(message),
        }
    }

    fn warn(&self, message: &str) {
        match &self.spinner {
            Some(pb) => pb.println(format!("  {} {message}", "⚠".style(self.ctx.styles.warning))),
            None => self.ctx.warn(message),
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
