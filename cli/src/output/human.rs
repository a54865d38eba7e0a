//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::provision::ProvisionReport;
use crate::domain::preflight::{CheckName, PreflightReport};
use crate::output::OutputContext;

/// Renders reports as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("quant-deploy {version}");
    }

    /// Render the outcome of a passing preflight run.
    pub fn render_preflight(&self, report: &PreflightReport) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Preflight");
        println!();
        for check in CheckName::ORDER {
            let passed = report.passed.contains(&check);
            let detail = match check {
                CheckName::Interpreter if passed => {
                    format!("{check} (Python {})", report.interpreter_version)
                }
                CheckName::SecretsPermissions if report.permissions_tightened => {
                    format!("{check} (tightened to 0600)")
                }
                _ => check.to_string(),
            };
            self.print_check(passed, &detail);
        }
        if !report.warnings.is_empty() {
            println!();
            for warning in &report.warnings {
                self.ctx.warn(warning);
            }
        }
        println!();
        self.ctx.success("Ready to launch.");
        println!();
    }

    /// Render the summary printed after provisioning.
    pub fn render_provision(&self, report: &ProvisionReport) {
        if self.ctx.quiet {
            return;
        }
        if !report.status.is_empty() {
            println!();
            println!("{}", report.status);
        }
        println!();
        self.ctx.header("Deployment");
        println!();
        self.ctx.kv("Unit:       ", report.unit.as_str());
        self.ctx.kv("Proxy site: ", report.proxy.as_str());
        self.ctx.kv("Site link:  ", report.link.as_str());
        self.ctx.kv(
            "Service:    ",
            if report.active { "active" } else { "not active" },
        );
        println!();
        self.ctx.header("Access");
        println!();
        self.ctx.kv("Via nginx:  ", &report.proxy_url);
        self.ctx.kv("Direct:     ", &report.direct_url);
        self.ctx.kv("Logs:       ", &report.log_command);
        println!();
    }

    fn print_check(&self, ok: bool, msg: &str) {
        if ok {
            println!("    {} {msg}", "\u{2713}".style(self.ctx.styles.success));
        } else {
            println!("    {} {msg}", "\u{2717}".style(self.ctx.styles.error));
        }
    }
}
