//! `quant-deploy doctor`: run the preflight checks without launching.

use anyhow::Result;

use crate::app::{AppContext, HomeSource, OutputMode};
use crate::application::services::preflight::run_preflight;
use crate::domain::preflight::Role;
use crate::output::TerminalReporter;
use crate::output::human::HumanRenderer;

/// Run the doctor command.
///
/// # Errors
///
/// Returns the first failing check as a typed `DeployError`.
pub async fn run(app: &AppContext) -> Result<()> {
    app.require_role(Role::Launcher)?;
    let cfg = app.load_config(HomeSource::Current)?;
    let reporter = TerminalReporter::new(&app.output);
    let report = run_preflight(&cfg, &app.identity, &app.runner, &app.fs, &reporter).await?;
    reporter.finish();

    match app.mode {
        OutputMode::Json => println!("{}", crate::output::json::format_value(&report)?),
        OutputMode::Human => HumanRenderer::new(&app.output).render_preflight(&report),
    }
    Ok(())
}
