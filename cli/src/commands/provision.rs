//! `quant-deploy provision`: install and start the dashboard service.

use anyhow::Result;

use crate::app::{AppContext, HomeSource, OutputMode};
use crate::application::services::provision::run_provision;
use crate::domain::preflight::Role;
use crate::output::TerminalReporter;
use crate::output::human::HumanRenderer;

/// Run the provision command.
///
/// # Errors
///
/// Returns an error if any provisioning step fails; see
/// [`run_provision`] for the ordering guarantees.
pub async fn run(app: &AppContext) -> Result<()> {
    app.require_role(Role::Provisioner)?;
    let cfg = app.load_config(HomeSource::ServiceUser)?;
    tracing::info!(
        service = %cfg.service_name,
        user = %cfg.service_user,
        project = %cfg.project_dir.display(),
        "provisioning"
    );

    let reporter = TerminalReporter::new(&app.output);
    let report = run_provision(&cfg, &app.identity, &app.runner, &app.fs, &reporter).await?;
    reporter.finish();

    match app.mode {
        OutputMode::Json => println!("{}", crate::output::json::format_value(&report)?),
        OutputMode::Human => HumanRenderer::new(&app.output).render_provision(&report),
    }
    Ok(())
}
