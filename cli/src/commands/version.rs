//! Version command

use anyhow::Result;

use crate::app::{AppContext, OutputMode};
use crate::output::human::HumanRenderer;

/// Run the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(app: &AppContext) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    match app.mode {
        OutputMode::Json => {
            let doc = serde_json::json!({ "version": version });
            println!("{}", crate::output::json::format_value(&doc)?);
        }
        OutputMode::Human => HumanRenderer::new(&app.output).render_version(version),
    }
    Ok(())
}
