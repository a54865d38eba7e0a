//! `quant-deploy render`: print a descriptor without installing it.

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::app::{AppContext, HomeSource};
use crate::domain::descriptors;

/// Descriptor to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderTarget {
    /// systemd service unit
    Unit,
    /// nginx site
    Proxy,
    /// Streamlit config.toml
    UiConfig,
}

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Which descriptor to print
    #[arg(value_enum)]
    pub target: RenderTarget,
}

/// Run the render command. Output is the raw descriptor; `--json` and
/// `--quiet` do not apply.
///
/// # Errors
///
/// Returns an error if the configuration cannot be resolved.
pub fn run(app: &AppContext, args: &RenderArgs) -> Result<()> {
    let cfg = app.load_config(HomeSource::ServiceUser)?;
    let text = match args.target {
        RenderTarget::Unit => descriptors::service_unit(&cfg),
        RenderTarget::Proxy => descriptors::proxy_site(&cfg),
        RenderTarget::UiConfig => descriptors::ui_config(&cfg),
    };
    print!("{text}");
    Ok(())
}
