//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::commands;

/// Deploy the doge_quant trading dashboard behind systemd and nginx
#[derive(Parser)]
#[command(
    name = "quant-deploy",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (NO_COLOR is honoured as well)
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install and start the dashboard service (run as root)
    Provision,

    /// Validate the host, prepare the runtime and start the dashboard
    Launch(commands::launch::LaunchArgs),

    /// Run preflight checks without launching
    Doctor,

    /// Print a rendered descriptor without installing it
    Render(commands::render::RenderArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            no_color,
            quiet,
            json,
            command,
        } = self;
        let app = AppContext::new(&OutputFlags {
            no_color,
            quiet,
            json,
        });
        match command {
            Command::Provision => commands::provision::run(&app).await,
            Command::Launch(args) => commands::launch::run(&app, args).await,
            Command::Doctor => commands::doctor::run(&app).await,
            Command::Render(args) => commands::render::run(&app, &args),
            Command::Version => commands::version::run(&app),
        }
    }
}
