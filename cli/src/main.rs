//! quant-deploy - provision and launch the doge_quant trading dashboard

use clap::Parser;
use quant_deploy::cli::Cli;
use quant_deploy::domain::error::DeployError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr; under systemd that is the journal.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    if let Err(e) = cli.run().await {
        match e.downcast_ref::<DeployError>() {
            Some(err) if json => match quant_deploy::output::json::format_error(err) {
                Ok(doc) => println!("{doc}"),
                Err(_) => eprintln!("Error: {e:#}"),
            },
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
