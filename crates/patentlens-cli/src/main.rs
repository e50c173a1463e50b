//! Patentlens CLI - Command-line front end for patent extraction.

use clap::Parser;
use patentlens_cli::commands;
use patentlens_cli::config::OutputFormat;
use patentlens_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let formatter = Formatter::new(OutputFormat::Table, true);
        eprintln!("{}", formatter.error(&e.to_string()));
        std::process::exit(1);
    }
}

async fn run() -> patentlens_cli::Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.output.format);
    let color_enabled = !cli.no_color && config.output.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, &config, &formatter).await?;
        }
        Command::Route(args) => {
            commands::execute_route(args, &config, &formatter)?;
        }
    }

    Ok(())
}
