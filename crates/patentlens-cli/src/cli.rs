//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use patentlens_domain::Provider;
use std::path::PathBuf;

/// Patentlens CLI - Extract structured records from patent pages.
#[derive(Debug, Parser)]
#[command(name = "patentlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PATENTLENS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a patent record from a URL, a publication number or a saved page
    Extract(ExtractArgs),

    /// Show how an identifier would be unwrapped, classified and rewritten
    Route(RouteArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Patent URL or publication number (with --file: the page's original URL)
    pub identifier: Option<String>,

    /// Read the page from a saved HTML file instead of fetching it
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Markup the page uses (defaults to the routed provider, or google)
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Skip document link probes
    #[arg(long)]
    pub offline: bool,

    /// Also list family members grouped by publication year
    #[arg(long)]
    pub family_by_year: bool,
}

/// Arguments for the route command.
#[derive(Debug, Parser)]
pub struct RouteArgs {
    /// URL, proxied URL or publication number
    pub identifier: String,
}

/// Provider argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// Google Patents
    Google,
    /// Espacenet
    Espacenet,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

impl From<ProviderArg> for Provider {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Google => Provider::GooglePatents,
            ProviderArg::Espacenet => Provider::Espacenet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command() {
        let cli = Cli::parse_from([
            "patentlens",
            "extract",
            "US8900904B2",
            "--offline",
            "--format",
            "json",
        ]);
        assert_eq!(cli.format, Some(CliFormat::Json));
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.identifier.as_deref(), Some("US8900904B2"));
                assert!(args.offline);
                assert!(args.file.is_none());
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_extract_from_file() {
        let cli = Cli::parse_from([
            "patentlens",
            "extract",
            "--file",
            "page.html",
            "--provider",
            "espacenet",
        ]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.file, Some(PathBuf::from("page.html")));
                assert_eq!(args.provider, Some(ProviderArg::Espacenet));
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_route_command() {
        let cli = Cli::parse_from(["patentlens", "route", "US1234567B1"]);
        assert!(matches!(cli.command, Command::Route(_)));
    }

    #[test]
    fn test_provider_conversion() {
        let provider: Provider = ProviderArg::Espacenet.into();
        assert_eq!(provider, Provider::Espacenet);
    }
}
