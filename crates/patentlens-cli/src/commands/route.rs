//! Route command implementation.

use crate::cli::RouteArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use patentlens_extractor::SourceRouter;

/// Execute the route command.
pub fn execute_route(args: RouteArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let routed = SourceRouter::new(config.extractor.clone()).route(&args.identifier)?;
    println!("{}", formatter.format_route(&routed)?);
    Ok(())
}
