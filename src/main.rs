//! Kiln - a static site build pipeline.

mod build;
mod cli;
mod compiler;
mod config;
mod lint;
mod logger;
mod report;
mod serve;
mod utils;
mod watch;

use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::{SiteConfig, cfg, init_config};
use lint::lint_site;
use report::run_reports;
use serve::serve_site;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    init_config(SiteConfig::load(cli)?);
    let config = cfg();

    match &cli.command {
        Commands::Lint => lint_site(&config),
        Commands::Build => build_site(&config),
        Commands::Clean => build::clean(&config),
        Commands::Watch { .. } => {
            if !config.debug {
                log!("warn"; "watching a production build; output is minified and links use site.url");
            }
            build_site(&config)?;
            serve_site(true)
        }
        Commands::Serve { .. } => serve_site(false),
        Commands::Report => run_reports(&config),
    }
}
