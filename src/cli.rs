//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kiln static site builder CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root (default: kiln.toml)
    #[arg(short = 'C', long, default_value = "kiln.toml", global = true)]
    pub config: PathBuf,

    /// Production run: minify output and use the configured site url
    #[arg(long, global = true)]
    pub production: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared dev server arguments for Watch and Serve commands
#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Interface to bind on
    #[arg(short, long)]
    pub interface: Option<String>,

    /// The port you should provide
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check templates, front matter and scripts for errors
    Lint,

    /// Clean the target directory and run a full build
    Build,

    /// Remove everything in the target directory
    Clean,

    /// Run a full build, then serve the target and rebuild on change
    #[command(visible_alias = "develop")]
    Watch {
        #[command(flatten)]
        serve_args: ServeArgs,
    },

    /// Serve the target directory as it is
    Serve {
        #[command(flatten)]
        serve_args: ServeArgs,
    },

    /// Run the page-quality audit for every configured url
    Report,
}

impl Cli {
    /// Dev server arguments, for commands that start the server.
    pub const fn serve_args(&self) -> Option<&ServeArgs> {
        match &self.command {
            Commands::Watch { serve_args } | Commands::Serve { serve_args } => Some(serve_args),
            _ => None,
        }
    }
}
