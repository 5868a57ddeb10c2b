//! Command-line argument parsing for the fuel price proxy
//!
//! This module defines the CLI structure using clap derive macros. Running
//! without a subcommand serves the API with the configured defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Fuel price proxy - cached, enriched access to Croatian fuel prices
#[derive(Parser, Debug)]
#[command(
    name = "fuel_price_proxy",
    version,
    about = "Caching HTTP proxy for the Croatian fuel price dataset",
    long_about = "Fetches the daily fuel price dataset, keeps it in memory until shortly after
local midnight and serves raw sections, single records and geographically filtered
stations with their cheapest matching price."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (trace level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API and refresh the dataset daily
    Serve(ServeArgs),

    /// Fetch the dataset once and print per-section record counts
    Fetch,
}

/// Arguments for the serve command
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Bind host, overriding config and HOST
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port, overriding config and PORT
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to run, serving when none was given
    pub fn command(&self) -> Commands {
        match &self.command {
            Some(Commands::Serve(args)) => Commands::Serve(args.clone()),
            Some(Commands::Fetch) => Commands::Fetch,
            None => Commands::Serve(ServeArgs::default()),
        }
    }

    /// Log level requested by the verbosity flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::TRACE)
        } else if self.global.verbose {
            Some(tracing::Level::DEBUG)
        } else {
            None
        }
    }
}
