//! Fuel price proxy
//!
//! Serves the Croatian fuel price dataset from memory, refreshed daily, with
//! geographic filtering and cheapest-price lookup.

use std::process;

use anyhow::Context;
use tracing::{error, info, Level};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use fuel_price_proxy::cli::{handle_fetch, handle_serve, Cli, Commands};
use fuel_price_proxy::config::AppConfig;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    let log_filter = init_logging(&cli)?;

    let config = AppConfig::load(cli.global.config.clone())
        .await
        .context("Failed to load configuration")?;

    // Command-line verbosity wins over the configured level
    if cli.log_level().is_none() {
        let level = config.logging.parsed_level()?;
        log_filter
            .reload(build_filter(level)?)
            .context("Failed to apply configured log level")?;
    }

    info!("Fuel price proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let outcome = match cli.command() {
        Commands::Serve(args) => {
            info!("Executing serve command");
            handle_serve(args, config).await
        }
        Commands::Fetch => {
            info!("Executing fetch command");
            handle_fetch(config).await
        }
    };

    if let Err(e) = &outcome {
        error!(
            category = e.category(),
            recoverable = e.is_recoverable(),
            "Command failed: {}",
            e
        );
    }
    outcome?;

    Ok(())
}

/// Initialize logging from the CLI flags
///
/// Until the configuration is loaded the `info` level applies. The returned
/// handle swaps in the configured level afterwards. `RUST_LOG` directives are
/// honoured alongside the crate-level directive.
fn init_logging(cli: &Cli) -> anyhow::Result<FilterHandle> {
    let level = cli.log_level().unwrap_or(Level::INFO);

    let (filter, handle) = reload::Layer::new(build_filter(level)?);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(cli.global.very_verbose))
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }

    Ok(handle)
}

fn build_filter(level: Level) -> anyhow::Result<EnvFilter> {
    let directive = format!("fuel_price_proxy={}", level.to_string().to_lowercase())
        .parse()
        .with_context(|| format!("Invalid log level: {}", level))?;

    Ok(EnvFilter::from_default_env()
        .add_directive(directive)
        .add_directive("tower_http=info".parse()?))
}
