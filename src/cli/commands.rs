//! Command handlers for the fuel price proxy CLI
//!
//! This module wires configuration, the upstream client, the cache and the
//! HTTP server together for each command.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::app::{
    create_shutdown_channel, DatasetCache, RefreshScheduler, RefreshSummary, Refresher,
    SignalHandler, UpstreamClient,
};
use crate::cli::ServeArgs;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::server::{self, build_router, resolve_bind_addr, AppState};

/// Build a refresher over a fresh cache from the runtime configuration
fn build_refresher(config: &AppConfig) -> Result<Arc<Refresher>> {
    let (client_config, cache_config) = config.to_runtime_config();
    let client = UpstreamClient::with_config(client_config)?;
    let cache = Arc::new(DatasetCache::new());

    Ok(Arc::new(Refresher::new(Arc::new(client), cache, cache_config)))
}

/// Handle the serve command
///
/// Starts the refresh scheduler and the HTTP server, and runs until CTRL-C or
/// SIGTERM. Both stop on the same shutdown broadcast.
pub async fn handle_serve(args: ServeArgs, mut config: AppConfig) -> Result<()> {
    config.apply_cli_overrides(args.host, args.port);

    let refresher = build_refresher(&config)?;
    let addr = resolve_bind_addr(&config.server.host, config.server.port)?;

    let (shutdown_tx, _) = create_shutdown_channel();
    let signal_task = SignalHandler::new(shutdown_tx.clone()).setup();

    let mut scheduler = RefreshScheduler::new();
    scheduler.start_refresh_task(
        Arc::clone(&refresher),
        config.refresh.interval,
        shutdown_tx.subscribe(),
    );

    let listener = TcpListener::bind(addr).await?;
    let router = build_router(AppState::new(refresher));
    let served = server::serve(listener, router, shutdown_tx.subscribe()).await;

    // The server can also stop on an accept error; stop the scheduler either way
    let _ = shutdown_tx.send(());
    scheduler.shutdown_all().await;
    signal_task.abort();

    served?;
    info!("Server stopped");
    Ok(())
}

/// Handle the fetch command
///
/// Runs one refresh against the upstream and prints how many records each
/// section holds.
pub async fn handle_fetch(config: AppConfig) -> Result<()> {
    let refresher = build_refresher(&config)?;

    info!("Fetching dataset from upstream");
    let summary = refresher.run_once().await?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RefreshSummary) {
    println!(
        "Fetched {} sections in {:.2}s",
        summary.section_sizes.len(),
        summary.elapsed.as_secs_f64()
    );

    let width = summary
        .section_sizes
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, count) in &summary.section_sizes {
        println!("  {:<width$}  {:>8}", name, count, width = width);
    }

    println!(
        "Cached {} keys, valid for another {}s ({} live entries)",
        summary.keys.len(),
        summary.ttl.as_secs(),
        summary.cache.live_entries()
    );
}
