//! Page host.
//!
//! Serves the pages declared in a TOML file. Each page is registered as a
//! deferred route template; the first request that matches it loads the page,
//! materializes a concrete endpoint and runs it.
//!
//! ```text
//!  Client ──▶ listener ──▶ axum fallback ──▶ TemplateMatcher ──▶ CandidateSet
//!                                                                     │
//!                            ┌────────────────────────────────────────┘
//!                            ▼
//!            PageMaterializationPolicy ──▶ method / consumes / constraint policies
//!                            │
//!                            ▼
//!                  best candidate ──▶ page invoker ──▶ Response
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use page_materializer::config::loader::{resolve_config, ConfigOverrides};
use page_materializer::config::watcher::ConfigWatcher;
use page_materializer::observability::{logging, metrics};
use page_materializer::PageHost;

#[derive(Parser)]
#[command(name = "page-host")]
#[command(about = "Serves pages materialized on first request", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        bind_address: args.bind.clone(),
        log_level: args.log_level.clone(),
    };
    let config = resolve_config(args.config.as_deref(), &overrides)?;

    logging::init_tracing(&config.observability.log_level)?;

    tracing::info!("page-host v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        pages = config.pages.len(),
        request_timeout_secs = config.timeouts.request_secs,
        memoize_endpoints = config.policy.memoize_endpoints,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // The watcher stops when dropped, so it lives until shutdown.
    let (_watcher, updates) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.with_overrides(overrides).run()?), rx)
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let host = Arc::new(PageHost::new(&config)?);
    host.run(listener, updates, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
