//! Lab Dashboard Client Binary

use clap::Parser;
use lab_dashboard::{Config, DashboardController, DashboardError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sync client for the container lab dashboard
#[derive(Debug, Parser)]
#[command(name = "lab-dashboard", version, about)]
struct Cli {
    /// Base URL of the lab backend
    #[arg(long, env = "BACKEND_URL")]
    backend_url: Option<String>,

    /// Seconds between status/metrics refresh cycles
    #[arg(long, env = "STATUS_POLL_SECONDS")]
    status_poll_seconds: Option<u64>,

    /// Seconds between security panel refresh cycles
    #[arg(long, env = "SECURITY_POLL_SECONDS")]
    security_poll_seconds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    initialize_tracing();

    info!("Starting lab dashboard client v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(backend_url) = cli.backend_url {
        config.backend_url = backend_url;
    }
    if let Some(seconds) = cli.status_poll_seconds {
        config.status_poll_interval = Duration::from_secs(seconds);
    }
    if let Some(seconds) = cli.security_poll_seconds {
        config.security_poll_interval = Duration::from_secs(seconds);
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Dashboard configuration - Backend: {}, status poll: {:?}, security poll: {:?}",
        config.backend_url, config.status_poll_interval, config.security_poll_interval
    );

    let controller = Arc::new(DashboardController::new(config)?);
    controller.start().await;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| DashboardError::Other(format!("Failed to wait for shutdown signal: {}", e)))?;

    info!("Shutting down dashboard client");
    controller.shutdown().await;
    Ok(())
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
