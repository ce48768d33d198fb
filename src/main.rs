//! Main entry point for siem-log-pump

use clap::Parser;
use siem_log_pump::cli::error::{EXIT_FAILURE, EXIT_OK};
use siem_log_pump::cli::Cli;
use siem_log_pump::metrics::init_metrics;
use siem_log_pump::shutdown::ShutdownCoordinator;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() -> anyhow::Result<()> {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("siem_log_pump=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {e:#}");
        std::process::exit(EXIT_FAILURE);
    }

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr {
        if let Err(e) = init_metrics(addr).map_err(|e| anyhow::anyhow!("{e}")) {
            error!("Failed to start metrics exporter on {}: {:#}", addr, e);
            std::process::exit(EXIT_FAILURE);
        }
    }

    // Ctrl+C stops the pump at its next loop check or pause
    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - finishing current batch...");
                shutdown.request_shutdown();
            }
        }
    });

    match cli.execute(shutdown).await {
        Ok(()) => std::process::exit(EXIT_OK),
        Err(e) => {
            error!("Command failed: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
