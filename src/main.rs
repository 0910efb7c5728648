use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tiller::config::GatewayConfig;
use tiller::engine::PaperEngineFactory;
use tiller::gateway::Gateway;
use tiller::transport;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Trading command gateway over stdin/stdout.
#[derive(Debug, Parser)]
#[command(name = "tiller", version)]
struct Cli {
    /// Path to a gateway configuration file (TOML)
    #[arg(short, long, env = "TILLER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log filter
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = GatewayConfig::load(cli.config.as_deref())?;

    init_logging(cli.log.as_deref().unwrap_or(&config.logging.level));
    info!(operations = ?Gateway::operations().collect::<Vec<_>>(), "starting gateway");

    let gateway = Gateway::new(&config, Arc::new(PaperEngineFactory));

    tokio::select! {
        result = transport::serve(&gateway, tokio::io::stdin(), tokio::io::stdout()) => {
            result?;
            info!("input stream closed, shutting down");
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
