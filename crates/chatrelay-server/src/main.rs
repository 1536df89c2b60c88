//! chatrelay server binary.
//!
//! - Config: optional YAML file, CLI overrides for host/port
//! - Logging: `RUST_LOG` or `--log-level`
//! - Runs until Ctrl+C / SIGTERM, then stops gracefully

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chatrelay_server::{config, ChatServer, ServerConfig, TracingObserver};

#[derive(Parser, Debug)]
#[command(name = "chatrelay-server")]
#[command(version, about = "Line-oriented TCP chat relay", long_about = None)]
struct Args {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut cfg = match &args.config {
        Some(path) => config::load_from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    cfg.validate()?;

    let server = ChatServer::start(cfg.server, Arc::new(TracingObserver)).await?;
    shutdown_signal().await;
    server.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, stopping server");
}
