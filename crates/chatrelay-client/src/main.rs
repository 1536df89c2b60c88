//! chatrelay terminal client.
//!
//! Reads lines from stdin and sends them; prints every broadcast line to
//! stdout. `/quit` or end of input disconnects.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use chatrelay_client::{
    config, resolve_display_name, ChatClient, ClientConfig, ClientObserver, ConnectionState,
};

#[derive(Parser, Debug)]
#[command(name = "chatrelay-client")]
#[command(version, about = "Terminal client for the chatrelay server", long_about = None)]
struct Args {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Display name (a generated one is used when absent)
    #[arg(short, long)]
    name: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

struct Console;

impl ClientObserver for Console {
    fn on_message_received(&self, line: &str) {
        println!("{line}");
    }

    fn on_connection_state_changed(&self, state: ConnectionState, reason: &str) {
        match state {
            ConnectionState::Connected => eprintln!("Connected ({reason})"),
            ConnectionState::Disconnected => eprintln!("Disconnected from server ({reason})"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = match &args.config {
        Some(path) => config::load_from_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(host) = args.host {
        cfg.client.host = host;
    }
    if let Some(port) = args.port {
        cfg.client.port = port;
    }
    cfg.validate()?;

    let name = resolve_display_name(args.name.as_deref());
    let client = match ChatClient::connect(&cfg.client, &name, Arc::new(Console)).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Unable to connect: {e}");
            return Err(e.into());
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = client.closed() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let text = line.trim();
                    if text.is_empty() {
                        continue;
                    }
                    if text == "/quit" {
                        break;
                    }
                    if let Err(e) = client.send(text).await {
                        eprintln!("Failed to send message: {e}");
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "stdin read failed");
                    break;
                }
            },
        }
    }

    client.disconnect().await;
    Ok(())
}
