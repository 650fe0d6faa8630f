//! Quill content gateway.
//!
//! Accepts content-generation requests, rate limits them per client, and
//! generates text through an ordered list of models.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  QUILL GATEWAY                    │
//!                        │                                                   │
//!   POST /api/generate   │  ┌──────────┐   ┌────────────┐   ┌────────────┐  │
//!   ─────────────────────┼─▶│  cors +  │──▶│ admission  │──▶│  handler   │  │
//!                        │  │ req. id  │   │ controller │   │  + prompt  │  │
//!                        │  └──────────┘   └─────┬──────┘   └─────┬──────┘  │
//!                        │                  429 ◀┘                │         │
//!                        │                                        ▼         │
//!                        │                                 ┌────────────┐   │
//!                        │                                 │  fallback  │───┼──▶ model 1, 2, … n
//!                        │                                 │ dispatcher │   │
//!                        │                                 └─────┬──────┘   │
//!                        │                                       ▼          │
//!   200 / 500            │                                 ┌────────────┐   │
//!   ◀────────────────────┼─────────────────────────────────│  storage   │   │
//!                        │                                 └────────────┘   │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use quill_gateway::backend::GeminiBackend;
use quill_gateway::config::load_or_default;
use quill_gateway::lifecycle::signals::trigger_on_signal;
use quill_gateway::observability::{logging, metrics};
use quill_gateway::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "quill-gateway")]
#[command(about = "Rate-limited content generation gateway", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the config file and PORT.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(port) = args.port {
        let mut addr: std::net::SocketAddr = config.listener.bind_address.parse()?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }

    logging::init_tracing(&config.observability);
    tracing::info!("quill-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    if config.backend.api_key.is_empty() {
        tracing::warn!("No API key configured; set GEMINI_API_KEY or backend.api_key");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let backend = Arc::new(GeminiBackend::new(client, &config.backend)?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(trigger_on_signal(shutdown.clone()));

    let server = HttpServer::new(config, backend, shutdown);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
