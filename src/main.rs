//! Factrice email dispatch service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http server ──▶ security gates ──▶ route registry
//!                                                           │
//!                                                           ▼
//!     Client Response                                 template render
//!     ◀───────────── http response ◀── mail transport ◀─────┘
//!                                        (SMTP)
//!
//!     Cross-cutting: config, observability (logs, metrics), lifecycle
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use factrice::config::load_config;
use factrice::http::HttpServer;
use factrice::lifecycle::{build_dispatcher, signals, Shutdown};
use factrice::observability::{init_logging, metrics};

#[derive(Parser)]
#[command(name = "factrice")]
#[command(about = "Templated email dispatch service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "FACTRICE_CONFIG", default_value = "config/default.toml")]
    config: PathBuf,

    /// Override the template directory from the configuration
    #[arg(short, long)]
    templates: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(templates) = args.templates {
        config.templates.directory = templates;
    }

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "factrice starting");

    tracing::info!(
        config = %args.config.display(),
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        whitelist = config.whitelist.enable,
        query_token = config.query_token.enable,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let dispatcher = Arc::new(build_dispatcher(&config)?);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    HttpServer::new(&config.server, dispatcher)
        .run(listener, receiver)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
