//! Gatekeeper: a gated single-upstream reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌────────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ http server ──▶ forwarding engine            │
//!                           │   (request id,     │                           │
//!                           │    tracing)        ├─▶ ignored paths → 200     │
//!                           │                    ├─▶ route table  → 401/500  │
//!                           │                    └─▶ upstream client ────────┼──▶ Upstream
//!     Client Response       │                            │                   │
//!     ◀─────────────────────┼── response sink ◀──────────┘                   │
//!                           │                                                │
//!                           │   hooks: on_error / on_request_body /          │
//!                           │          on_response_body  (session ID)        │
//!                           └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gatekeeper_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig};
use gatekeeper_proxy::http::HttpServer;
use gatekeeper_proxy::lifecycle::{signals, Shutdown};
use gatekeeper_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "gatekeeper-proxy")]
#[command(about = "Gated reverse proxy relaying authorized requests to one upstream", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override upstream.url.
    #[arg(short, long)]
    upstream: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(upstream) = &self.upstream {
            config.upstream.url = upstream.clone();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init(&config.observability);
    tracing::info!("gatekeeper-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        routes = config.routes.len(),
        ignored_paths = config.upstream.ignored_paths.len(),
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let hooks = logging::exchange_hooks(config.observability.log_bodies);
    let server = HttpServer::new(config, hooks)?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
