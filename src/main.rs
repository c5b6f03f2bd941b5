//! Plinth server binary.
//!
//! Serves templated files from a content root with per-client flood
//! protection. With no config file, defaults apply: content from `public/`,
//! whitelist mode on, 20 requests per second per client.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plinth::config::loader::load_config;
use plinth::lifecycle::signals;
use plinth::{HttpServer, RouteTable, ServerConfig, Shutdown};

#[derive(Parser)]
#[command(name = "plinth")]
#[command(about = "Minimal template-serving HTTP server", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "plinth={},tower_http=warn",
                    config.observability.log_level
                ))
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("plinth v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        public_dir = %config.site.public_dir.display(),
        whitelist_paths = config.site.whitelist_paths,
        max_requests_per_second = config.rate_limit.max_requests_per_second,
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // No programmatic routes in the standalone binary: every request goes
    // through the static fallback chain.
    let routes = RouteTable::new();
    let server = HttpServer::build(config, routes).await?;

    let shutdown = Arc::new(Shutdown::new());
    let rx = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_ctrl_c(shutdown));

    server.run(listener, rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
