//! Cascading content server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ static assets (ServeDir)
//!                          │                │ miss
//!                          ▼                ▼
//!                     request.rs ──▶ compositor ──▶ layer 1 ─▶ layer 2 ─▶ ... ─▶ layer N
//!                                         │          (code / markdown / template / markup)
//!                                         ▼
//!     Client Response ◀── response.rs ◀── resolver (finalized | 404 | JSON | HTML)
//!
//!     Cross-cutting: config, logging, metrics, lifecycle
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::net::TcpListener;

use cascade_server::config::{
    apply_port_override, load_config, load_env_file, validate_config, ConfigError,
};
use cascade_server::lifecycle::spawn_signal_handler;
use cascade_server::observability::{logging, metrics};
use cascade_server::{HttpServer, ServerConfig, Shutdown};

#[derive(Parser)]
#[command(name = "cascade-server")]
#[command(about = "Serve pages composed from layered content directories", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the numbered content layers
    #[arg(long)]
    content_root: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:3000
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = load_env_file(Path::new(".env"));
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    apply_port_override(&mut config, std::env::var("PORT").ok().as_deref());
    if let Some(root) = cli.content_root {
        config.content.root = root;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    config.content.resolve_relative_to(&std::env::current_dir()?);

    logging::init(&config.observability.log_level);
    tracing::info!("cascade-server v{} starting", env!("CARGO_PKG_VERSION"));
    match dotenv {
        Ok(true) => tracing::info!(file = ".env", "Loaded environment file"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load environment file"),
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        content_root = %config.content.root.display(),
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
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
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
