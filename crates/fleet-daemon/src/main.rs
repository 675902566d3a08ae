//! fleet daemon
//!
//! Main daemon process: places jobs on cluster nodes and runs cron triggers.

use anyhow::Context;
use clap::Parser;
use fleet_api::{create_router, AppState};
use fleet_core::{DaemonConfig, LoggingConfig};
use fleet_cron::{CronManager, DispatchHandler};
use fleet_executor::HttpExecutor;
use fleet_scheduler::{InMemoryRegistry, JobDispatcher, PlacementEngine};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// fleet daemon - cluster-aware workflow scheduler
#[derive(Parser, Debug)]
#[command(name = "fleetd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to bind the API server (overrides config)
    #[arg(long)]
    address: Option<String>,

    /// Port for the REST API server (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Log level or filter directive (overrides config)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DaemonConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DaemonConfig::default(),
    };
    if let Some(address) = args.address {
        config.api.address = address;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging)?;

    info!("Starting fleet daemon v{}", env!("CARGO_PKG_VERSION"));

    let registry = Arc::new(InMemoryRegistry::new(config.clusters.clone()));
    info!(clusters = config.clusters.len(), "Cluster registry seeded");

    let executor = Arc::new(HttpExecutor::new(
        config.dispatch.timeout_secs.map(Duration::from_secs),
    )?);
    let dispatcher = Arc::new(JobDispatcher::new(
        PlacementEngine::new(registry.clone()),
        executor,
    ));

    let handler = Arc::new(DispatchHandler::new(
        dispatcher.clone(),
        config.cron.clone(),
        config.dispatch.clone(),
    ));
    let cron = Arc::new(CronManager::new(handler));

    let state = Arc::new(AppState {
        dispatcher,
        registry,
        cron: cron.clone(),
    });

    let mut router = create_router(state);
    if config.api.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }

    let addr: SocketAddr = format!("{}:{}", config.api.address, config.api.port)
        .parse()
        .context("invalid API address")?;

    info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cron.shutdown().await;
    info!("fleet daemon stopped");

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&logging.level)
        .with_context(|| format!("invalid log level '{}'", logging.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match logging.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to set subscriber: {}", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
