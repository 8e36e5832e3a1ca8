//! # presence-relay
//!
//! Presence relay binary: loads settings, initializes logging and metrics,
//! and runs the HTTP/WebSocket server until ctrl-c.

#![deny(unsafe_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use relay_core::logging::init_subscriber;
use relay_server::metrics::install_recorder;
use relay_server::{RelayServer, ServerConfig};
use relay_settings::{RelaySettings, load_settings, load_settings_from_path};
use tokio::task::JoinHandle;

/// How long open sessions get to close after ctrl-c.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Presence relay server.
#[derive(Parser, Debug)]
#[command(name = "presence-relay", about = "Real-time presence and direct-message relay")]
struct Cli {
    /// Settings file (defaults to `~/.presence-relay/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,
}

/// Load settings, apply CLI overrides, and validate.
fn resolve_settings(cli: &Cli) -> Result<RelaySettings> {
    let mut settings = match &cli.config {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => load_settings().context("Failed to load settings")?,
    };
    if let Some(host) = &cli.host {
        settings.server.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

/// Build the server and start listening.
async fn start(
    settings: &RelaySettings,
    metrics: PrometheusHandle,
) -> Result<(RelayServer, SocketAddr, JoinHandle<()>)> {
    let server = RelayServer::new(ServerConfig::from(settings), metrics);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    Ok((server, addr, handle))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    init_subscriber(&settings.logging.level, settings.logging.format);
    let metrics = install_recorder().context("Failed to install metrics recorder")?;

    let (server, addr, handle) = start(&settings, metrics).await?;
    tracing::info!("presence relay listening on ws://{addr}/ws");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!(
        connections = server.relay().connection_count(),
        "shutting down..."
    );
    server
        .shutdown()
        .graceful_shutdown(vec![handle], Some(SHUTDOWN_TIMEOUT))
        .await;

    tracing::info!("shutdown complete");
    Ok(())
}
