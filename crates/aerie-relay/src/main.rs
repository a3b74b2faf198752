//! # aerie-relay
//!
//! Relay server binary — resolves configuration, binds the listener, and
//! runs until ctrl-c.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;

use aerie_server::config::ServerConfig;
use aerie_server::server::AerieServer;

/// Aerie multiplayer relay server.
#[derive(Parser, Debug)]
#[command(name = "aerie-relay", about = "Aerie multiplayer relay server")]
struct Cli {
    /// Host to bind (overrides `AERIE_HOST`).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides `AERIE_PORT`; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,
}

impl Cli {
    /// Environment first, flags on top.
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::from_env();
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aerie_server=info".into()),
        )
        .with_target(false)
        .init();

    let config = Cli::parse().into_config();
    tracing::info!(
        host = %config.host,
        port = config.port,
        max_players = config.max_players,
        sweep_interval_secs = config.sweep_interval_secs,
        player_timeout_secs = config.player_timeout_secs,
        "starting relay"
    );

    let server = AerieServer::new(config);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;

    tracing::info!("Aerie relay listening on http://{addr} (ws://{addr}/ws)");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().shutdown();
    let _ = handle.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
