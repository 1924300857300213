// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Models API server
//!
//! Runs the HTTP surface in the foreground until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use scriptorium_core::infrastructure::llm::LocalProviderScanner;
use scriptorium_core::presentation::router;

use super::load_registry;

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Bind address (default: spec.server.bind_address)
    #[arg(long, env = "SCRIPTORIUM_HOST")]
    pub host: Option<String>,

    /// Port (default: spec.server.port)
    #[arg(long, env = "SCRIPTORIUM_PORT")]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let (config, registry) = load_registry(config_path)?;
    info!(
        "Configuration loaded: {} ({} models)",
        config.metadata.name,
        registry.len()
    );

    let scanner = LocalProviderScanner::new(
        config.spec.discovery.clone(),
        config.spec.timeouts.effective_health_check(),
    )?;

    let app = router(Arc::new(registry), Arc::new(scanner));

    let host = args.host.unwrap_or(config.spec.server.bind_address);
    let port = args.port.unwrap_or(config.spec.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Scriptorium listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Scriptorium shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
