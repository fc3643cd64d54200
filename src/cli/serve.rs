//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! `serve` 子命令

use crate::app::build_state;
use crate::cli::ServeArgs;
use crate::config::AppConfig;
use crate::server;
use anyhow::{anyhow, Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn execute(mut config: AppConfig, args: &ServeArgs) -> Result<()> {
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
        config.validate().map_err(|e| anyhow!(e))?;
    }

    let state = build_state(&config)
        .await
        .context("failed to connect to store or cache")?;

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, draining connections");
        signal_token.cancel();
    });

    server::serve(listener, state, shutdown).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
