//! Serve command handler

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::app::options::ServerOptions;
use crate::commands::CliContext;
use crate::sandbox::LeaseRegistry;
use crate::server::{serve, ServerState};

/// Run the HTTP server until SIGINT or SIGTERM
pub async fn handle_serve_command(ctx: &CliContext) -> Result<ExitCode> {
    let state = Arc::new(ServerState::new(
        ctx.provider()?,
        LeaseRegistry::new(),
        ctx.env.clone(),
        ctx.provision_options(),
    ));
    let options = ServerOptions::from_settings(&ctx.settings);

    let handle = serve(&options, state, await_shutdown_signal()).await?;
    handle.await.context("server task panicked")??;

    info!("Server stopped");
    Ok(ExitCode::SUCCESS)
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Ctrl+C received, shutting down...");
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
