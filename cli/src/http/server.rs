//! HTTP server lifecycle

use super::{
    middleware::{create_middleware_stack, request_logger},
    routes::create_router,
    AppState,
};
use crate::commands::cli::ServeArgs;
use axum::middleware;
use buildd_core::api::{AppContext, CliError};
use std::net::SocketAddr;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

/// Handles `buildd serve`. Command-line host and port override the config.
pub async fn handle_serve(args: ServeArgs, ctx: AppContext) -> Result<(), CliError> {
    let session_id = Uuid::new_v4().to_string();

    let config = &ctx.cfg().server;
    let host = args.host.unwrap_or_else(|| config.host.clone());
    let port = args.port.unwrap_or(config.port);

    let (shutdown_tx, _) = broadcast::channel(1);
    let state = AppState::new(session_id.clone(), ctx, shutdown_tx);

    start_server(&session_id, &host, port, state)
        .await
        .map_err(|e| CliError::Server(e.to_string()))
}

/// Serves until Ctrl+C, SIGTERM or a shutdown request, then cancels every
/// in-flight operation.
pub async fn start_server(
    session_id: &str,
    host: &str,
    port: u16,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let router = create_router(state.clone());

    let app = router
        .layer(middleware::from_fn(request_logger))
        .layer(create_middleware_stack());

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(session_id, "HTTP server listening on http://{}", addr);

    let mut shutdown_rx = state.shutdown_tx.subscribe();
    let registry = state.ctx.registry().clone();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C signal");
                }
                _ = shutdown_rx.recv() => {
                    info!("Received shutdown signal from API");
                }
                _ = wait_for_sigterm() => {
                    info!("Received SIGTERM signal");
                }
            }

            // Open streams only close once their operations reach a result.
            let cancelled = registry.cancel_all();
            info!(cancelled, "Starting graceful shutdown...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

/// No SIGTERM on Windows; Ctrl+C or the shutdown API end the server.
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
