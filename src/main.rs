//! command-relay server entry point.
//!
//! Starts the broadcast loop and the Axum HTTP server.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use command_relay::api;
use command_relay::app_state::AppState;
use command_relay::config::{LogFormat, RelayConfig};
use command_relay::service::{RelayService, spawn_broadcast_loop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RelayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(addr = %config.listen_addr, "starting command-relay");
    if config.admin_secret.is_none() {
        tracing::warn!("MAIN_KEY is not set; /actions, /kill and /commands will refuse every call");
    }

    // Build service layer
    let relay_service = Arc::new(RelayService::new(&config));
    let broadcaster = spawn_broadcast_loop(Arc::clone(&relay_service), config.broadcast_interval);

    // Build router
    let app = api::build_app(AppState::new(&config, relay_service));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .into_future();

    tokio::select! {
        result = server => result?,
        () = shutdown_signal() => tracing::info!("shutdown signal received"),
    }

    broadcaster.abort();
    tracing::info!("command-relay stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
