//! Server startup and shutdown logic.
//!
//! This module contains the `run_server` function which handles:
//! - Origin policy construction
//! - Database pool creation and the background connection check
//! - Route group and router creation
//! - Server binding and graceful shutdown

use crate::config::Config;
use crate::cors::OriginPolicy;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::routes::{self, RouteGroups};
use crate::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Run the web server with the given configuration.
///
/// # Errors
///
/// This function will return an error if:
/// - The database URL cannot be parsed
/// - An upstream URL is invalid
/// - Server binding fails
/// - Server runtime error occurs
///
/// A database that is unreachable at startup is logged, not returned.
pub async fn run_server(config: Config) -> AppResult<()> {
    info!("Starting habit gateway...");

    let origin_policy = OriginPolicy::new(&config.cors.allowed_origins)?;
    info!(
        allowed_origins = config.cors.allowed_origins.len(),
        "Origin policy loaded"
    );

    // Fire-and-forget: the connection outcome is only logged
    info!("Connecting to database...");
    let database = Database::connect_lazy(&config.database)?;
    database.spawn_connect();

    let state = Arc::new(AppState::new(
        origin_policy,
        config.server.json_body_limit,
        database,
    ));

    let groups = RouteGroups::upstreams(
        &config.upstreams,
        config.server.forward_body_limit,
    )?;
    let app = routes::create_router(state, groups);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server running on port {}", config.server.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create a future that resolves when a shutdown signal is received.
///
/// On Unix-like systems, this listens for both Ctrl+C (SIGINT) and SIGTERM.
/// On other platforms, it only listens for Ctrl+C. If a handler cannot be
/// installed, that signal is logged and ignored.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutdown signal received");
}
