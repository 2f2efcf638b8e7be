//! Webhook receiver for the `listen` command.

use std::net::SocketAddr;
use std::sync::Arc;

use anibridge_library::LibraryProvider;
use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tokio::signal;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod routes_webhook;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub provider: Arc<dyn LibraryProvider>,
}

impl AppContext {
    pub fn new(provider: impl LibraryProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }
}

/// Create the Axum router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook", post(routes_webhook::handle_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Serve webhooks until Ctrl+C or SIGTERM.
pub async fn start_server(ctx: AppContext, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("Invalid server address")?;

    let app = create_router(ctx);

    tracing::info!("Listening for webhooks on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
