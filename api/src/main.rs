//! Shavasa Support Desk API - Main Entry Point

use anyhow::Context;
use shavasa_api::middleware::cors::cors_layer;
use shavasa_api::{build_router, ApiConfig, ApiState};
use shavasa_support::{MongoStore, SupportDesk};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Shavasa Support Desk API v{}", env!("CARGO_PKG_VERSION"));

    let config = ApiConfig::from_env().context("config")?;

    let store = MongoStore::connect(&config.database.uri, &config.database.name)
        .await
        .context("mongodb")?;
    store.setup_collections().await.context("setup collections")?;

    let desk = SupportDesk::new(Arc::new(store.agents()), Arc::new(store.tickets()));
    let app = build_router(
        ApiState::new(Arc::new(desk)),
        cors_layer(&config.cors).context("cors")?,
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("bind {}", config.listen_addr()))?;
    tracing::info!("Server is running on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server")?;

    store.close().await;
    tracing::info!("shutdown complete");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
