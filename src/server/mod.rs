//! In-memory reference backend for the admin API.
//!
//! Implements the same routes and envelope as the production service so the
//! CLI can be exercised locally and tests run against real HTTP. State lives
//! in memory only and nothing is actually posted anywhere.

mod routes;
mod store;

pub use store::AdminStore;

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AdminConfig;

/// Full application: `/health` plus the API nested under `/api`.
pub fn router(store: AdminStore) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .nest("/api", routes::api())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &AdminConfig) -> anyhow::Result<()> {
    let store = AdminStore::new(config.drive_folders.clone());
    info!(
        "Reference backend starting with {} drive folder(s)",
        config.drive_folders.len()
    );

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}/api", listener.local_addr()?);

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
