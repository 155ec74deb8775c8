//! Webhook Event Log Server - Binary Entry Point
//!
//! Reads its configuration from the environment, opens the event log and
//! serves the HTTP API until SIGINT or SIGTERM.

mod shutdown;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webhook_events::{create_router, AppConfig, AppState, AttachmentStore, EventStore};

use shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Starting {} v{}",
        webhook_events::NAME,
        webhook_events::VERSION
    );

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;

    // A corrupt snapshot stops startup unless DISCARD_CORRUPT_SNAPSHOT is set
    let store = EventStore::open(&config.store).map_err(|e| {
        tracing::error!("Failed to open event log: {}", e);
        e
    })?;
    let store = Arc::new(store);

    let attachments = AttachmentStore::new(&config.images_dir);
    attachments.ensure_dir().map_err(|e| {
        tracing::error!(
            "Failed to create images directory {}: {}",
            config.images_dir.display(),
            e
        );
        e
    })?;

    let state = Arc::new(AppState::new(
        store.clone(),
        attachments,
        config.max_upload_bytes,
    ));
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!("Webhook server listening on http://{}", config.listen);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Flushing event log...");
    store.close()?;
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
