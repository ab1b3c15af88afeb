//! Chunkworld server entry point.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chunkworld_api::config::ServerConfig;
use chunkworld_api::error::AppError;
use chunkworld_api::routes;
use chunkworld_api::state::AppState;
use chunkworld_core::clock::SystemClock;
use chunkworld_core::rng::SystemRng;
use chunkworld_core::store::ChunkStore;
use chunkworld_hub::Hub;
use chunkworld_store::SqliteChunkStore;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Chunkworld server");

    let config = ServerConfig::from_env()?;

    // Open the chunk database, creating its directory on first run.
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let parent = Path::new(options.get_filename())
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        tokio::fs::create_dir_all(dir).await?;
    }
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    let store = SqliteChunkStore::new(pool, Arc::new(SystemClock));
    store.migrate().await?;
    let cleared = store.clear_occupancy_all().await?;
    tracing::info!(chunks = cleared, "startup sanitizer finished");

    let store: Arc<dyn ChunkStore> = Arc::new(store);
    let hub = Arc::new(Hub::new(store, Box::new(SystemRng::new())));

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(Arc::clone(&hub)));

    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    hub.shutdown().await?;
    tracing::info!("Chunkworld server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
