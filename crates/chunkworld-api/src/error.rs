//! Chunkworld — API error types.

use chunkworld_core::error::{StoreError, WorldError};
use thiserror::Error;

/// Startup and runtime errors for the server process.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration or startup sanitizing failed.
    #[error("chunk store error: {0}")]
    Store(#[from] StoreError),

    /// Draining the hub on shutdown failed.
    #[error("world error: {0}")]
    World(#[from] WorldError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}
