//! Shared application state.

use std::sync::Arc;

use chunkworld_hub::Hub;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The world hub every WebSocket session attaches to.
    pub hub: Arc<Hub>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }
}
