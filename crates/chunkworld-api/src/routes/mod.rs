//! Route modules.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod world;
pub mod ws;

/// Returns every route the server exposes, before state is attached.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(world::router())
        .merge(health::router())
        .merge(ws::router())
}
