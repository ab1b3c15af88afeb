//! Liveness probe that also advertises the chunk geometry.

use axum::{Json, Router, routing::get};
use chunkworld_core::grid::{HEIGHT, WIDTH};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /`.
#[derive(Serialize)]
pub struct WorldInfo {
    pub ok: bool,
    pub width: usize,
    pub height: usize,
}

async fn world_info() -> Json<WorldInfo> {
    Json(WorldInfo {
        ok: true,
        width: WIDTH,
        height: HEIGHT,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(world_info))
}
