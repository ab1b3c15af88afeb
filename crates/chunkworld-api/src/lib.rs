//! Chunkworld — HTTP and WebSocket surface over the world hub.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
