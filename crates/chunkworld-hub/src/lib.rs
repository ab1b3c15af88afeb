//! Chunkworld — world/session hub.
//!
//! Owns every resident chunk, the per-chunk watcher sets and all session
//! state. All mutations are serialized through one critical section; chunk
//! snapshots are fanned out to watchers after it is released.

pub mod command;
mod fanout;
pub mod hub;

pub use command::Command;
pub use hub::{Hub, Location};
