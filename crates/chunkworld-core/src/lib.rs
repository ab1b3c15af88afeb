//! Chunkworld Core — shared world abstractions.
//!
//! This crate defines the cell encoding, chunk addressing, and the traits
//! that the hub, the chunk store, and the transport depend on. It contains
//! no infrastructure code.

pub mod cell;
pub mod chunk_id;
pub mod clock;
pub mod error;
pub mod grid;
pub mod rng;
pub mod session;
pub mod snapshot;
pub mod store;
