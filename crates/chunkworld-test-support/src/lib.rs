//! Shared test mocks and utilities for the Chunkworld server.

mod clock;
mod rng;
mod sink;
mod store;

pub use clock::FixedClock;
pub use rng::{MockRng, SequenceRng};
pub use sink::{DroppableSink, FailingSink, RecordingSink};
pub use store::{FailingChunkStore, MemoryChunkStore};
