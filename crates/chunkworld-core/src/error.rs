//! World error types.

use thiserror::Error;

use crate::chunk_id::ChunkId;
use crate::grid::{HEIGHT, WIDTH};

/// Errors raised by a `ChunkStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database failed.
    #[error("chunk store backend error: {0}")]
    Backend(String),

    /// A persisted chunk does not have the expected size.
    #[error("corrupt chunk {id}: expected {expected} bytes, found {actual}")]
    Corrupt {
        /// The chunk that failed to decode.
        id: ChunkId,
        /// The expected buffer length.
        expected: usize,
        /// The length actually stored.
        actual: usize,
    },

    /// A persisted chunk declares a shape other than the fixed grid.
    #[error(
        "chunk {id} stored as {width}x{height}, expected {grid_width}x{grid_height}",
        grid_width = WIDTH,
        grid_height = HEIGHT
    )]
    Dimensions {
        /// The chunk that failed to decode.
        id: ChunkId,
        /// Stored width column.
        width: i64,
        /// Stored height column.
        height: i64,
    },
}

/// Top-level world error type.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Persisting or loading a chunk failed.
    #[error("persistence error: {0}")]
    Store(#[from] StoreError),

    /// A chunk id string could not be parsed.
    #[error("invalid chunk id: {0:?}")]
    InvalidChunkId(String),

    /// Every cell of a spawn chunk is occupied.
    #[error("no vacant cell in chunk {0}")]
    NoVacancy(ChunkId),

    /// A snapshot could not be encoded.
    #[error("snapshot encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
