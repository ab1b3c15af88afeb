//! Chunk store abstraction.

use async_trait::async_trait;

use crate::chunk_id::ChunkId;
use crate::error::StoreError;
use crate::grid::Grid;

/// Durable key/value mapping from chunk id to grid snapshot.
///
/// `save` must replace the whole buffer atomically: a later `load` never
/// observes a partially written grid.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Loads the persisted grid for `id`, or `None` if it was never saved.
    async fn load(&self, id: &ChunkId) -> Result<Option<Grid>, StoreError>;

    /// Persists `grid` under `id`, replacing any previous copy.
    async fn save(&self, id: &ChunkId, grid: &Grid) -> Result<(), StoreError>;

    /// Clears the occupancy flag in every cell of every persisted chunk.
    /// Returns the number of chunks rewritten.
    ///
    /// Run once at startup to erase occupants left behind by sessions that
    /// vanished without a clean disconnect.
    async fn clear_occupancy_all(&self) -> Result<u64, StoreError>;
}
