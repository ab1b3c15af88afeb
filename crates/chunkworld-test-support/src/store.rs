//! Test stores — in-memory `ChunkStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chunkworld_core::chunk_id::ChunkId;
use chunkworld_core::error::StoreError;
use chunkworld_core::grid::Grid;
use chunkworld_core::store::ChunkStore;

/// A chunk store backed by a `HashMap` that records every `save` call.
/// Saves can be switched to fail on demand to exercise persistence errors.
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    chunks: Mutex<HashMap<ChunkId, Grid>>,
    saves: Mutex<Vec<ChunkId>>,
    fail_saves: AtomicBool,
}

impl MemoryChunkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `grid` under `id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_chunk(self, id: ChunkId, grid: Grid) -> Self {
        self.chunks.lock().unwrap().insert(id, grid);
        self
    }

    /// Returns the persisted copy of `id`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stored(&self, id: ChunkId) -> Option<Grid> {
        self.chunks.lock().unwrap().get(&id).cloned()
    }

    /// Returns the ids passed to `save`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved_ids(&self) -> Vec<ChunkId> {
        self.saves.lock().unwrap().clone()
    }

    /// Makes subsequent `save` calls fail (`true`) or succeed (`false`).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn load(&self, id: &ChunkId) -> Result<Option<Grid>, StoreError> {
        Ok(self.chunks.lock().unwrap().get(id).cloned())
    }

    async fn save(&self, id: &ChunkId, grid: &Grid) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.chunks.lock().unwrap().insert(*id, grid.clone());
        self.saves.lock().unwrap().push(*id);
        Ok(())
    }

    async fn clear_occupancy_all(&self) -> Result<u64, StoreError> {
        let mut chunks = self.chunks.lock().unwrap();
        for grid in chunks.values_mut() {
            grid.clear_occupancy();
        }
        Ok(chunks.len() as u64)
    }
}

/// A chunk store that always returns a backend error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingChunkStore;

#[async_trait]
impl ChunkStore for FailingChunkStore {
    async fn load(&self, _id: &ChunkId) -> Result<Option<Grid>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn save(&self, _id: &ChunkId, _grid: &Grid) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn clear_occupancy_all(&self) -> Result<u64, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }
}
