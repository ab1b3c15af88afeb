//! Chunkworld — SQLite persistence for chunk grids.

pub mod schema;
pub mod sqlite_chunk_store;

pub use sqlite_chunk_store::SqliteChunkStore;
