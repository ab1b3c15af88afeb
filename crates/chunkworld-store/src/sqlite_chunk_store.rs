//! SQLite implementation of the `ChunkStore` trait.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, info};

use chunkworld_core::cell::Cell;
use chunkworld_core::chunk_id::ChunkId;
use chunkworld_core::clock::Clock;
use chunkworld_core::error::StoreError;
use chunkworld_core::grid::{CELL_COUNT, Grid, HEIGHT, WIDTH};
use chunkworld_core::store::ChunkStore;

use crate::schema;

#[allow(clippy::cast_possible_wrap)]
const WIDTH_COLUMN: i64 = WIDTH as i64;
#[allow(clippy::cast_possible_wrap)]
const HEIGHT_COLUMN: i64 = HEIGHT as i64;

/// SQLite-backed chunk store. Each chunk is one row holding its whole grid as
/// a blob, so a save replaces the buffer in a single statement.
#[derive(Clone)]
pub struct SqliteChunkStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SqliteChunkStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteChunkStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl SqliteChunkStore {
    /// Creates a new `SqliteChunkStore`. `clock` stamps `last_used`.
    #[must_use]
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Creates the `chunks` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the statement fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(schema::CREATE_CHUNKS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    fn now(&self) -> i64 {
        self.clock.unix_seconds()
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl ChunkStore for SqliteChunkStore {
    async fn load(&self, id: &ChunkId) -> Result<Option<Grid>, StoreError> {
        let key = id.to_string();
        let row: Option<(Vec<u8>, i64, i64)> =
            sqlx::query_as("SELECT data, width, height FROM chunks WHERE id = ?")
                .bind(&key)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        let Some((data, width, height)) = row else {
            return Ok(None);
        };

        if (width, height) != (WIDTH_COLUMN, HEIGHT_COLUMN) {
            return Err(StoreError::Dimensions {
                id: *id,
                width,
                height,
            });
        }
        let actual = data.len();
        let grid = Grid::from_bytes(data).ok_or(StoreError::Corrupt {
            id: *id,
            expected: CELL_COUNT,
            actual,
        })?;

        sqlx::query("UPDATE chunks SET last_used = ? WHERE id = ?")
            .bind(self.now())
            .bind(&key)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(Some(grid))
    }

    async fn save(&self, id: &ChunkId, grid: &Grid) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO chunks (id, width, height, data, last_used)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
              width = excluded.width,
              height = excluded.height,
              data = excluded.data,
              last_used = excluded.last_used
            ",
        )
        .bind(id.to_string())
        .bind(WIDTH_COLUMN)
        .bind(HEIGHT_COLUMN)
        .bind(grid.as_bytes())
        .bind(self.now())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        debug!(chunk = %id, "chunk saved");
        Ok(())
    }

    async fn clear_occupancy_all(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let rows: Vec<(String, Vec<u8>)> = sqlx::query_as("SELECT id, data FROM chunks")
            .fetch_all(&mut *tx)
            .await
            .map_err(backend)?;

        let now = self.now();
        let mut rewritten = 0u64;
        for (id, mut data) in rows {
            for byte in &mut data {
                *byte = Cell::from_byte(*byte).without_occupant().to_byte();
            }
            sqlx::query("UPDATE chunks SET data = ?, last_used = ? WHERE id = ?")
                .bind(data)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
            rewritten += 1;
        }
        tx.commit().await.map_err(backend)?;

        info!(chunks = rewritten, "cleared stale occupants");
        Ok(rewritten)
    }
}
