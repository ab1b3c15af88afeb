//! The world hub: chunk residency, session lifecycle and movement.
//!
//! Every state-changing operation runs inside the hub's single lock. Chunk
//! edits are made on a working copy, written through to the `ChunkStore`, and
//! only then committed to memory, so the resident grid and its persisted copy
//! agree whenever the lock is released. Snapshots go out after the lock is
//! dropped.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chunkworld_core::cell::Cell;
use chunkworld_core::chunk_id::{ChunkId, Direction};
use chunkworld_core::error::WorldError;
use chunkworld_core::grid::{CELL_COUNT, Grid, HEIGHT, WIDTH};
use chunkworld_core::rng::DeterministicRng;
use chunkworld_core::session::{SessionId, SessionSink};
use chunkworld_core::store::ChunkStore;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::command::Command;

/// Random probes made for a free spawn cell before scanning the chunk.
pub const SPAWN_ATTEMPTS: usize = 4096;

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// The chunk containing the session.
    pub chunk: ChunkId,
    /// Row inside the chunk.
    pub row: usize,
    /// Column inside the chunk.
    pub col: usize,
}

/// A session's rendered presence in the world.
#[derive(Debug, Clone, Copy)]
struct Avatar {
    /// Fixed for the session's lifetime.
    color: Cell,
    /// Color of the cell under the session; never carries the occupant flag.
    ground: Cell,
    location: Location,
}

#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) sink: Arc<dyn SessionSink>,
    avatar: Avatar,
}

impl SessionState {
    pub(crate) fn location(&self) -> Location {
        self.avatar.location
    }
}

pub(crate) struct World {
    pub(crate) chunks: HashMap<ChunkId, Grid>,
    pub(crate) watchers: HashMap<ChunkId, HashSet<SessionId>>,
    pub(crate) sessions: HashMap<SessionId, SessionState>,
    rng: Box<dyn DeterministicRng>,
}

impl World {
    fn relocate(&mut self, session: SessionId, location: Location, ground: Cell) {
        if let Some(state) = self.sessions.get_mut(&session) {
            state.avatar.location = location;
            state.avatar.ground = ground;
        }
    }
}

/// Owner of all world and session state.
pub struct Hub {
    pub(crate) world: Mutex<World>,
    store: Arc<dyn ChunkStore>,
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub").finish_non_exhaustive()
    }
}

impl Hub {
    /// Creates a hub with no resident chunks and no sessions.
    #[must_use]
    pub fn new(store: Arc<dyn ChunkStore>, rng: Box<dyn DeterministicRng>) -> Self {
        Self {
            world: Mutex::new(World {
                chunks: HashMap::new(),
                watchers: HashMap::new(),
                sessions: HashMap::new(),
                rng,
            }),
            store,
        }
    }

    /// Spawns `session` on a free cell of the root chunk with a random fixed
    /// color, then broadcasts the root chunk (which includes the newcomer).
    ///
    /// Connecting an id that is already active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::NoVacancy` if every root cell is occupied, or
    /// `WorldError::Store` if the root chunk cannot be loaded or saved.
    pub async fn connect(
        &self,
        session: SessionId,
        sink: Arc<dyn SessionSink>,
    ) -> Result<(), WorldError> {
        let chunk = ChunkId::ROOT;
        {
            let mut world = self.world.lock().await;
            if world.sessions.contains_key(&session) {
                debug!(%session, "session already connected");
                return Ok(());
            }

            let mut grid = self.resident_copy(&mut world, chunk).await?;
            let (row, col) = find_vacant_cell(&grid, world.rng.as_mut())
                .ok_or(WorldError::NoVacancy(chunk))?;
            let color = random_color(world.rng.as_mut());
            let ground = grid.get(row, col).without_occupant();
            grid.set(row, col, color.with_occupant());
            self.commit(&mut world, chunk, grid).await?;

            world.sessions.insert(
                session,
                SessionState {
                    sink,
                    avatar: Avatar {
                        color,
                        ground,
                        location: Location { chunk, row, col },
                    },
                },
            );
            world.watchers.entry(chunk).or_default().insert(session);
            info!(%session, %chunk, row, col, "session connected");
        }
        self.fanout(vec![chunk]).await
    }

    /// Removes `session`, restoring the ground under it and broadcasting the
    /// vacated chunk to the remaining watchers. No-op for unknown sessions.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::Store` if the restored chunk cannot be saved. The
    /// session's bookkeeping is removed regardless.
    pub async fn disconnect(&self, session: SessionId) -> Result<(), WorldError> {
        match self.detach(session).await? {
            Some(chunk) => self.fanout(vec![chunk]).await,
            None => Ok(()),
        }
    }

    /// Moves `session` by `(d_row, d_col)`, crossing into the neighboring
    /// chunk when the target leaves the grid. Moves onto an occupied cell are
    /// silently rejected. No-op for unknown sessions.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::Store` if a chunk cannot be loaded or saved; the
    /// world is left as it was before the move.
    pub async fn move_by(
        &self,
        session: SessionId,
        d_row: i32,
        d_col: i32,
    ) -> Result<(), WorldError> {
        let touched = {
            let mut world = self.world.lock().await;
            let Some(avatar) = world.sessions.get(&session).map(|s| s.avatar) else {
                return Ok(());
            };
            let from = avatar.location;
            #[allow(clippy::cast_possible_wrap)]
            let (row, col) = (
                from.row as i64 + i64::from(d_row),
                from.col as i64 + i64::from(d_col),
            );

            if Grid::contains(row, col) {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let to = Location {
                    chunk: from.chunk,
                    row: row as usize,
                    col: col as usize,
                };
                self.step_within(&mut world, session, avatar, to).await?
            } else {
                let direction = exit_direction(row, col);
                self.step_across(&mut world, session, avatar, direction)
                    .await?
            }
        };
        self.fanout(touched).await
    }

    /// Advances the ground color under `session` on every channel and shows
    /// it immediately beneath the occupant. The new ground stays after the
    /// session leaves. No-op for unknown sessions.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::Store` if the chunk cannot be saved.
    pub async fn paint(&self, session: SessionId) -> Result<(), WorldError> {
        let chunk = {
            let mut world = self.world.lock().await;
            let Some(avatar) = world.sessions.get(&session).map(|s| s.avatar) else {
                return Ok(());
            };
            let Location { chunk, row, col } = avatar.location;
            let ground = avatar.ground.increment_color();

            let mut grid = self.resident_copy(&mut world, chunk).await?;
            grid.set(row, col, ground.with_occupant());
            self.commit(&mut world, chunk, grid).await?;
            world.relocate(session, avatar.location, ground);
            debug!(%session, %chunk, row, col, ground = ground.to_byte(), "ground painted");
            chunk
        };
        self.fanout(vec![chunk]).await
    }

    /// Sends `session` a snapshot of the chunk it stands in. No-op for unknown
    /// sessions.
    ///
    /// # Errors
    ///
    /// Returns `WorldError` if the snapshot cannot be encoded, or if the
    /// delivery fails and the resulting disconnect cannot be persisted.
    pub async fn status(&self, session: SessionId) -> Result<(), WorldError> {
        self.send_current_chunk(session).await
    }

    /// Dispatches a parsed client command.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying operation.
    pub async fn apply(&self, session: SessionId, command: Command) -> Result<(), WorldError> {
        match command {
            Command::Step(direction) => {
                let (d_row, d_col) = direction.delta();
                self.move_by(session, d_row, d_col).await
            }
            Command::Paint => self.paint(session).await,
            Command::Status => self.status(session).await,
        }
    }

    /// Disconnects every active session so the ground under each is restored.
    ///
    /// # Errors
    ///
    /// Returns the first disconnect error; the remaining sessions are still
    /// disconnected.
    pub async fn shutdown(&self) -> Result<(), WorldError> {
        let sessions: Vec<SessionId> = self.world.lock().await.sessions.keys().copied().collect();
        info!(count = sessions.len(), "disconnecting all sessions");

        let mut first_error = None;
        for session in sessions {
            if let Err(err) = self.disconnect(session).await {
                error!(%session, error = %err, "failed to disconnect session during shutdown");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Returns where `session` stands, if it is active.
    pub async fn location(&self, session: SessionId) -> Option<Location> {
        let world = self.world.lock().await;
        world.sessions.get(&session).map(SessionState::location)
    }

    /// Returns the saved ground under `session`, if it is active.
    pub async fn ground(&self, session: SessionId) -> Option<Cell> {
        let world = self.world.lock().await;
        world.sessions.get(&session).map(|s| s.avatar.ground)
    }

    /// Returns the fixed color of `session`, if it is active.
    pub async fn color(&self, session: SessionId) -> Option<Cell> {
        let world = self.world.lock().await;
        world.sessions.get(&session).map(|s| s.avatar.color)
    }

    /// Returns the resident cell at `(row, col)` of `chunk`, if the chunk is
    /// resident and the position lies inside it.
    pub async fn cell(&self, chunk: ChunkId, row: usize, col: usize) -> Option<Cell> {
        if row >= HEIGHT || col >= WIDTH {
            return None;
        }
        let world = self.world.lock().await;
        world.chunks.get(&chunk).map(|grid| grid.get(row, col))
    }

    /// Returns the sessions watching `chunk`, sorted.
    pub async fn watchers(&self, chunk: ChunkId) -> Vec<SessionId> {
        let world = self.world.lock().await;
        let mut ids: Vec<SessionId> = world
            .watchers
            .get(&chunk)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Returns the number of active sessions.
    pub async fn session_count(&self) -> usize {
        self.world.lock().await.sessions.len()
    }

    /// Removes `session` and restores its cell, returning the vacated chunk.
    /// Returns `None` if the session was not active.
    pub(crate) async fn detach(&self, session: SessionId) -> Result<Option<ChunkId>, WorldError> {
        let mut world = self.world.lock().await;
        let Some(state) = world.sessions.remove(&session) else {
            return Ok(None);
        };
        let Location { chunk, row, col } = state.avatar.location;
        if let Some(watchers) = world.watchers.get_mut(&chunk) {
            watchers.remove(&session);
        }

        let mut grid = self.resident_copy(&mut world, chunk).await?;
        grid.set(row, col, state.avatar.ground);
        self.commit(&mut world, chunk, grid).await?;
        info!(%session, %chunk, row, col, "session disconnected");
        Ok(Some(chunk))
    }

    async fn step_within(
        &self,
        world: &mut World,
        session: SessionId,
        avatar: Avatar,
        to: Location,
    ) -> Result<Vec<ChunkId>, WorldError> {
        let from = avatar.location;
        let mut grid = self.resident_copy(world, from.chunk).await?;
        let target = grid.get(to.row, to.col);
        if target.is_occupied() {
            debug!(%session, chunk = %from.chunk, row = to.row, col = to.col, "move blocked");
            return Ok(Vec::new());
        }

        grid.set(from.row, from.col, avatar.ground);
        grid.set(to.row, to.col, avatar.color.with_occupant());
        self.commit(world, from.chunk, grid).await?;
        world.relocate(session, to, target.without_occupant());
        Ok(vec![from.chunk])
    }

    async fn step_across(
        &self,
        world: &mut World,
        session: SessionId,
        avatar: Avatar,
        direction: Direction,
    ) -> Result<Vec<ChunkId>, WorldError> {
        let from = avatar.location;
        let (row, col) = entry_cell(direction, from.row, from.col);
        let to = Location {
            chunk: from.chunk.neighbor(direction),
            row,
            col,
        };

        let mut old_grid = self.resident_copy(world, from.chunk).await?;
        let mut new_grid = self.resident_copy(world, to.chunk).await?;
        let target = new_grid.get(row, col);
        if target.is_occupied() {
            debug!(%session, chunk = %to.chunk, row, col, "boundary crossing blocked");
            return Ok(Vec::new());
        }

        let original = old_grid.clone();
        old_grid.set(from.row, from.col, avatar.ground);
        new_grid.set(row, col, avatar.color.with_occupant());

        self.store.save(&from.chunk, &old_grid).await?;
        if let Err(err) = self.store.save(&to.chunk, &new_grid).await {
            if let Err(rollback) = self.store.save(&from.chunk, &original).await {
                error!(chunk = %from.chunk, error = %rollback, "failed to roll back chunk after aborted crossing");
            }
            return Err(err.into());
        }
        world.chunks.insert(from.chunk, old_grid);
        world.chunks.insert(to.chunk, new_grid);

        if let Some(watchers) = world.watchers.get_mut(&from.chunk) {
            watchers.remove(&session);
        }
        world.watchers.entry(to.chunk).or_default().insert(session);
        world.relocate(session, to, target.without_occupant());
        debug!(%session, from = %from.chunk, to = %to.chunk, ?direction, "session crossed chunk boundary");
        Ok(vec![from.chunk, to.chunk])
    }

    /// Makes `id` resident (loading it, or creating and persisting an empty
    /// grid) and returns a working copy of it.
    async fn resident_copy(&self, world: &mut World, id: ChunkId) -> Result<Grid, WorldError> {
        if let Some(grid) = world.chunks.get(&id) {
            return Ok(grid.clone());
        }
        let grid = if let Some(grid) = self.store.load(&id).await? {
            debug!(chunk = %id, "chunk loaded");
            grid
        } else {
            let grid = Grid::new();
            self.store.save(&id, &grid).await?;
            debug!(chunk = %id, "chunk created");
            grid
        };
        world.chunks.insert(id, grid.clone());
        world.watchers.entry(id).or_default();
        Ok(grid)
    }

    /// Persists `grid` and, once the store accepted it, makes it resident.
    async fn commit(&self, world: &mut World, id: ChunkId, grid: Grid) -> Result<(), WorldError> {
        self.store.save(&id, &grid).await?;
        world.chunks.insert(id, grid);
        Ok(())
    }
}

/// Picks the side of the grid a step left through. Rows are checked before
/// columns.
fn exit_direction(row: i64, col: i64) -> Direction {
    #[allow(clippy::cast_possible_wrap)]
    let height = HEIGHT as i64;
    if row < 0 {
        Direction::Up
    } else if row >= height {
        Direction::Down
    } else if col < 0 {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// The cell on the opposite edge of the neighbor chunk where a crossing lands.
fn entry_cell(direction: Direction, row: usize, col: usize) -> (usize, usize) {
    match direction {
        Direction::Up => (HEIGHT - 1, col),
        Direction::Down => (0, col),
        Direction::Left => (row, WIDTH - 1),
        Direction::Right => (row, 0),
    }
}

/// Probes random cells, then scans row-major from the center. Never returns
/// an occupied cell.
fn find_vacant_cell(grid: &Grid, rng: &mut dyn DeterministicRng) -> Option<(usize, usize)> {
    for _ in 0..SPAWN_ATTEMPTS {
        let row = draw_index(rng, HEIGHT);
        let col = draw_index(rng, WIDTH);
        if !grid.get(row, col).is_occupied() {
            return Some((row, col));
        }
    }

    let center = (HEIGHT / 2) * WIDTH + WIDTH / 2;
    (0..CELL_COUNT)
        .map(|offset| (center + offset) % CELL_COUNT)
        .map(|index| (index / WIDTH, index % WIDTH))
        .find(|&(row, col)| !grid.get(row, col).is_occupied())
}

#[allow(clippy::cast_possible_truncation)]
fn draw_index(rng: &mut dyn DeterministicRng, bound: usize) -> usize {
    (rng.next_u32_range(0, (bound - 1) as u32) as usize).min(bound - 1)
}

/// `Cell::from_rgb` masks each channel, so the narrowing cast is lossless.
#[allow(clippy::cast_possible_truncation)]
fn random_color(rng: &mut dyn DeterministicRng) -> Cell {
    let mut channel = || rng.next_u32_range(0, 3) as u8;
    let (red, green, blue) = (channel(), channel(), channel());
    Cell::from_rgb(red, green, blue)
}
