//! Chunk addressing.
//!
//! A chunk is addressed by integer coordinates `(cx, cy)`. Its textual id,
//! used as the persistence key and on the wire, is `"{cx}:{cy}"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// A step along one axis of the chunk plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards smaller rows / smaller `cy`.
    Up,
    /// Towards larger rows / larger `cy`.
    Down,
    /// Towards smaller columns / smaller `cx`.
    Left,
    /// Towards larger columns / larger `cx`.
    Right,
}

impl Direction {
    /// Returns the `(row, col)` delta of one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// Identifier of a chunk, derived from its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ChunkId {
    cx: i32,
    cy: i32,
}

impl ChunkId {
    /// The chunk every session spawns in.
    pub const ROOT: ChunkId = ChunkId { cx: 0, cy: 0 };

    /// Builds the id of the chunk at `(cx, cy)`.
    #[must_use]
    pub const fn from_coords(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// Returns the `(cx, cy)` coordinates of this chunk.
    #[must_use]
    pub const fn coords(self) -> (i32, i32) {
        (self.cx, self.cy)
    }

    /// Returns the id of the adjacent chunk one step in `direction`.
    ///
    /// Pure coordinate arithmetic; coordinates wrap at the `i32` limits.
    #[must_use]
    pub const fn neighbor(self, direction: Direction) -> Self {
        let (cx, cy) = (self.cx, self.cy);
        match direction {
            Direction::Up => Self::from_coords(cx, cy.wrapping_sub(1)),
            Direction::Down => Self::from_coords(cx, cy.wrapping_add(1)),
            Direction::Left => Self::from_coords(cx.wrapping_sub(1), cy),
            Direction::Right => Self::from_coords(cx.wrapping_add(1), cy),
        }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cx, self.cy)
    }
}

impl FromStr for ChunkId {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WorldError::InvalidChunkId(s.to_owned());
        let (cx, cy) = s.split_once(':').ok_or_else(invalid)?;
        let cx = cx.parse().map_err(|_| invalid())?;
        let cy = cy.parse().map_err(|_| invalid())?;
        Ok(Self::from_coords(cx, cy))
    }
}

impl From<ChunkId> for String {
    fn from(id: ChunkId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ChunkId {
    type Error = WorldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
