//! Outbound chunk snapshot payload.

use serde::{Deserialize, Serialize};

use crate::chunk_id::ChunkId;
use crate::grid::{Grid, HEIGHT, WIDTH};

/// Discriminator of the outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// A full chunk matrix.
    Matrix,
}

/// The full state of one chunk as sent to watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkSnapshot {
    /// Always `"matrix"`.
    #[serde(rename = "type")]
    pub kind: SnapshotKind,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// The chunk this snapshot belongs to.
    pub chunk_id: ChunkId,
    /// Row-major cell bytes, `width * height` long.
    pub data: Vec<u8>,
}

impl ChunkSnapshot {
    /// Captures the current contents of `grid`.
    #[must_use]
    pub fn capture(chunk_id: ChunkId, grid: &Grid) -> Self {
        Self {
            kind: SnapshotKind::Matrix,
            width: WIDTH,
            height: HEIGHT,
            chunk_id,
            data: grid.as_bytes().to_vec(),
        }
    }

    /// Encodes the snapshot as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::grid::CELL_COUNT;

    #[test]
    fn test_json_shape_matches_wire_format() {
        let mut grid = Grid::new();
        grid.set(0, 1, Cell::from_byte(9));
        let id = ChunkId::from_coords(0, -1);

        let json: serde_json::Value =
            serde_json::from_str(&ChunkSnapshot::capture(id, &grid).to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "matrix");
        assert_eq!(json["width"], 64);
        assert_eq!(json["height"], 64);
        assert_eq!(json["chunkId"], "0:-1");
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), CELL_COUNT);
        assert_eq!(data[1], 9);
    }
}
