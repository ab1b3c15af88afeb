//! Fixed-size chunk grid.

use std::fmt;

use crate::cell::Cell;

/// Number of columns in a chunk.
pub const WIDTH: usize = 64;

/// Number of rows in a chunk.
pub const HEIGHT: usize = 64;

/// Number of cells in a chunk.
pub const CELL_COUNT: usize = WIDTH * HEIGHT;

/// A `HEIGHT × WIDTH` grid of cells stored row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<u8>,
}

impl Grid {
    /// Creates a grid of zero cells.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: vec![0; CELL_COUNT],
        }
    }

    /// Wraps a row-major byte buffer. Returns `None` unless it holds exactly
    /// `CELL_COUNT` bytes.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        (bytes.len() == CELL_COUNT).then_some(Self { cells: bytes })
    }

    /// Returns the row-major byte buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// Returns `true` if `(row, col)` lies inside the grid.
    #[must_use]
    pub const fn contains(row: i64, col: i64) -> bool {
        #[allow(clippy::cast_possible_wrap)]
        let (height, width) = (HEIGHT as i64, WIDTH as i64);
        row >= 0 && row < height && col >= 0 && col < width
    }

    /// Reads the cell at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `(row, col)` is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Cell {
        Cell::from_byte(self.cells[Self::index(row, col)])
    }

    /// Writes the cell at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `(row, col)` is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[Self::index(row, col)] = cell.to_byte();
    }

    /// Clears the occupancy flag in every cell, returning how many were set.
    pub fn clear_occupancy(&mut self) -> usize {
        let mut cleared = 0;
        for byte in &mut self.cells {
            let cell = Cell::from_byte(*byte);
            if cell.is_occupied() {
                *byte = cell.without_occupant().to_byte();
                cleared += 1;
            }
        }
        cleared
    }

    /// Counts occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|byte| Cell::from_byte(**byte).is_occupied())
            .count()
    }

    fn index(row: usize, col: usize) -> usize {
        assert!(row < HEIGHT && col < WIDTH, "cell ({row}, {col}) out of bounds");
        row * WIDTH + col
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("width", &WIDTH)
            .field("height", &HEIGHT)
            .field("occupied", &self.occupied_count())
            .finish_non_exhaustive()
    }
}
