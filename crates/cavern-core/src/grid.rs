//! The rectangular tile grid backing the `tiles`, `height`, and resource
//! layer sections.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shape mismatch when constructing a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{cells} cells cannot fill a {width}x{height} grid")]
pub struct GridShapeError {
    pub width: usize,
    pub height: usize,
    pub cells: usize,
}

/// A rectangular 2-D array of integer cell values.
///
/// Rows are stored contiguously. The grid is always rectangular: ragged
/// input rows are repaired by the parser before construction, so `width *
/// height == cells.len()` holds for every published grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl Grid {
    /// Build a grid from row-major cells.
    pub fn from_cells(
        width: usize,
        height: usize,
        cells: Vec<u32>,
    ) -> Result<Self, GridShapeError> {
        if width * height != cells.len() {
            return Err(GridShapeError {
                width,
                height,
                cells: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// An empty 0x0 grid.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell value at `(row, col)`, or `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.cells[row * self.width + col])
    }

    /// Iterate rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.cells.chunks(self.width.max(1)).take(self.height)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// Serialize back to the on-disk form: one comma-separated line per
    /// row, each row closed by a trailing comma.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for row in self.rows() {
            for cell in row {
                out.push_str(&cell.to_string());
                out.push(',');
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cells_checks_dimensions() {
        assert!(Grid::from_cells(2, 2, vec![1, 2, 3]).is_err());
        let g = Grid::from_cells(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(g.get(0, 1), Some(2));
        assert_eq!(g.get(1, 0), Some(3));
        assert_eq!(g.get(2, 0), None);
    }

    #[test]
    fn serialize_round_trips_shape() {
        let g = Grid::from_cells(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(g.serialize(), "1,2,3,\n4,5,6,\n");
    }

    #[test]
    fn empty_grid_serializes_to_nothing() {
        assert_eq!(Grid::empty().serialize(), "");
    }
}
