//! Discrete grid geometry
//!
//! Cells are pixel coordinates snapped to multiples of the cell size, so a
//! 400x400 canvas with 20px cells has cells `(0,0)` through `(380,380)`.

use std::collections::HashSet;

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{MIN_COLUMNS, MIN_ROWS};
use crate::error::ConfigError;

/// A grid cell in pixel coordinates (always a multiple of the cell size)
pub type Cell = IVec2;

/// Validated playfield dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Canvas width in pixels
    pub width: i32,
    /// Canvas height in pixels
    pub height: i32,
    /// Cell edge length in pixels
    pub cell_size: i32,
}

impl Grid {
    pub fn new(width: i32, height: i32, cell_size: i32) -> Result<Self, ConfigError> {
        if width <= 0 || height <= 0 || cell_size <= 0 {
            return Err(ConfigError::NonPositiveDimension {
                width,
                height,
                cell_size,
            });
        }
        if width % cell_size != 0 || height % cell_size != 0 {
            return Err(ConfigError::NotCellAligned {
                width,
                height,
                cell_size,
            });
        }
        let grid = Self {
            width,
            height,
            cell_size,
        };
        if grid.columns() < MIN_COLUMNS || grid.rows() < MIN_ROWS {
            return Err(ConfigError::GridTooSmall {
                columns: grid.columns(),
                rows: grid.rows(),
                min_columns: MIN_COLUMNS,
                min_rows: MIN_ROWS,
            });
        }
        Ok(grid)
    }

    #[inline]
    pub fn columns(&self) -> i32 {
        self.width / self.cell_size
    }

    #[inline]
    pub fn rows(&self) -> i32 {
        self.height / self.cell_size
    }

    /// Total number of cells
    pub fn capacity(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    /// Cell at column/row index
    #[inline]
    pub fn cell_at(&self, column: i32, row: i32) -> Cell {
        IVec2::new(column * self.cell_size, row * self.cell_size)
    }

    /// Uniformly random cell
    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Cell {
        let column = rng.random_range(0..self.columns());
        let row = rng.random_range(0..self.rows());
        self.cell_at(column, row)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    /// Map an out-of-range cell onto the opposite edge
    pub fn wrap(&self, cell: Cell) -> Cell {
        IVec2::new(cell.x.rem_euclid(self.width), cell.y.rem_euclid(self.height))
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows()).flat_map(move |row| (0..self.columns()).map(move |col| self.cell_at(col, row)))
    }

    /// In-bounds cells within `radius` cells (Euclidean) of `center`
    pub fn cells_within(&self, center: Cell, radius: i32) -> HashSet<Cell> {
        let mut visible = HashSet::new();
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let cell = center + IVec2::new(dx, dy) * self.cell_size;
                if self.in_bounds(cell) {
                    visible.insert(cell);
                }
            }
        }
        visible
    }

    /// Center cell used to lay out the starting snake
    pub fn center(&self) -> Cell {
        self.cell_at(self.columns() / 2, self.rows() / 2)
    }
}
