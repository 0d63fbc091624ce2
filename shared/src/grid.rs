//! Discrete booth grid and its mapping onto the logical canvas.
//!
//! The editor and the attendee renderer both read stored placements through
//! these constants, so they must not drift apart.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::{CanvasPoint, CanvasRect};

pub const GRID_ROWS: u8 = 8;
pub const GRID_COLS: u8 = 12;

pub const CANVAS_WIDTH: f64 = 1200.0;
pub const CANVAS_HEIGHT: f64 = 800.0;

const ROW_LETTERS: [char; GRID_ROWS as usize] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

#[derive(
    Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct GridPosition {
    pub row: u8,
    pub col: u8,
}

impl GridPosition {
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if row < GRID_ROWS && col < GRID_COLS {
            Some(Self { row, col })
        } else {
            None
        }
    }

    pub fn clamped(row: i64, col: i64) -> Self {
        Self {
            row: row.clamp(0, GRID_ROWS as i64 - 1) as u8,
            col: col.clamp(0, GRID_COLS as i64 - 1) as u8,
        }
    }

    /// Human label such as `C7` (row letter, one-based column).
    pub fn label(&self) -> String {
        format!("{}{}", ROW_LETTERS[self.row as usize], self.col + 1)
    }

    pub fn parse_label(label: &str) -> Option<Self> {
        let mut chars = label.trim().chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let row = ROW_LETTERS.iter().position(|candidate| *candidate == letter)?;
        let col: u8 = chars.as_str().parse().ok()?;
        if col == 0 {
            return None;
        }
        Self::new(row as u8, col - 1)
    }

    pub fn all() -> impl Iterator<Item = GridPosition> {
        (0..GRID_ROWS).flat_map(|row| (0..GRID_COLS).map(move |col| GridPosition { row, col }))
    }
}

/// Cell edge length for one rendering session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellSize {
    Desktop,
    Touch,
}

impl CellSize {
    pub fn pixels(self) -> f64 {
        match self {
            CellSize::Desktop => 100.0,
            CellSize::Touch => 72.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridMapper {
    cell: f64,
}

impl GridMapper {
    pub fn new(size: CellSize) -> Self {
        Self { cell: size.pixels() }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell
    }

    /// Top-left corner of the cell. Callers clamp positions beforehand.
    pub fn grid_to_coordinates(&self, position: GridPosition) -> CanvasPoint {
        CanvasPoint {
            x: position.col as f64 * self.cell,
            y: position.row as f64 * self.cell,
        }
    }

    pub fn coordinates_to_grid(&self, point: CanvasPoint) -> GridPosition {
        let row = (point.y / self.cell).round();
        let col = (point.x / self.cell).round();
        GridPosition::clamped(row as i64, col as i64)
    }

    pub fn cell_rect(&self, position: GridPosition) -> CanvasRect {
        let origin = self.grid_to_coordinates(position);
        CanvasRect::new(origin.x, origin.y, self.cell, self.cell)
    }

    pub fn grid_width(&self) -> f64 {
        GRID_COLS as f64 * self.cell
    }

    pub fn grid_height(&self) -> f64 {
        GRID_ROWS as f64 * self.cell
    }
}

impl Default for GridMapper {
    fn default() -> Self {
        Self::new(CellSize::Desktop)
    }
}
