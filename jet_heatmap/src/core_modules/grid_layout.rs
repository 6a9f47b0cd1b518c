// THEORY:
// `GridLayout` is the geometry of one accumulation session: how the canvas is cut
// into `columns × rows` cells and where a given cell lands in pixel space.
//
// The caller addresses cells with absolute spreadsheet coordinates. The layout works
// in coordinates relative to an origin (normally the first cell seen), so a range
// starting at row 5, column 5 paints from the top-left corner of the canvas.
//
// Step sizes are rounded up (`ceil(width / columns)`), so a 100 px canvas split into
// 3 columns uses 34 px steps and the last column is clipped by the canvas.

use crate::core_modules::canvas::canvas::CellRect;
use crate::error::{HeatmapError, Result};
use serde::Deserialize;

/// Largest RGB canvas a session allocates, in bytes.
pub const MAX_CANVAS_BYTES: u64 = 1 << 30;

/// Absolute (row, col) of the cell painted at the top-left of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridOrigin {
    pub row: i32,
    pub col: i32,
}

/// A cell position relative to the origin, already bounds-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeCell {
    pub row: u32,
    pub col: u32,
}

/// Fixed geometry of a session's canvas and grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Number of grid columns across the canvas.
    pub columns: u32,
    /// Number of grid rows down the canvas.
    pub rows: u32,
    /// Width of one cell rectangle in pixels.
    pub w_step: u32,
    /// Height of one cell rectangle in pixels.
    pub h_step: u32,
}

impl GridLayout {
    pub fn new(width: u32, height: u32, columns: u32, rows: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(HeatmapError::InvalidSettings(format!(
                "canvas must be at least 1x1 pixels, got {width}x{height}"
            )));
        }
        if columns == 0 || rows == 0 {
            return Err(HeatmapError::InvalidSettings(format!(
                "grid must have at least one column and row, got {columns}x{rows}"
            )));
        }

        let canvas_bytes = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(3));
        if canvas_bytes.is_none_or(|bytes| bytes > MAX_CANVAS_BYTES) {
            return Err(HeatmapError::InvalidSettings(format!(
                "canvas of {width}x{height} pixels exceeds {MAX_CANVAS_BYTES} bytes"
            )));
        }
        // Every cell needs at least one pixel, which also bounds the cell count.
        if columns > width || rows > height {
            return Err(HeatmapError::InvalidSettings(format!(
                "grid of {columns}x{rows} cells does not fit a {width}x{height} canvas"
            )));
        }

        Ok(Self {
            width,
            height,
            columns,
            rows,
            w_step: width.div_ceil(columns),
            h_step: height.div_ceil(rows),
        })
    }

    /// Total number of cells a complete session receives.
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Converts absolute coordinates to origin-relative ones, rejecting cells
    /// before the origin or past the configured extents.
    pub fn relative(&self, origin: GridOrigin, row: i32, col: i32) -> Result<RelativeCell> {
        let d_row = row as i64 - origin.row as i64;
        let d_col = col as i64 - origin.col as i64;

        if d_row < 0 || d_col < 0 || d_row >= self.rows as i64 || d_col >= self.columns as i64 {
            return Err(HeatmapError::CellOutOfBounds {
                row,
                col,
                columns: self.columns,
                rows: self.rows,
            });
        }

        Ok(RelativeCell {
            row: d_row as u32,
            col: d_col as u32,
        })
    }

    /// Row-major index of a relative cell.
    pub fn index(&self, cell: RelativeCell) -> usize {
        cell.row as usize * self.columns as usize + cell.col as usize
    }

    /// The canvas rectangle a relative cell paints.
    pub fn cell_rect(&self, cell: RelativeCell) -> CellRect {
        CellRect::new(
            cell.col as i64 * self.w_step as i64,
            cell.row as i64 * self.h_step as i64,
            self.w_step,
            self.h_step,
        )
    }
}
