//! UI layout collaborators.
//!
//! The surface never lays anything out itself. It asks a [`LayoutProvider`]
//! for pad corners in root canvas space once the layout reports it has
//! settled.

use crate::pad_engine::geometry::{CanvasSize, PadCorners, Point};
use crate::pad_engine::pad::PadId;

/// Supplies pad rectangles in the shared root coordinate space.
pub trait LayoutProvider {
    /// False until the UI layout has run at least once. Reading corners
    /// earlier yields collapsed rectangles.
    fn is_settled(&self) -> bool;

    /// Size of the root canvas in layout units.
    fn canvas_size(&self) -> CanvasSize;

    /// Corners of every pad, in pad order, in root space (origin at the
    /// canvas centre, Y up).
    fn pad_corners(&self) -> Vec<PadCorners>;

    /// Number of pads this layout places.
    fn pad_count(&self) -> usize;
}

/// Uniform grid filling the whole canvas.
///
/// Pad `i` sits at column `i % columns`, row `i / columns`; row 0 is the
/// bottom row of the canvas, i.e. the row with the smallest Y in the index.
#[derive(Debug, Clone)]
pub struct GridLayout {
    columns: usize,
    rows: usize,
    canvas: CanvasSize,
    settled: bool,
}

impl GridLayout {
    pub fn new(columns: usize, rows: usize, canvas: CanvasSize) -> Self {
        Self {
            columns,
            rows,
            canvas,
            settled: true,
        }
    }

    /// Grid that has not been through a layout pass yet.
    pub fn unsettled(columns: usize, rows: usize, canvas: CanvasSize) -> Self {
        Self {
            settled: false,
            ..Self::new(columns, rows, canvas)
        }
    }

    pub fn mark_settled(&mut self) {
        self.settled = true;
    }

    pub fn set_canvas_size(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl LayoutProvider for GridLayout {
    fn is_settled(&self) -> bool {
        self.settled
    }

    fn canvas_size(&self) -> CanvasSize {
        self.canvas
    }

    fn pad_corners(&self) -> Vec<PadCorners> {
        if !self.settled || self.columns == 0 || self.rows == 0 {
            return (0..self.pad_count())
                .map(|i| PadCorners {
                    pad: PadId(i),
                    corners: [Point::new(0.0, 0.0); 4],
                })
                .collect();
        }

        let cell_w = self.canvas.width / self.columns as f32;
        let cell_h = self.canvas.height / self.rows as f32;
        let half_w = self.canvas.width / 2.0;
        let half_h = self.canvas.height / 2.0;

        (0..self.pad_count())
            .map(|i| {
                let left = (i % self.columns) as f32 * cell_w - half_w;
                let bottom = (i / self.columns) as f32 * cell_h - half_h;
                PadCorners {
                    pad: PadId(i),
                    corners: [
                        Point::new(left, bottom),
                        Point::new(left, bottom + cell_h),
                        Point::new(left + cell_w, bottom + cell_h),
                        Point::new(left + cell_w, bottom),
                    ],
                }
            })
            .collect()
    }

    fn pad_count(&self) -> usize {
        self.columns * self.rows
    }
}
