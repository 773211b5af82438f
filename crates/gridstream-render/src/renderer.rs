//! The adaptive frame renderer.
//!
//! Turns one grid snapshot into pixels: detect and skip the boundary
//! ring, derive normalization bounds from the finite interior cells,
//! normalize per the selected mode, map through the color scheme, and
//! lay the cells out centered on the canvas with an adaptive cell size.
//! Layout is re-derived from scratch on every frame and on every
//! container resize; the renderer retains exactly one current frame and
//! no history.

use crate::canvas::{CanvasSurface, Rgb};
use crate::color::ColorScheme;
use gridstream_types::Frame;
use serde::{Deserialize, Serialize};

const MIN_CELL_PX: f64 = 5.0;
const MAX_CELL_PX: f64 = 20.0;
const GRID_LINE_MIN_CELL_PX: f64 = 10.0;
const CONTAINER_FRACTION: f64 = 0.9;
const GRID_LINE_COLOR: Rgb = (70, 70, 70);

/// How a raw cell value becomes a normalized value in [0, 1].
///
/// Switching modes only changes interpretation; the stored frame data
/// is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Rescale every frame to its observed min/max. Legible for
    /// simulations with unbounded magnitudes.
    #[default]
    Dynamic,
    /// Trust the raw value to already be in [0, 1]. Legible when the
    /// simulation's semantics give a stable reference frame.
    Fixed,
}

/// The sub-rectangle of the grid that is actually data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteriorRegion {
    pub top: usize,
    pub left: usize,
    pub height: usize,
    pub width: usize,
}

/// Detects the boundary ring convention: grids at least 3x3 carry a
/// non-data border ring that is excluded from normalization and
/// painting; smaller grids are used whole.
pub fn interior_region(height: usize, width: usize) -> InteriorRegion {
    if height >= 3 && width >= 3 {
        InteriorRegion {
            top: 1,
            left: 1,
            height: height - 2,
            width: width - 2,
        }
    } else {
        InteriorRegion {
            top: 0,
            left: 0,
            height,
            width,
        }
    }
}

/// Min/max over the finite cells of the region.
///
/// Falls back to [0, 1] when the region has no finite cells or is flat
/// (min == max): a deterministic flat color beats a division by zero.
pub fn scan_bounds(grid: &[Vec<f64>], region: InteriorRegion) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for row in grid.iter().skip(region.top).take(region.height) {
        for cell in row.iter().skip(region.left).take(region.width) {
            if cell.is_finite() {
                min = min.min(*cell);
                max = max.max(*cell);
            }
        }
    }
    if !min.is_finite() || !max.is_finite() || min == max {
        (0.0, 1.0)
    } else {
        (min, max)
    }
}

fn normalize(value: f64, mode: NormalizationMode, bounds: (f64, f64)) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let raw = match mode {
        NormalizationMode::Dynamic => (value - bounds.0) / (bounds.1 - bounds.0),
        NormalizationMode::Fixed => value,
    };
    raw.clamp(0.0, 1.0)
}

/// Paints a frame onto a canvas. Stateless; `FrameRenderer` wraps this
/// with the retained current frame and resize handling.
pub fn render_frame(
    canvas: &mut CanvasSurface,
    frame: Option<&Frame>,
    scheme: ColorScheme,
    mode: NormalizationMode,
) {
    canvas.clear();
    let Some(frame) = frame else { return };
    let region = interior_region(frame.height(), frame.width());
    if region.height == 0 || region.width == 0 {
        return;
    }

    let canvas_w = canvas.width() as f64;
    let canvas_h = canvas.height() as f64;
    let cell = (canvas_w / region.width as f64)
        .min(canvas_h / region.height as f64)
        .clamp(MIN_CELL_PX, MAX_CELL_PX);
    let used_w = cell * region.width as f64;
    let used_h = cell * region.height as f64;
    let origin_x = (canvas_w - used_w) / 2.0;
    let origin_y = (canvas_h - used_h) / 2.0;

    let bounds = scan_bounds(&frame.grid, region);

    for r in 0..region.height {
        for c in 0..region.width {
            let value = frame.grid[region.top + r][region.left + c];
            let color = scheme.map(normalize(value, mode, bounds));
            let x = (origin_x + c as f64 * cell).round() as i64;
            let y = (origin_y + r as f64 * cell).round() as i64;
            // Cells draw 1px short of their pitch, leaving a seam.
            let edge = (cell.round() as i64 - 1).max(1);
            canvas.fill_rect(x, y, edge, edge, color);
        }
    }

    // Faint boundary lines, only when cells are big enough that the
    // overlay does not drown the fill colors.
    if cell > GRID_LINE_MIN_CELL_PX {
        let top = origin_y.round() as i64;
        let left = origin_x.round() as i64;
        for k in 0..=region.width {
            let x = (origin_x + k as f64 * cell).round() as i64;
            canvas.fill_rect(x, top, 1, used_h.round() as i64, GRID_LINE_COLOR);
        }
        for k in 0..=region.height {
            let y = (origin_y + k as f64 * cell).round() as i64;
            canvas.fill_rect(left, y, used_w.round() as i64, 1, GRID_LINE_COLOR);
        }
    }
}

/// Client-side frame consumer: receives frames, paints the canvas,
/// re-derives everything on resize.
///
/// The renderer only ever needs the latest frame: if frames arrive
/// faster than paints complete, it is correct to drop the stale ones
/// and render whatever is newest.
pub struct FrameRenderer {
    canvas: CanvasSurface,
    scheme: ColorScheme,
    mode: NormalizationMode,
    current: Option<Frame>,
}

impl FrameRenderer {
    pub fn new(canvas_width: usize, canvas_height: usize, scheme: ColorScheme) -> Self {
        Self {
            canvas: CanvasSurface::new(canvas_width, canvas_height),
            scheme,
            mode: NormalizationMode::default(),
            current: None,
        }
    }

    pub fn canvas(&self) -> &CanvasSurface {
        &self.canvas
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn mode(&self) -> NormalizationMode {
        self.mode
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    /// Replaces the current frame and repaints.
    pub fn render(&mut self, frame: Frame) {
        self.current = Some(frame);
        self.repaint();
    }

    /// Switches the color scheme and repaints the retained frame.
    pub fn set_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
        self.repaint();
    }

    /// Switches normalization mode and repaints. The stored frame is
    /// reinterpreted, never modified.
    pub fn set_mode(&mut self, mode: NormalizationMode) {
        self.mode = mode;
        self.repaint();
    }

    /// Reacts to a container resize: the canvas becomes a square at 90%
    /// of the smaller container dimension and the retained frame is
    /// re-rendered from scratch, without re-fetching anything.
    pub fn resize_to_container(&mut self, container_width: usize, container_height: usize) {
        let side = (CONTAINER_FRACTION * container_width.min(container_height) as f64) as usize;
        self.canvas = CanvasSurface::new(side, side);
        self.repaint();
    }

    fn repaint(&mut self) {
        render_frame(&mut self.canvas, self.current.as_ref(), self.scheme, self.mode);
    }
}
