//! Frame rendering for GridStream clients.
//!
//! Consumes frames from a session's channel and paints them as a
//! false-color heatmap into an RGBA surface suitable for blitting into
//! a canvas or texture. Handles border detection, adaptive
//! normalization, color mapping, and layout; see `FrameRenderer`.

pub mod canvas;
pub mod color;
pub mod renderer;

pub use canvas::{CanvasSurface, Rgb};
pub use color::ColorScheme;
pub use renderer::{FrameRenderer, NormalizationMode, interior_region, render_frame, scan_bounds};
