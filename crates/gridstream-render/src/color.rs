//! Color schemes: pure functions from a normalized value to RGB.

use crate::canvas::Rgb;
use serde::{Deserialize, Serialize};

/// A named mapping from a normalized value in [0, 1] to a color.
///
/// Unknown scheme names fall back to grayscale rather than failing;
/// the catalog's `default_scheme` strings resolve through `from_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    Heat,
    Ripple,
    #[default]
    Grayscale,
}

impl ColorScheme {
    /// Resolves a scheme by name, defaulting to grayscale.
    pub fn from_name(name: &str) -> Self {
        match name {
            "heat" => Self::Heat,
            "ripple" => Self::Ripple,
            _ => Self::Grayscale,
        }
    }

    /// Maps a value to RGB. The caller is expected to clamp to [0, 1]
    /// first; values are trusted here.
    pub fn map(self, value: f64) -> Rgb {
        match self {
            Self::Heat => heat(value),
            Self::Ripple => ripple(value),
            Self::Grayscale => grayscale(value),
        }
    }
}

/// Four linear segments: blue -> cyan -> green -> yellow -> red.
fn heat(value: f64) -> Rgb {
    if value < 0.25 {
        let t = value / 0.25;
        (0, channel(t), 255)
    } else if value < 0.5 {
        let t = (value - 0.25) / 0.25;
        (0, 255, channel(1.0 - t))
    } else if value < 0.75 {
        let t = (value - 0.5) / 0.25;
        (channel(t), 255, 0)
    } else {
        let t = (value - 0.75) / 0.25;
        (255, channel(1.0 - t), 0)
    }
}

/// Dark-blue-to-white ramp with a boosted front edge.
fn ripple(value: f64) -> Rgb {
    let intensity = (value * 1.5).min(1.0);
    let rg = channel(intensity);
    let b = 255 - (155.0 * (1.0 - intensity)).round() as u8;
    (rg, rg, b)
}

fn grayscale(value: f64) -> Rgb {
    let c = channel(value);
    (c, c, c)
}

fn channel(t: f64) -> u8 {
    (255.0 * t).round() as u8
}
