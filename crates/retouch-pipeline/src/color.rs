//! Color correction: white balance (temperature, tint) and saturation.
//!
//! Temperature shifts red up and blue down by `temperature / 100 * 50`;
//! tint shifts green by `tint / 100 * 50`. Saturation then scales each
//! channel's distance from the pixel's mean by `saturation / 100 * 2`.
//! Intermediate values are not clamped; only the final channels are.
//!
//! The saturation multiplier is 0 at the neutral slider position, which
//! collapses every pixel to its gray mean. A multiplier of 1 (no change)
//! is reached at `saturation = 50`.

use serde::{Deserialize, Serialize};

use crate::channel::{map_rgb, round_half_up, store};
use crate::types::{FilterParams, PixelGrid};

/// Parameters for [`color_correct`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorCorrectParams {
    /// Warm (+) / cool (−) shift, −100–100.
    pub temperature: f64,
    /// Green shift, −100–100.
    pub tint: f64,
    /// Saturation, −100–100.
    pub saturation: f64,
}

impl ColorCorrectParams {
    /// Read from loosely-typed parameters, clamping into range.
    #[must_use]
    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            temperature: params.clamped("temperature", 0.0, -100.0, 100.0),
            tint: params.clamped("tint", 0.0, -100.0, 100.0),
            saturation: params.clamped("saturation", 0.0, -100.0, 100.0),
        }
    }
}

/// Color-correct `grid`, returning a new grid of the same size.
#[must_use = "returns the corrected image"]
#[allow(clippy::suboptimal_flops)]
pub fn color_correct(grid: &PixelGrid, params: ColorCorrectParams) -> PixelGrid {
    let warm = params.temperature / 100.0 * 50.0;
    let green = params.tint / 100.0 * 50.0;
    let saturation = params.saturation / 100.0 * 2.0;
    map_rgb(grid, |[r, g, b]| {
        let r = r + warm;
        let g = g + green;
        let b = b - warm;
        let gray = (r + g + b) / 3.0;
        let saturate = |c: f64| store(round_half_up(gray + (c - gray) * saturation));
        [saturate(r), saturate(g), saturate(b)]
    })
}
