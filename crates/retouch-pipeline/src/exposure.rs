//! Exposure with separate highlight and shadow response.
//!
//! Each channel is first scaled by `1 + exposure / 100`. The scaled value
//! is then normalized to `n = v / 255` and split at 0.5:
//!
//! - highlights (`n > 0.5`): `255 * (0.5 + (n - 0.5) * (1 + highlights / 200))`
//! - shadows (`n <= 0.5`): `255 * n * (1 + shadows / 200)`
//!
//! and finally clamped.

use serde::{Deserialize, Serialize};

use crate::channel::{map_channels, store};
use crate::types::{FilterParams, PixelGrid};

/// Parameters for [`exposure`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureParams {
    /// Overall exposure, −100–100.
    pub exposure: f64,
    /// Highlight stretch, −100–100.
    pub highlights: f64,
    /// Shadow lift, −100–100.
    pub shadows: f64,
}

impl ExposureParams {
    /// Read from loosely-typed parameters, clamping into range.
    #[must_use]
    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            exposure: params.clamped("exposure", 0.0, -100.0, 100.0),
            highlights: params.clamped("highlights", 0.0, -100.0, 100.0),
            shadows: params.clamped("shadows", 0.0, -100.0, 100.0),
        }
    }
}

/// Adjust exposure of `grid`, returning a new grid of the same size.
#[must_use = "returns the adjusted image"]
#[allow(clippy::suboptimal_flops)]
pub fn exposure(grid: &PixelGrid, params: ExposureParams) -> PixelGrid {
    let gain = 1.0 + params.exposure / 100.0;
    let highlight_gain = 1.0 + params.highlights / 200.0;
    let shadow_gain = 1.0 + params.shadows / 200.0;
    map_channels(grid, |v| {
        let normalized = v * gain / 255.0;
        let value = if normalized > 0.5 {
            255.0 * (0.5 + (normalized - 0.5) * highlight_gain)
        } else {
            255.0 * normalized * shadow_gain
        };
        store(value)
    })
}
