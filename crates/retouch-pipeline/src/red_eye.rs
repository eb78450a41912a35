//! Red-eye reduction.
//!
//! A pixel counts as red-eye when its red channel exceeds the sensitivity
//! threshold and is more than 1.5x both green and blue. Such pixels are
//! darkened (`r * 0.6`, `g * 0.8`, `b * 0.8`); all others pass through.

use serde::{Deserialize, Serialize};

use crate::channel::{map_rgb, store};
use crate::types::{FilterParams, PixelGrid};

/// Parameters for [`remove_red_eye`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RedEyeParams {
    /// Detection sensitivity, 0–100. Used directly as the red threshold.
    pub sensitivity: f64,
}

impl RedEyeParams {
    /// Default `sensitivity`.
    pub const DEFAULT_SENSITIVITY: f64 = 50.0;

    /// Read from loosely-typed parameters, clamping into range.
    #[must_use]
    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            sensitivity: params.clamped("sensitivity", Self::DEFAULT_SENSITIVITY, 0.0, 100.0),
        }
    }

    /// Red channel threshold on the 0–255 scale.
    #[must_use]
    pub fn threshold(self) -> f64 {
        self.sensitivity / 100.0 * 100.0
    }

    /// Whether a pixel is treated as red-eye.
    #[must_use]
    pub fn matches(self, r: f64, g: f64, b: f64) -> bool {
        r > self.threshold() && r > g * 1.5 && r > b * 1.5
    }
}

impl Default for RedEyeParams {
    fn default() -> Self {
        Self {
            sensitivity: Self::DEFAULT_SENSITIVITY,
        }
    }
}

/// Reduce red-eye in `grid`, returning a new grid of the same size.
#[must_use = "returns the corrected image"]
pub fn remove_red_eye(grid: &PixelGrid, params: RedEyeParams) -> PixelGrid {
    map_rgb(grid, |[r, g, b]| {
        if params.matches(r, g, b) {
            [store(r * 0.6), store(g * 0.8), store(b * 0.8)]
        } else {
            [store(r), store(g), store(b)]
        }
    })
}
