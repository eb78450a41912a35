//! Noise reduction by detail-weighted attenuation.
//!
//! Each channel becomes `round(v * dp + v * (1 - dp) / 2)` with
//! `dp = detail / 100`: the share of the signal that is not preserved as
//! detail is halved. `strength` is accepted but does not enter the formula.

use serde::{Deserialize, Serialize};

use crate::channel::{map_channels, round_half_up, store};
use crate::types::{FilterParams, PixelGrid};

/// Parameters for [`denoise`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenoiseParams {
    /// Denoise strength, 0–100.
    pub strength: f64,
    /// How much detail to preserve, 0–100.
    pub detail: f64,
}

impl DenoiseParams {
    /// Default `strength`.
    pub const DEFAULT_STRENGTH: f64 = 30.0;
    /// Default `detail`.
    pub const DEFAULT_DETAIL: f64 = 70.0;

    /// Read from loosely-typed parameters, clamping into range.
    #[must_use]
    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            strength: params.clamped("strength", Self::DEFAULT_STRENGTH, 0.0, 100.0),
            detail: params.clamped("detail", Self::DEFAULT_DETAIL, 0.0, 100.0),
        }
    }
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            strength: Self::DEFAULT_STRENGTH,
            detail: Self::DEFAULT_DETAIL,
        }
    }
}

/// Denoise `grid`, returning a new grid of the same size.
#[must_use = "returns the denoised image"]
#[allow(clippy::suboptimal_flops)]
pub fn denoise(grid: &PixelGrid, params: DenoiseParams) -> PixelGrid {
    let preserve = params.detail / 100.0;
    map_channels(grid, |v| store(round_half_up(v * preserve + v * (1.0 - preserve) / 2.0)))
}
