//! Contrast adjustment around mid-gray.
//!
//! `factor = (contrast / 100 + 1) * 1.5` and each channel becomes
//! `(v - 128) * factor + 128`, clamped.
//!
//! Note that the neutral slider position (`contrast = 0`) gives
//! `factor = 1.5`, not 1.0, so it still boosts contrast. `contrast = -100`
//! flattens everything to 128; `contrast ≈ -33.3` is the identity.

use serde::{Deserialize, Serialize};

use crate::channel::{map_channels, store};
use crate::types::{FilterParams, PixelGrid};

/// Parameters for [`contrast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContrastParams {
    /// Contrast amount, −100–100.
    pub contrast: f64,
}

impl ContrastParams {
    /// Default `contrast`.
    pub const DEFAULT_CONTRAST: f64 = 0.0;

    /// Read from loosely-typed parameters, clamping into range.
    #[must_use]
    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            contrast: params.clamped("contrast", Self::DEFAULT_CONTRAST, -100.0, 100.0),
        }
    }

    /// The multiplier applied around mid-gray.
    #[must_use]
    pub fn factor(self) -> f64 {
        (self.contrast / 100.0 + 1.0) * 1.5
    }
}

/// Adjust contrast of `grid`, returning a new grid of the same size.
#[must_use = "returns the adjusted image"]
#[allow(clippy::suboptimal_flops)]
pub fn contrast(grid: &PixelGrid, params: ContrastParams) -> PixelGrid {
    let factor = params.factor();
    map_channels(grid, |v| store((v - 128.0) * factor + 128.0))
}
