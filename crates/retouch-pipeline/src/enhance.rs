//! One-click auto-enhance: a fixed chain of contrast, exposure and color
//! correction, each applied to the previous result.

use crate::color::{ColorCorrectParams, color_correct};
use crate::contrast::{ContrastParams, contrast};
use crate::exposure::{ExposureParams, exposure};
use crate::types::PixelGrid;

/// Contrast step of the chain.
pub const CONTRAST: ContrastParams = ContrastParams { contrast: 15.0 };

/// Exposure step of the chain.
pub const EXPOSURE: ExposureParams = ExposureParams {
    exposure: 10.0,
    highlights: 5.0,
    shadows: 5.0,
};

/// Color-correction step of the chain.
pub const COLOR: ColorCorrectParams = ColorCorrectParams {
    temperature: 5.0,
    tint: 0.0,
    saturation: 20.0,
};

/// Auto-enhance `grid`, returning a new grid of the same size.
#[must_use = "returns the enhanced image"]
pub fn auto_enhance(grid: &PixelGrid) -> PixelGrid {
    let contrasted = contrast(grid, CONTRAST);
    let exposed = exposure(&contrasted, EXPOSURE);
    color_correct(&exposed, COLOR)
}
