//! Sharpening by 3x3 Laplacian-style convolution.
//!
//! The kernel
//!
//! ```text
//!  0 -1  0
//! -1  5 -1
//!  0 -1  0
//! ```
//!
//! is applied to interior pixels only. Border pixels are copied through
//! unchanged (no wraparound, no mirroring). The convolved value is blended
//! back with the original by `strength = amount / 100 * 2`, so
//! `amount = 50` gives the plain kernel response and `amount = 0` is the
//! identity.

use serde::{Deserialize, Serialize};

use crate::channel::store;
use crate::types::{FilterParams, PixelGrid};

/// Parameters for [`sharpen`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharpenParams {
    /// Sharpening amount, 0–100.
    pub amount: f64,
    /// Kernel radius, 0–10. Accepted for UI compatibility; the kernel is
    /// always 3x3.
    pub radius: f64,
}

impl SharpenParams {
    /// Default `amount`.
    pub const DEFAULT_AMOUNT: f64 = 50.0;
    /// Default `radius`.
    pub const DEFAULT_RADIUS: f64 = 1.0;

    /// Read from loosely-typed parameters, clamping into range.
    #[must_use]
    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            amount: params.clamped("amount", Self::DEFAULT_AMOUNT, 0.0, 100.0),
            radius: params.clamped("radius", Self::DEFAULT_RADIUS, 0.0, 10.0),
        }
    }
}

impl Default for SharpenParams {
    fn default() -> Self {
        Self {
            amount: Self::DEFAULT_AMOUNT,
            radius: Self::DEFAULT_RADIUS,
        }
    }
}

/// Sharpen `grid`, returning a new grid of the same size.
#[must_use = "returns the sharpened image"]
#[allow(clippy::suboptimal_flops)]
pub fn sharpen(grid: &PixelGrid, params: SharpenParams) -> PixelGrid {
    let strength = params.amount / 100.0 * 2.0;
    let (w, h) = grid.dimensions();
    let mut out = grid.clone();
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = grid.get_pixel(x, y);
            let up = grid.get_pixel(x, y - 1);
            let down = grid.get_pixel(x, y + 1);
            let left = grid.get_pixel(x - 1, y);
            let right = grid.get_pixel(x + 1, y);

            let target = out.get_pixel_mut(x, y);
            for c in 0..3 {
                let orig = f64::from(center[c]);
                let convolved = 5.0 * orig
                    - f64::from(up[c])
                    - f64::from(down[c])
                    - f64::from(left[c])
                    - f64::from(right[c]);
                target[c] = store(orig + (convolved - orig) * strength);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::gradient;

    /// A 3x3 grid with `center` in the middle and `ring` everywhere else.
    fn plus(center: u8, ring: u8) -> PixelGrid {
        PixelGrid::from_fn(3, 3, |x, y| {
            let v = if x == 1 && y == 1 { center } else { ring };
            image::Rgba([v, v, v, 200])
        })
    }

    fn with_amount(amount: f64) -> SharpenParams {
        SharpenParams {
            amount,
            ..SharpenParams::default()
        }
    }

    #[test]
    fn defaults_match_tool_settings() {
        let params = SharpenParams::from_params(&FilterParams::new());
        assert_eq!(params, SharpenParams::default());
        assert!((params.amount - 50.0).abs() < f64::EPSILON);
        assert!((params.radius - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_amount_is_clamped() {
        let params = SharpenParams::from_params(&FilterParams::new().with("amount", 500.0));
        assert!((params.amount - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_amount_applies_plain_kernel() {
        // conv = 5*60 - 4*50 = 100; strength 1 -> 60 + 40 = 100.
        let out = sharpen(&plus(60, 50), SharpenParams::default());
        assert_eq!(out.get_pixel(1, 1).0, [100, 100, 100, 200]);
    }

    #[test]
    fn amount_scales_blend() {
        // strength 0.5 -> 60 + 40 * 0.5 = 80.
        let out = sharpen(&plus(60, 50), with_amount(25.0));
        assert_eq!(out.get_pixel(1, 1).0[0], 80);
    }

    #[test]
    fn result_is_clamped() {
        // conv = 5*100 - 4*50 = 300 -> clamp to 255.
        let out = sharpen(&plus(100, 50), SharpenParams::default());
        assert_eq!(out.get_pixel(1, 1).0[0], 255);
        // conv = 5*10 - 4*200 = -750 -> clamp to 0.
        let out = sharpen(&plus(10, 200), SharpenParams::default());
        assert_eq!(out.get_pixel(1, 1).0[0], 0);
    }

    #[test]
    fn zero_amount_is_identity() {
        let grid = gradient(8, 8);
        assert_eq!(sharpen(&grid, with_amount(0.0)), grid);
    }

    #[test]
    fn border_pixels_are_unchanged() {
        let grid = gradient(6, 5);
        let out = sharpen(&grid, with_amount(100.0));
        let (w, h) = grid.dimensions();
        for y in 0..h {
            for x in 0..w {
                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    assert_eq!(out.get_pixel(x, y), grid.get_pixel(x, y), "({x},{y})");
                }
            }
        }
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let grid = PixelGrid::from_fn(6, 6, |_, _| image::Rgba([90, 90, 90, 255]));
        assert_eq!(sharpen(&grid, with_amount(100.0)), grid);
    }

    #[test]
    fn tiny_images_pass_through() {
        for (w, h) in [(1, 1), (2, 5), (5, 2)] {
            let grid = gradient(w, h);
            assert_eq!(sharpen(&grid, SharpenParams::default()), grid);
        }
    }

    #[test]
    fn alpha_is_untouched() {
        let out = sharpen(&plus(60, 50), SharpenParams::default());
        assert!(out.pixels().all(|p| p[3] == 200));
    }

    #[test]
    fn radius_does_not_change_output() {
        let grid = gradient(7, 7);
        let a = sharpen(
            &grid,
            SharpenParams {
                amount: 70.0,
                radius: 1.0,
            },
        );
        let b = sharpen(
            &grid,
            SharpenParams {
                amount: 70.0,
                radius: 9.0,
            },
        );
        assert_eq!(a, b);
    }
}
