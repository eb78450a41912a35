//! Channel arithmetic shared by the filters.
//!
//! Filters compute in `f64` and write back into 8-bit channels. Two
//! rounding rules are in play:
//!
//! - [`store`]: clamp to `[0, 255]`, then round half to even. This is how
//!   an 8-bit clamped canvas buffer stores an arbitrary number, and it is
//!   used wherever a formula does not round explicitly.
//! - [`round_half_up`]: `floor(x + 0.5)`, used where a formula rounds
//!   explicitly before the store.

use crate::types::PixelGrid;

/// Clamp `value` into `[0, 255]` and round half to even.
///
/// NaN stores as 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn store(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

/// Round half up (towards positive infinity).
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Apply `transform` to the R, G and B channels of every pixel.
///
/// Alpha is copied unchanged. The input grid is not modified.
#[must_use]
pub fn map_rgb<F>(grid: &PixelGrid, transform: F) -> PixelGrid
where
    F: Fn([f64; 3]) -> [u8; 3],
{
    let mut out = grid.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let [nr, ng, nb] = transform([f64::from(r), f64::from(g), f64::from(b)]);
        pixel.0[0] = nr;
        pixel.0[1] = ng;
        pixel.0[2] = nb;
    }
    out
}

/// Apply the same per-channel function to R, G and B independently.
#[must_use]
pub fn map_channels<F>(grid: &PixelGrid, transform: F) -> PixelGrid
where
    F: Fn(f64) -> u8,
{
    map_rgb(grid, |[r, g, b]| [transform(r), transform(g), transform(b)])
}
