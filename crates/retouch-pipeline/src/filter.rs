//! Filter selection: tool ids to typed filters.
//!
//! [`FilterKind`] names a filter; [`Filter`] is the same set of variants
//! carrying typed parameters. The UI sends a tool id plus loosely-typed
//! [`FilterParams`]; [`Filter::from_tool`] resolves both into a
//! [`Filter`] that can be applied to a [`PixelGrid`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::{ColorCorrectParams, color_correct};
use crate::contrast::{ContrastParams, contrast};
use crate::denoise::{DenoiseParams, denoise};
use crate::enhance::auto_enhance;
use crate::exposure::{ExposureParams, exposure};
use crate::red_eye::{RedEyeParams, remove_red_eye};
use crate::sharpen::{SharpenParams, sharpen};
use crate::types::{EditorError, FilterParams, PixelGrid};

/// Identifier of a pixel filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    /// 3×3 sharpening convolution.
    Sharpen,
    /// Detail-weighted noise reduction.
    Denoise,
    /// Contrast around mid-gray.
    Contrast,
    /// Exposure with highlight/shadow response.
    Exposure,
    /// White balance and saturation.
    ColorCorrect,
    /// Red-eye reduction.
    RedEye,
    /// Fixed contrast → exposure → color chain.
    AutoEnhance,
}

impl FilterKind {
    /// Every filter, in tool-panel order.
    pub const ALL: [Self; 7] = [
        Self::Sharpen,
        Self::Denoise,
        Self::Contrast,
        Self::Exposure,
        Self::ColorCorrect,
        Self::RedEye,
        Self::AutoEnhance,
    ];

    /// Canonical tool id.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Sharpen => "sharpen",
            Self::Denoise => "denoise",
            Self::Contrast => "contrast",
            Self::Exposure => "exposure",
            Self::ColorCorrect => "color-correct",
            Self::RedEye => "red-eye",
            Self::AutoEnhance => "auto-enhance",
        }
    }

    /// Resolve a tool id. Besides the canonical ids this accepts the
    /// toolbar's `enhance` and the camelCase schema ids `colorCorrection`
    /// and `redEye`.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "sharpen" => Some(Self::Sharpen),
            "denoise" => Some(Self::Denoise),
            "contrast" => Some(Self::Contrast),
            "exposure" => Some(Self::Exposure),
            "color-correct" | "colorCorrection" => Some(Self::ColorCorrect),
            "red-eye" | "redEye" => Some(Self::RedEye),
            "auto-enhance" | "enhance" => Some(Self::AutoEnhance),
            _ => None,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FilterKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| EditorError::UnknownTool(s.to_string()))
    }
}

/// A filter together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    /// See [`sharpen`].
    Sharpen(SharpenParams),
    /// See [`denoise`].
    Denoise(DenoiseParams),
    /// See [`contrast`].
    Contrast(ContrastParams),
    /// See [`exposure`].
    Exposure(ExposureParams),
    /// See [`color_correct`].
    ColorCorrect(ColorCorrectParams),
    /// See [`remove_red_eye`].
    RedEye(RedEyeParams),
    /// See [`auto_enhance`].
    AutoEnhance,
}

impl Filter {
    /// Build the filter for `kind`, reading its parameters from `params`.
    #[must_use]
    pub fn new(kind: FilterKind, params: &FilterParams) -> Self {
        match kind {
            FilterKind::Sharpen => Self::Sharpen(SharpenParams::from_params(params)),
            FilterKind::Denoise => Self::Denoise(DenoiseParams::from_params(params)),
            FilterKind::Contrast => Self::Contrast(ContrastParams::from_params(params)),
            FilterKind::Exposure => Self::Exposure(ExposureParams::from_params(params)),
            FilterKind::ColorCorrect => {
                Self::ColorCorrect(ColorCorrectParams::from_params(params))
            }
            FilterKind::RedEye => Self::RedEye(RedEyeParams::from_params(params)),
            FilterKind::AutoEnhance => Self::AutoEnhance,
        }
    }

    /// Resolve a tool id and its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownTool`] if `tool_id` names no filter.
    pub fn from_tool(tool_id: &str, params: &FilterParams) -> Result<Self, EditorError> {
        let kind: FilterKind = tool_id.parse()?;
        Ok(Self::new(kind, params))
    }

    /// Which filter this is.
    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        match self {
            Self::Sharpen(_) => FilterKind::Sharpen,
            Self::Denoise(_) => FilterKind::Denoise,
            Self::Contrast(_) => FilterKind::Contrast,
            Self::Exposure(_) => FilterKind::Exposure,
            Self::ColorCorrect(_) => FilterKind::ColorCorrect,
            Self::RedEye(_) => FilterKind::RedEye,
            Self::AutoEnhance => FilterKind::AutoEnhance,
        }
    }

    /// Apply to `grid`. The input is not modified; the output has the
    /// same dimensions and alpha channel.
    #[must_use = "returns the filtered image"]
    pub fn apply(&self, grid: &PixelGrid) -> PixelGrid {
        match *self {
            Self::Sharpen(p) => sharpen(grid, p),
            Self::Denoise(p) => denoise(grid, p),
            Self::Contrast(p) => contrast(grid, p),
            Self::Exposure(p) => exposure(grid, p),
            Self::ColorCorrect(p) => color_correct(grid, p),
            Self::RedEye(p) => remove_red_eye(grid, p),
            Self::AutoEnhance => auto_enhance(grid),
        }
    }
}

impl From<FilterKind> for Filter {
    /// The filter with default parameters.
    fn from(kind: FilterKind) -> Self {
        Self::new(kind, &FilterParams::new())
    }
}
