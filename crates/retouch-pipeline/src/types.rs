//! Shared types for the retouch editing core.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference decoded
/// pixel data without depending on `image` directly.
pub use image::RgbaImage;

/// A decoded working buffer: `width * height` RGBA samples, row-major,
/// origin top-left.
///
/// `RgbaImage` guarantees the sample buffer length is exactly
/// `width * height * 4`.
pub type PixelGrid = RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new dimensions value.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of a decoded pixel grid.
    #[must_use]
    pub fn of(grid: &PixelGrid) -> Self {
        Self::new(grid.width(), grid.height())
    }

    /// Total pixel count.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Encoded image formats the editor reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Lossy JPEG (no alpha channel).
    Jpeg,
    /// WebP (written with the lossless encoder).
    #[serde(rename = "webp")]
    WebP,
}

impl ImageFormat {
    /// All supported formats.
    pub const ALL: [Self; 3] = [Self::Png, Self::Jpeg, Self::WebP];

    /// MIME type, as used in data URLs and downloads.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
        }
    }

    /// Look up a format by MIME type (`image/jpg` is accepted as JPEG).
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Map from the `image` crate's format, if it is one we support.
    #[must_use]
    pub const fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }

    /// Whether the `quality` setting affects the encoded output.
    #[must_use]
    pub const fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::WebP),
            other => Err(EditorError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Numeric parameters for a single tool application, keyed by name
/// (e.g. `{"amount": 50, "radius": 1}` for sharpen).
///
/// Unknown names are ignored by the filters; missing names fall back to
/// the filter's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterParams(BTreeMap<String, f64>);

impl FilterParams {
    /// An empty parameter set (every filter uses its defaults).
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Insert or replace a parameter.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// The raw value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Read `name`, falling back to `default` when missing or not finite,
    /// and clamp the result into `min..=max`.
    #[must_use]
    pub fn clamped(&self, name: &str, default: f64, min: f64, max: f64) -> f64 {
        self.get(name)
            .filter(|v| v.is_finite())
            .unwrap_or(default)
            .clamp(min, max)
    }

    /// Returns `true` if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FilterParams {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Coarse classification of [`EditorError`] for callers that only need
/// to decide how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unsupported image payload. The image is unchanged.
    Decode,
    /// The requested tool id does not name a filter.
    UnknownTool,
    /// The operation needs a loaded image.
    NoImage,
    /// Undo/redo at a history boundary. Informational only.
    NoOp,
    /// A filter or AI call failed. The session was rolled back.
    Processing,
}

/// Errors produced by the editing core.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the image bytes.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The payload is not a base64 data URL (or bare base64 string).
    #[error("invalid image data URL: {0}")]
    InvalidDataUrl(String),

    /// The image format is not one of png, jpeg or webp.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An uploaded file was rejected before decoding.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// Failed to encode a pixel grid.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// The tool id does not name a known filter.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The operation requires an image to be loaded first.
    #[error("no image loaded")]
    NoImage,

    /// Undo requested with nothing before the current entry.
    #[error("nothing to undo")]
    NothingToUndo,

    /// Redo requested with nothing after the current entry.
    #[error("nothing to redo")]
    NothingToRedo,

    /// A filter or AI operation failed; the previous image is kept.
    #[error("processing failed: {0}")]
    Processing(String),
}

impl EditorError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput
            | Self::ImageDecode(_)
            | Self::InvalidDataUrl(_)
            | Self::UnsupportedFormat(_)
            | Self::InvalidUpload(_) => ErrorKind::Decode,
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::NoImage => ErrorKind::NoImage,
            Self::NothingToUndo | Self::NothingToRedo => ErrorKind::NoOp,
            Self::Encode(_) | Self::Processing(_) => ErrorKind::Processing,
        }
    }
}

/// Serde-compatible proxy for `EditorError`.
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string instead.
#[derive(Serialize, Deserialize)]
enum EditorErrorProxy {
    EmptyInput,
    ImageDecode(String),
    InvalidDataUrl(String),
    UnsupportedFormat(String),
    InvalidUpload(String),
    Encode(String),
    UnknownTool(String),
    NoImage,
    NothingToUndo,
    NothingToRedo,
    Processing(String),
}

impl Serialize for EditorError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::EmptyInput => EditorErrorProxy::EmptyInput,
            Self::ImageDecode(e) => EditorErrorProxy::ImageDecode(e.to_string()),
            Self::InvalidDataUrl(s) => EditorErrorProxy::InvalidDataUrl(s.clone()),
            Self::UnsupportedFormat(s) => EditorErrorProxy::UnsupportedFormat(s.clone()),
            Self::InvalidUpload(s) => EditorErrorProxy::InvalidUpload(s.clone()),
            Self::Encode(s) => EditorErrorProxy::Encode(s.clone()),
            Self::UnknownTool(s) => EditorErrorProxy::UnknownTool(s.clone()),
            Self::NoImage => EditorErrorProxy::NoImage,
            Self::NothingToUndo => EditorErrorProxy::NothingToUndo,
            Self::NothingToRedo => EditorErrorProxy::NothingToRedo,
            Self::Processing(s) => EditorErrorProxy::Processing(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EditorError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = EditorErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            EditorErrorProxy::EmptyInput => Self::EmptyInput,
            // The typed image::ImageError cannot be rebuilt; keep the
            // message and the decode classification.
            EditorErrorProxy::ImageDecode(msg) => {
                Self::InvalidDataUrl(format!("image decode error: {msg}"))
            }
            EditorErrorProxy::InvalidDataUrl(s) => Self::InvalidDataUrl(s),
            EditorErrorProxy::UnsupportedFormat(s) => Self::UnsupportedFormat(s),
            EditorErrorProxy::InvalidUpload(s) => Self::InvalidUpload(s),
            EditorErrorProxy::Encode(s) => Self::Encode(s),
            EditorErrorProxy::UnknownTool(s) => Self::UnknownTool(s),
            EditorErrorProxy::NoImage => Self::NoImage,
            EditorErrorProxy::NothingToUndo => Self::NothingToUndo,
            EditorErrorProxy::NothingToRedo => Self::NothingToRedo,
            EditorErrorProxy::Processing(s) => Self::Processing(s),
        })
    }
}
