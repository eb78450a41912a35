//! Pixel buffer access: encoded image payloads in, pixel grids out, and back.
//!
//! An [`EncodedImage`] is the unit exchanged with the UI and stored in
//! history: a PNG/JPEG/WebP byte payload carried as base64, paired with
//! its pixel dimensions. [`decode`] turns one into a [`PixelGrid`] for the
//! filters; [`encode`] goes the other way.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::ImageEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;

use crate::types::{Dimensions, EditorError, ImageFormat, PixelGrid};

/// Default JPEG quality, matching a canvas `toDataURL("image/jpeg", 0.95)`.
pub const DEFAULT_QUALITY: u8 = 95;

/// An encoded image payload (base64 text) plus its format and dimensions.
///
/// Every constructor validates the payload by decoding it, so an
/// `EncodedImage` is always decodable.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    format: ImageFormat,
    base64: String,
    dimensions: Dimensions,
}

impl EncodedImage {
    /// Build from raw encoded bytes (PNG, JPEG or WebP).
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::EmptyInput`] for empty input,
    /// [`EditorError::UnsupportedFormat`] for formats other than
    /// PNG/JPEG/WebP, and [`EditorError::ImageDecode`] for data that
    /// cannot be decoded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EditorError> {
        if bytes.is_empty() {
            return Err(EditorError::EmptyInput);
        }
        let guessed = image::guess_format(bytes)?;
        let format = ImageFormat::from_image_format(guessed)
            .ok_or_else(|| EditorError::UnsupportedFormat(format!("{guessed:?}")))?;
        let grid = decode_bytes(bytes)?;
        Ok(Self::from_parts(format, bytes, Dimensions::of(&grid)))
    }

    /// Build from a base64 payload without a `data:` header.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidDataUrl`] if `payload` is not valid
    /// base64, otherwise any error of [`from_bytes`](Self::from_bytes).
    pub fn from_base64(payload: &str) -> Result<Self, EditorError> {
        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| EditorError::InvalidDataUrl(format!("bad base64 payload: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Build from a `data:<mime>;base64,<payload>` URL.
    ///
    /// A bare base64 string (no `data:` prefix) is accepted as well,
    /// since AI backends commonly return the payload alone.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidDataUrl`] if the URL has no payload
    /// separator or is not base64-encoded, otherwise any error of
    /// [`from_bytes`](Self::from_bytes).
    pub fn from_data_url(data_url: &str) -> Result<Self, EditorError> {
        let Some(rest) = data_url.trim_start().strip_prefix("data:") else {
            return Self::from_base64(data_url);
        };
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| EditorError::InvalidDataUrl("missing ',' separator".into()))?;
        if !header.contains("base64") {
            return Err(EditorError::InvalidDataUrl(format!(
                "payload is not base64-encoded: data:{header}"
            )));
        }
        Self::from_base64(payload)
    }

    /// Wrap bytes that were just produced by an encoder.
    fn from_parts(format: ImageFormat, bytes: &[u8], dimensions: Dimensions) -> Self {
        Self {
            format,
            base64: BASE64.encode(bytes),
            dimensions,
        }
    }

    /// The encoded format.
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// Pixel dimensions of the encoded image.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The base64 payload (no `data:` header).
    #[must_use]
    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// Render as a `data:` URL suitable for an `<img src>`.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.base64)
    }

    /// The raw encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidDataUrl`] if the stored payload is
    /// not valid base64, which constructors rule out.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EditorError> {
        BASE64
            .decode(&self.base64)
            .map_err(|e| EditorError::InvalidDataUrl(format!("bad base64 payload: {e}")))
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("format", &self.format)
            .field("dimensions", &self.dimensions)
            .field("base64_len", &self.base64.len())
            .finish()
    }
}

/// Decode an encoded image into an RGBA pixel grid.
///
/// # Errors
///
/// Returns [`EditorError::ImageDecode`] if the payload is corrupt or
/// truncated.
pub fn decode(image: &EncodedImage) -> Result<PixelGrid, EditorError> {
    decode_bytes(&image.to_bytes()?)
}

/// Decode raw encoded bytes into an RGBA pixel grid.
///
/// # Errors
///
/// Returns [`EditorError::EmptyInput`] if `bytes` is empty.
/// Returns [`EditorError::ImageDecode`] if the format is unrecognized or
/// the data is corrupt.
pub fn decode_bytes(bytes: &[u8]) -> Result<PixelGrid, EditorError> {
    if bytes.is_empty() {
        return Err(EditorError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Encode a pixel grid as an [`EncodedImage`].
///
/// `quality` (clamped to 1–100) is used for JPEG only.
///
/// # Errors
///
/// Returns [`EditorError::Encode`] if the encoder rejects the image
/// (e.g. a zero-sized JPEG).
pub fn encode(
    grid: &PixelGrid,
    format: ImageFormat,
    quality: u8,
) -> Result<EncodedImage, EditorError> {
    let bytes = encode_bytes(grid, format, quality)?;
    Ok(EncodedImage::from_parts(format, &bytes, Dimensions::of(grid)))
}

/// Encode a pixel grid into raw bytes of the given format.
///
/// PNG and WebP are lossless and keep alpha; WebP uses the lossless
/// encoder, so `quality` has no effect on it. JPEG has no alpha channel:
/// the grid is flattened to RGB by dropping alpha.
///
/// # Errors
///
/// Returns [`EditorError::Encode`] if the encoder fails.
pub fn encode_bytes(
    grid: &PixelGrid,
    format: ImageFormat,
    quality: u8,
) -> Result<Vec<u8>, EditorError> {
    let (width, height) = grid.dimensions();
    let mut buf = Vec::new();
    let result = match format {
        ImageFormat::Png => PngEncoder::new(&mut buf).write_image(
            grid.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgba8,
        ),
        ImageFormat::Jpeg => {
            let rgb: Vec<u8> = grid.pixels().flat_map(|p| [p[0], p[1], p[2]]).collect();
            JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).write_image(
                &rgb,
                width,
                height,
                image::ExtendedColorType::Rgb8,
            )
        }
        ImageFormat::WebP => WebPEncoder::new_lossless(&mut buf).write_image(
            grid.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgba8,
        ),
    };
    result.map_err(|e| EditorError::Encode(format!("{format}: {e}")))?;
    Ok(buf)
}
