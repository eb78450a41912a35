//! retouch-export: Pure export serializer (sans-IO)
//!
//! Turns the displayed image into a downloadable file in the format,
//! quality and name the user picked. Writing the bytes somewhere is the
//! caller's job (`retouch-io` triggers a browser download, the CLI writes
//! to disk).

use std::fmt;

use retouch_pipeline::codec;
use retouch_pipeline::{Dimensions, EditorError, EncodedImage, ImageFormat};
use serde::{Deserialize, Serialize};

/// Lowest accepted export quality.
pub const MIN_QUALITY: u8 = 10;
/// Highest accepted export quality.
pub const MAX_QUALITY: u8 = 100;
/// Quality preselected in the export dialog.
pub const DEFAULT_QUALITY: u8 = 90;
/// File name stem preselected in the export dialog.
pub const DEFAULT_FILENAME: &str = "edited-image";

/// What the user chose in the export dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Output format.
    pub format: ImageFormat,
    /// Output quality, 10–100. Only JPEG output uses it.
    pub quality: u8,
    /// File name without extension.
    pub filename: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: DEFAULT_QUALITY,
            filename: DEFAULT_FILENAME.to_string(),
        }
    }
}

impl ExportOptions {
    /// `quality` clamped to 10–100.
    #[must_use]
    pub fn clamped_quality(&self) -> u8 {
        self.quality.clamp(MIN_QUALITY, MAX_QUALITY)
    }

    /// Download file name: the stem plus the format's extension.
    ///
    /// A blank stem falls back to [`DEFAULT_FILENAME`]; a stem that
    /// already ends in the extension is not extended twice.
    #[must_use]
    pub fn file_name(&self) -> String {
        let stem = self.filename.trim();
        let stem = if stem.is_empty() {
            DEFAULT_FILENAME
        } else {
            stem
        };
        let extension = self.format.extension();
        let has_extension = stem
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(extension));
        if has_extension {
            stem.to_string()
        } else {
            format!("{stem}.{extension}")
        }
    }
}

/// A file ready to be handed to the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// Download file name, extension included.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime: &'static str,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ExportedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedFile")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Errors from [`export`].
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The displayed image could not be decoded.
    #[error("cannot read the current image: {0}")]
    Decode(#[source] EditorError),

    /// Encoding into the requested format failed.
    #[error("cannot encode the export: {0}")]
    Encode(#[source] EditorError),
}

/// Serialize `image` as a downloadable file.
///
/// The payload is passed through untouched when it already has the
/// requested lossless format; otherwise it is decoded and re-encoded
/// with the clamped quality.
///
/// # Errors
///
/// Returns [`ExportError::Decode`] if the image payload is unreadable and
/// [`ExportError::Encode`] if the encoder fails.
pub fn export(image: &EncodedImage, options: &ExportOptions) -> Result<ExportedFile, ExportError> {
    let format = options.format;
    let bytes = if image.format() == format && !format.is_lossy() {
        image.to_bytes().map_err(ExportError::Decode)?
    } else {
        let grid = codec::decode(image).map_err(ExportError::Decode)?;
        codec::encode_bytes(&grid, format, options.clamped_quality())
            .map_err(ExportError::Encode)?
    };
    Ok(ExportedFile {
        file_name: options.file_name(),
        mime: format.mime_type(),
        bytes,
    })
}

/// Rough output size in KiB, as shown next to the export button:
/// 4 bytes per pixel for PNG, `quality / 25` bytes per pixel otherwise.
///
/// WebP is encoded losslessly and ignores `quality`, so its estimate
/// follows the export dialog's formula rather than the encoder's output.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn estimated_size_kb(dimensions: Dimensions, format: ImageFormat, quality: u8) -> u64 {
    let bytes_per_pixel = match format {
        ImageFormat::Png => 4.0,
        ImageFormat::Jpeg | ImageFormat::WebP => f64::from(quality) / 25.0,
    };
    let kb = dimensions.pixel_count() as f64 * bytes_per_pixel / 1024.0;
    (kb + 0.5).floor() as u64
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use retouch_pipeline::PixelGrid;

    fn png_image(width: u32, height: u32) -> EncodedImage {
        let grid = PixelGrid::from_fn(width, height, |x, y| {
            image::Rgba([(x * 20) as u8, (y * 20) as u8, 100, 255])
        });
        codec::encode(&grid, ImageFormat::Png, 95).unwrap()
    }

    #[test]
    fn default_options() {
        let options = ExportOptions::default();
        assert_eq!(options.format, ImageFormat::Png);
        assert_eq!(options.quality, 90);
        assert_eq!(options.file_name(), "edited-image.png");
    }

    #[test]
    fn file_name_uses_format_extension() {
        let options = ExportOptions {
            format: ImageFormat::Jpeg,
            filename: "holiday".into(),
            ..ExportOptions::default()
        };
        assert_eq!(options.file_name(), "holiday.jpeg");
    }

    #[test]
    fn blank_file_name_falls_back_to_default() {
        let options = ExportOptions {
            format: ImageFormat::WebP,
            filename: "   ".into(),
            ..ExportOptions::default()
        };
        assert_eq!(options.file_name(), "edited-image.webp");
    }

    #[test]
    fn existing_extension_is_not_doubled() {
        let options = ExportOptions {
            filename: "shot.PNG".into(),
            ..ExportOptions::default()
        };
        assert_eq!(options.file_name(), "shot.PNG");
    }

    #[test]
    fn quality_is_clamped() {
        let low = ExportOptions {
            quality: 0,
            ..ExportOptions::default()
        };
        let high = ExportOptions {
            quality: 255,
            ..ExportOptions::default()
        };
        assert_eq!(low.clamped_quality(), 10);
        assert_eq!(high.clamped_quality(), 100);
    }

    #[test]
    fn same_lossless_format_passes_bytes_through() {
        let image = png_image(4, 4);
        let file = export(&image, &ExportOptions::default()).unwrap();
        assert_eq!(file.bytes, image.to_bytes().unwrap());
        assert_eq!(file.mime, "image/png");
    }

    #[test]
    fn jpeg_export_is_reencoded() {
        let image = png_image(8, 8);
        let options = ExportOptions {
            format: ImageFormat::Jpeg,
            quality: 50,
            ..ExportOptions::default()
        };
        let file = export(&image, &options).unwrap();
        assert_eq!(file.mime, "image/jpeg");
        assert_eq!(
            image::guess_format(&file.bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
        let decoded = image::load_from_memory(&file.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ExportOptions = serde_json::from_str(r#"{"format":"webp"}"#).unwrap();
        assert_eq!(options.format, ImageFormat::WebP);
        assert_eq!(options.quality, 90);
        assert_eq!(options.filename, "edited-image");
    }

    #[test]
    fn size_estimate_matches_dialog() {
        // 1920 * 1080 * 4 / 1024 = 8100
        assert_eq!(
            estimated_size_kb(Dimensions::new(1920, 1080), ImageFormat::Png, 90),
            8100
        );
        // 100 * 50 * 3.6 / 1024 = 17.58 -> 18
        assert_eq!(
            estimated_size_kb(Dimensions::new(100, 50), ImageFormat::Jpeg, 90),
            18
        );
        // 10 * 10 * 0.4 / 1024 = 0.039 -> 0
        assert_eq!(
            estimated_size_kb(Dimensions::new(10, 10), ImageFormat::WebP, 10),
            0
        );
    }

    #[test]
    fn webp_estimate_tracks_quality_but_output_does_not() {
        let dims = Dimensions::new(512, 512);
        // 512 * 512 * 2 / 1024 = 512, 512 * 512 * 4 / 1024 = 1024
        assert_eq!(estimated_size_kb(dims, ImageFormat::WebP, 50), 512);
        assert_eq!(estimated_size_kb(dims, ImageFormat::WebP, 100), 1024);

        let image = png_image(12, 12);
        let at = |quality| {
            let options = ExportOptions {
                format: ImageFormat::WebP,
                quality,
                ..ExportOptions::default()
            };
            export(&image, &options).unwrap().bytes
        };
        assert_eq!(at(50), at(100));
    }
}
