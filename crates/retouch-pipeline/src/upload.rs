//! Validation of user-supplied image files.

use crate::codec::EncodedImage;
use crate::types::{EditorError, ImageFormat};

/// A validated upload: the display file name and its decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    file_name: String,
    image: EncodedImage,
}

impl Upload {
    /// Validate a selected or dropped file.
    ///
    /// `mime` is the type reported by the browser (or inferred from the
    /// file extension). Anything outside `image/*` is rejected before the
    /// bytes are looked at.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidUpload`] for a non-image MIME type,
    /// [`EditorError::EmptyInput`] for an empty file, and the decode errors
    /// of [`EncodedImage::from_bytes`] for unreadable data.
    pub fn new(
        file_name: impl Into<String>,
        mime: &str,
        bytes: &[u8],
    ) -> Result<Self, EditorError> {
        let file_name = file_name.into();
        if !is_image_mime(mime) {
            return Err(EditorError::InvalidUpload(format!(
                "{file_name}: expected an image/* file, got {mime:?}"
            )));
        }
        let image = EncodedImage::from_bytes(bytes)?;
        Ok(Self { file_name, image })
    }

    /// The original file name, shown in the editor header.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The decoded payload.
    #[must_use]
    pub const fn image(&self) -> &EncodedImage {
        &self.image
    }

    /// Split into file name and image.
    #[must_use]
    pub fn into_parts(self) -> (String, EncodedImage) {
        (self.file_name, self.image)
    }
}

/// Whether `mime` is an `image/*` type.
#[must_use]
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Guess a MIME type from a file name's extension, for shells that read
/// from disk. Unknown extensions give `application/octet-stream`.
#[must_use]
pub fn mime_from_file_name(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default();
    extension
        .parse::<ImageFormat>()
        .map_or("application/octet-stream", ImageFormat::mime_type)
}
