//! Reading user-selected files.
//!
//! The browser hands over a `File` from the file picker or a drop event.
//! Its reported MIME type is checked before any bytes are read; a file
//! with no reported type falls back to a guess from its name.

use retouch_pipeline::upload::{is_image_mime, mime_from_file_name};
use retouch_pipeline::{EditorError, Upload};
use wasm_bindgen_futures::JsFuture;

/// The MIME type to validate `file` against.
fn effective_mime(reported: &str, file_name: &str) -> String {
    if reported.trim().is_empty() {
        mime_from_file_name(file_name).to_string()
    } else {
        reported.to_string()
    }
}

/// Read and validate a browser `File`.
///
/// # Errors
///
/// Returns [`EditorError::InvalidUpload`] for a non-image file (without
/// reading it), [`EditorError::Processing`] if the browser fails to read
/// the contents, and the validation errors of [`Upload::new`] otherwise.
#[allow(clippy::future_not_send)] // WASM is single-threaded
pub async fn read_file(file: &web_sys::File) -> Result<Upload, EditorError> {
    let name = file.name();
    let mime = effective_mime(&file.type_(), &name);
    if !is_image_mime(&mime) {
        return Err(EditorError::InvalidUpload(format!(
            "{name}: expected an image/* file, got {mime:?}"
        )));
    }

    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| EditorError::Processing(format!("failed to read {name}: {e:?}")))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Upload::new(name, &mime, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_type_wins() {
        assert_eq!(effective_mime("image/webp", "photo.png"), "image/webp");
    }

    #[test]
    fn missing_type_is_guessed_from_name() {
        assert_eq!(effective_mime("", "photo.JPG"), "image/jpeg");
        assert_eq!(effective_mime(" ", "notes.txt"), "application/octet-stream");
    }
}
