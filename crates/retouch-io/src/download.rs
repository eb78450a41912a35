//! Saving exported images through the browser.
//!
//! There is no "save these bytes" call in the DOM, so
//! [`download_export`] wraps the encoded file in a `Blob`, points a
//! temporary `<a download>` at its object URL and clicks it.
//!
//! [`Download`] is plain data; everything else needs a browser
//! (`wasm32-unknown-unknown` target).

use retouch_export::ExportedFile;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{BlobPropertyBag, Document, HtmlAnchorElement};

/// Errors that can occur when triggering a file download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for DownloadError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// What the browser is asked to save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Download<'a> {
    /// Name offered in the save dialog.
    pub file_name: &'a str,
    /// `type` of the `Blob`.
    pub mime: &'a str,
    /// Blob contents.
    pub bytes: &'a [u8],
}

impl<'a> From<&'a ExportedFile> for Download<'a> {
    fn from(file: &'a ExportedFile) -> Self {
        Self {
            file_name: &file.file_name,
            mime: file.mime,
            bytes: &file.bytes,
        }
    }
}

/// Offer an exported image to the user as a download.
///
/// # Errors
///
/// Returns [`DownloadError::JsError`] if any browser API call fails.
pub fn download_export(file: &ExportedFile) -> Result<(), DownloadError> {
    trigger_download(Download::from(file))
}

/// Save `download` by clicking a temporary anchor at a Blob URL.
///
/// The object URL is revoked once the click has been dispatched.
///
/// # Errors
///
/// Returns [`DownloadError::JsError`] if there is no document, or if
/// creating the `Blob`, its URL or the anchor fails.
pub fn trigger_download(download: Download<'_>) -> Result<(), DownloadError> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| DownloadError::JsError("no document".into()))?;
    let url = blob_url(download.bytes, download.mime)?;
    let clicked = click_anchor(&document, &url, download.file_name);
    let _ = web_sys::Url::revoke_object_url(&url);
    clicked
}

fn blob_url(bytes: &[u8], mime: &str) -> Result<String, DownloadError> {
    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    Ok(web_sys::Url::create_object_url_with_blob(&blob)?)
}

fn click_anchor(document: &Document, url: &str, file_name: &str) -> Result<(), DownloadError> {
    let anchor = document
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|e| DownloadError::JsError(format!("failed to cast element: {e:?}")))?;
    anchor.set_href(url);
    anchor.set_download(file_name);

    let body = document
        .body()
        .ok_or_else(|| DownloadError::JsError("no document body".into()))?;
    body.append_child(&anchor)?;
    anchor.click();
    // The download has started; a failed removal is not a failed download.
    let _ = body.remove_child(&anchor);
    Ok(())
}
