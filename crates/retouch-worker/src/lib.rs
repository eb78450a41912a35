//! Web worker entry point for retouch filter processing.
//!
//! This crate compiles to a standalone WASM module that runs inside a
//! `Worker`. It receives the displayed image as a data URL plus a tool id
//! and parameters via `postMessage`, calls
//! [`retouch_pipeline::apply_to_data_url`], and posts the re-encoded
//! result back.
//!
//! Running filters in a worker keeps the browser's main thread free for
//! UI updates while large images are processed.

use retouch_pipeline::{EditorError, EncodedImage, FilterParams, ImageFormat};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// A decoded request from the main thread.
#[derive(Debug, Clone, PartialEq)]
struct FilterRequest {
    image_data_url: String,
    tool_id: String,
    params_json: String,
    format: String,
    quality: f64,
}

impl FilterRequest {
    /// Run the requested filter.
    fn run(&self) -> Result<EncodedImage, EditorError> {
        let params: FilterParams = if self.params_json.trim().is_empty() {
            FilterParams::new()
        } else {
            serde_json::from_str(&self.params_json)
                .map_err(|e| EditorError::Processing(format!("invalid filter parameters: {e}")))?
        };
        let format: ImageFormat = self.format.parse()?;
        retouch_pipeline::apply_to_data_url(
            &self.image_data_url,
            &self.tool_id,
            &params,
            format,
            quality_from_js(self.quality),
        )
    }
}

/// Convert a JS number to an encoder quality, 1–100.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quality_from_js(quality: f64) -> u8 {
    if quality.is_finite() {
        quality.round().clamp(1.0, 100.0) as u8
    } else {
        retouch_pipeline::DEFAULT_QUALITY
    }
}

/// Message protocol: the main thread sends a JS object with:
/// - `imageDataUrl`: `String`, the displayed image as a `data:` URL
/// - `toolId`: `String`, filter id (e.g. `sharpen`, `red-eye`)
/// - `paramsJson`: `String`, JSON object of numeric parameters
/// - `format`: `String`, output format (`png`, `jpeg`, `webp`)
/// - `quality`: `f64`, output quality for JPEG, 1–100
/// - `generation`: `f64` generation counter (passed through to response)
///
/// On success the worker responds with a JS object containing:
/// - `generation`: `f64` matching the request generation
/// - `ok`: `true`
/// - `dataUrl`: `String`, the filtered image as a `data:` URL
/// - `width`, `height`: `f64`, image dimensions
///
/// On error the worker responds with:
/// - `generation`: `f64`
/// - `ok`: `false`
/// - `errorJson`: `String`, JSON-serialized `EditorError`
///
/// # Worker entry point
///
/// Called automatically when the WASM module is instantiated in the
/// worker context.
#[wasm_bindgen(start)]
pub fn worker_main() {
    console_error_panic_hook::set_once();

    let global: web_sys::DedicatedWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .expect_throw("not running in a DedicatedWorkerGlobalScope");

    let onmessage =
        Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |event: web_sys::MessageEvent| {
            handle_message(&event);
        });
    global.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget(); // leak: lives for the worker lifetime

    web_sys::console::debug_1(&JsValue::from_str("retouch worker ready"));
}

/// Handle an incoming message from the main thread.
fn handle_message(event: &web_sys::MessageEvent) {
    let data = event.data();
    let generation = get(&data, "generation")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);

    let request = match read_request(&data) {
        Ok(request) => request,
        Err(e) => {
            post_error(generation, &e);
            return;
        }
    };

    // Synchronous: blocks this worker thread only.
    match request.run() {
        Ok(image) => post_success(generation, &image),
        Err(e) => {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "{} failed: {e}",
                request.tool_id
            )));
            post_error(generation, &e);
        }
    }
}

fn get(data: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(data, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn get_string(data: &JsValue, key: &str) -> Result<String, EditorError> {
    get(data, key)
        .and_then(|v| v.as_string())
        .ok_or_else(|| EditorError::Processing(format!("missing or non-string field {key}")))
}

fn read_request(data: &JsValue) -> Result<FilterRequest, EditorError> {
    Ok(FilterRequest {
        image_data_url: get_string(data, "imageDataUrl")?,
        tool_id: get_string(data, "toolId")?,
        params_json: get(data, "paramsJson")
            .and_then(|v| v.as_string())
            .unwrap_or_default(),
        format: get(data, "format")
            .and_then(|v| v.as_string())
            .unwrap_or_else(|| ImageFormat::Png.extension().to_string()),
        quality: get(data, "quality")
            .and_then(|v| v.as_f64())
            .unwrap_or_else(|| f64::from(retouch_pipeline::DEFAULT_QUALITY)),
    })
}

/// Post a successful result back to the main thread.
fn post_success(generation: f64, image: &EncodedImage) {
    let response = js_sys::Object::new();
    let set = |key: &str, val: &JsValue| {
        js_sys::Reflect::set(&response, &JsValue::from_str(key), val)
            .expect_throw("failed to set response field");
    };

    let dimensions = image.dimensions();
    set("generation", &JsValue::from_f64(generation));
    set("ok", &JsValue::from_bool(true));
    set("dataUrl", &JsValue::from_str(&image.to_data_url()));
    set("width", &JsValue::from_f64(f64::from(dimensions.width)));
    set("height", &JsValue::from_f64(f64::from(dimensions.height)));

    post(&response);
}

/// Post an error response back to the main thread.
fn post_error(generation: f64, error: &EditorError) {
    let error_json = serde_json::to_string(error)
        .unwrap_or_else(|ser_err| format!("{{\"Processing\":\"serialization error: {ser_err}\"}}"));

    let response = js_sys::Object::new();
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("generation"),
        &JsValue::from_f64(generation),
    );
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("ok"),
        &JsValue::from_bool(false),
    );
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("errorJson"),
        &JsValue::from_str(&error_json),
    );

    post(&response);
}

fn post(response: &js_sys::Object) {
    if let Ok(global) = js_sys::global().dyn_into::<web_sys::DedicatedWorkerGlobalScope>() {
        let _ = global.post_message(response);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
mod tests {
    use super::*;
    use retouch_pipeline::{PixelGrid, codec};

    #[allow(clippy::cast_possible_truncation)]
    fn data_url() -> String {
        let raw: Vec<u8> = (0..5 * 4 * 4).map(|i| (i * 7 % 256) as u8).collect();
        let grid = PixelGrid::from_raw(5, 4, raw).unwrap();
        codec::encode(&grid, ImageFormat::Png, 95)
            .unwrap()
            .to_data_url()
    }

    fn request(tool: &str, params: &str, format: &str) -> FilterRequest {
        FilterRequest {
            image_data_url: data_url(),
            tool_id: tool.into(),
            params_json: params.into(),
            format: format.into(),
            quality: 95.0,
        }
    }

    #[test]
    fn runs_filter_and_reencodes() {
        let image = request("red-eye", r#"{"sensitivity":80}"#, "webp")
            .run()
            .unwrap();
        assert_eq!(image.format(), ImageFormat::WebP);
        assert_eq!(image.dimensions().width, 5);
        assert_eq!(image.dimensions().height, 4);
    }

    #[test]
    fn empty_params_use_defaults() {
        assert!(request("sharpen", "", "png").run().is_ok());
    }

    #[test]
    fn bad_params_json_is_processing_error() {
        let err = request("sharpen", "{not json", "png").run().unwrap_err();
        assert!(matches!(err, EditorError::Processing(_)));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = request("sharpen", "{}", "gif").run().unwrap_err();
        assert!(matches!(err, EditorError::UnsupportedFormat(_)));
    }

    #[test]
    fn unknown_tool_error_serializes_for_main_thread() {
        let err = request("blur", "{}", "png").run().unwrap_err();
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"UnknownTool":"blur"}"#);
    }

    #[test]
    fn quality_conversion() {
        assert_eq!(quality_from_js(0.0), 1);
        assert_eq!(quality_from_js(89.6), 90);
        assert_eq!(quality_from_js(1e9), 100);
        assert_eq!(quality_from_js(f64::NAN), 95);
    }
}
