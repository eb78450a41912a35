//! Web worker communication for off-main-thread filtering.
//!
//! [`FilterWorker`] wraps a `web_sys::Worker` running the
//! `retouch-worker` WASM module. It posts the displayed image as a data
//! URL together with a tool id and parameters, and receives either the
//! re-encoded image or a serialized [`EditorError`] back.
//!
//! The worker is created from embedded JS + WASM blobs, so no extra
//! static files need to be served.

use std::cell::RefCell;
use std::rc::Rc;

use retouch_pipeline::{EditorError, EncodedImage, FilterParams, ImageFormat};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// One filter application to run in the worker.
#[derive(Debug, Clone, Copy)]
pub struct FilterJob<'a> {
    /// The image to filter.
    pub image: &'a EncodedImage,
    /// Tool id, e.g. `sharpen` or `red-eye`.
    pub tool_id: &'a str,
    /// Parameters for the tool.
    pub params: &'a FilterParams,
    /// Format the result is encoded in.
    pub format: ImageFormat,
    /// Encoder quality for lossy formats.
    pub quality: u8,
}

/// A filter worker that runs `apply_to_data_url` in a dedicated web worker.
///
/// Create one at startup and reuse it for every tool application.
/// Call [`cancel`](Self::cancel) to abandon a run in progress: the
/// worker is killed and a fresh one spawned.
pub struct FilterWorker {
    /// The embedded wasm-bindgen JS glue for the worker.
    worker_js: &'static str,
    /// The embedded WASM binary for the worker.
    worker_wasm: &'static [u8],
    /// The current worker instance. Replaced on cancel.
    inner: RefCell<web_sys::Worker>,
}

impl FilterWorker {
    /// Create a new filter worker from embedded JS and WASM blobs.
    ///
    /// # Panics
    ///
    /// Panics if the worker cannot be created (e.g. in a non-browser
    /// environment).
    #[must_use]
    pub fn new(worker_js: &'static str, worker_wasm: &'static [u8]) -> Self {
        let worker = create_worker(worker_js, worker_wasm);
        Self {
            worker_js,
            worker_wasm,
            inner: RefCell::new(worker),
        }
    }

    /// Run one filter in the worker.
    ///
    /// `generation` is echoed back by the worker; responses carrying any
    /// other generation are ignored as stale.
    ///
    /// # Errors
    ///
    /// Returns the [`EditorError`] reported by the worker, or
    /// [`EditorError::Processing`] if the message cannot be posted, the
    /// worker fails, or its response is malformed.
    #[allow(clippy::future_not_send)] // WASM is single-threaded
    pub async fn run(
        &self,
        job: FilterJob<'_>,
        generation: f64,
    ) -> Result<EncodedImage, EditorError> {
        let message = build_message(&job, generation)?;

        let result = Rc::new(RefCell::new(None::<Result<EncodedImage, EditorError>>));
        let result_clone = Rc::clone(&result);

        let (promise, resolve, reject) = new_promise();

        let resolve_clone = resolve.clone();
        let onmessage = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(
            move |event: web_sys::MessageEvent| {
                let data = event.data();

                let resp_generation = get(&data, "generation")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(-1.0);
                if (resp_generation - generation).abs() > f64::EPSILON {
                    return;
                }

                let outcome = read_response(
                    get(&data, "ok").and_then(|v| v.as_bool()).unwrap_or(false),
                    get(&data, "dataUrl").and_then(|v| v.as_string()),
                    get(&data, "errorJson").and_then(|v| v.as_string()),
                );
                *result_clone.borrow_mut() = Some(outcome);
                resolve_clone.call0(&JsValue::NULL).ok();
            },
        );

        let onerror =
            Closure::<dyn FnMut(web_sys::ErrorEvent)>::new(move |event: web_sys::ErrorEvent| {
                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&event.message()));
            });

        {
            let worker = self.inner.borrow();
            worker.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
            worker.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            worker
                .post_message(&message)
                .map_err(|_| EditorError::Processing("failed to postMessage".into()))?;
        }

        // Keep the closures alive until the promise settles.
        let _onmessage_guard = onmessage;
        let _onerror_guard = onerror;

        let await_result = wasm_bindgen_futures::JsFuture::from(promise).await;

        {
            let worker = self.inner.borrow();
            worker.set_onmessage(None);
            worker.set_onerror(None);
        }

        match await_result {
            Ok(_) => result.borrow_mut().take().unwrap_or_else(|| {
                Err(EditorError::Processing("worker completed but no result captured".into()))
            }),
            Err(e) => {
                let msg = e
                    .as_string()
                    .unwrap_or_else(|| "unknown worker error".into());
                Err(EditorError::Processing(format!("worker error: {msg}")))
            }
        }
    }

    /// Abandon any run in progress by terminating the worker and
    /// creating a fresh one.
    pub fn cancel(&self) {
        self.inner.borrow().terminate();
        let new_worker = create_worker(self.worker_js, self.worker_wasm);
        *self.inner.borrow_mut() = new_worker;
    }
}

/// Build `{ imageDataUrl, toolId, paramsJson, format, quality, generation }`.
fn build_message(job: &FilterJob<'_>, generation: f64) -> Result<js_sys::Object, EditorError> {
    let params_json = serde_json::to_string(job.params)
        .map_err(|e| EditorError::Processing(format!("failed to serialize parameters: {e}")))?;

    let message = js_sys::Object::new();
    let set = |key: &str, value: &JsValue| {
        js_sys::Reflect::set(&message, &JsValue::from_str(key), value)
            .map(|_| ())
            .map_err(|_| EditorError::Processing(format!("failed to set {key}")))
    };
    set("imageDataUrl", &JsValue::from_str(&job.image.to_data_url()))?;
    set("toolId", &JsValue::from_str(job.tool_id))?;
    set("paramsJson", &JsValue::from_str(&params_json))?;
    set("format", &JsValue::from_str(job.format.extension()))?;
    set("quality", &JsValue::from_f64(f64::from(job.quality)))?;
    set("generation", &JsValue::from_f64(generation))?;
    Ok(message)
}

fn get(data: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(data, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

/// Turn the fields of a worker response into the filter outcome.
fn read_response(
    ok: bool,
    data_url: Option<String>,
    error_json: Option<String>,
) -> Result<EncodedImage, EditorError> {
    if ok {
        let data_url = data_url
            .ok_or_else(|| EditorError::Processing("worker response missing dataUrl".into()))?;
        return EncodedImage::from_data_url(&data_url);
    }
    let json = error_json
        .ok_or_else(|| EditorError::Processing("worker response missing errorJson".into()))?;
    Err(serde_json::from_str::<EditorError>(&json).unwrap_or_else(|e| {
        EditorError::Processing(format!("failed to deserialize worker error: {e}"))
    }))
}

/// Create a web worker from embedded JS glue and WASM binary.
///
/// The WASM binary and a self-initializing wrapper around the glue are
/// each turned into Blob URLs; the worker loads the wrapper, which
/// instantiates the WASM from its Blob URL.
fn create_worker(worker_js: &str, worker_wasm: &[u8]) -> web_sys::Worker {
    let wasm_array = js_sys::Uint8Array::from(worker_wasm);
    let wasm_blob_parts = js_sys::Array::new();
    wasm_blob_parts.push(&wasm_array.buffer());
    let wasm_blob_opts = web_sys::BlobPropertyBag::new();
    wasm_blob_opts.set_type("application/wasm");
    let wasm_blob = web_sys::Blob::new_with_buffer_source_sequence_and_options(
        &wasm_blob_parts,
        &wasm_blob_opts,
    )
    .expect_throw("failed to create WASM Blob");
    let wasm_url = web_sys::Url::create_object_url_with_blob(&wasm_blob)
        .expect_throw("failed to create WASM Blob URL");

    let wrapper_js = format!(
        r#"{worker_js}

wasm_bindgen("{wasm_url}")
    .catch(function(e) {{ console.error("retouch worker init failed:", e); }});
"#
    );

    let js_blob_parts = js_sys::Array::new();
    js_blob_parts.push(&JsValue::from_str(&wrapper_js));
    let js_blob_opts = web_sys::BlobPropertyBag::new();
    js_blob_opts.set_type("application/javascript");
    let js_blob = web_sys::Blob::new_with_str_sequence_and_options(&js_blob_parts, &js_blob_opts)
        .expect_throw("failed to create JS Blob");
    let js_url = web_sys::Url::create_object_url_with_blob(&js_blob)
        .expect_throw("failed to create JS Blob URL");

    let worker = web_sys::Worker::new(&js_url).expect_throw("failed to create Worker");

    // The WASM URL stays alive: the worker's async init may still fetch it.
    web_sys::Url::revoke_object_url(&js_url).ok();

    worker
}

/// Create a JS Promise along with its resolve and reject functions.
fn new_promise() -> (js_sys::Promise, js_sys::Function, js_sys::Function) {
    let resolve = Rc::new(RefCell::new(None::<js_sys::Function>));
    let reject = Rc::new(RefCell::new(None::<js_sys::Function>));
    let resolve_clone = Rc::clone(&resolve);
    let reject_clone = Rc::clone(&reject);

    let promise = js_sys::Promise::new(&mut move |res, rej| {
        *resolve_clone.borrow_mut() = Some(res);
        *reject_clone.borrow_mut() = Some(rej);
    });

    let resolve_fn = resolve
        .borrow_mut()
        .take()
        .expect_throw("resolve not captured");
    let reject_fn = reject
        .borrow_mut()
        .take()
        .expect_throw("reject not captured");

    (promise, resolve_fn, reject_fn)
}
