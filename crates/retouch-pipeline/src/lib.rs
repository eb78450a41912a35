//! retouch-pipeline: Pure photo editing core (sans-IO).
//!
//! Decodes uploaded images into RGBA pixel grids, runs adjustment filters
//! (sharpen, denoise, contrast, exposure, color correction, red-eye,
//! auto-enhance) on them, and keeps a linear undo/redo history of encoded
//! results. [`Session`] ties these together and delegates AI operations to
//! an injected [`AiGateway`].
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and base64 payloads. Browser interaction lives in
//! `retouch-io`, network access in `retouch-gateway`.

pub mod channel;
pub mod codec;
pub mod color;
pub mod config;
pub mod contrast;
pub mod denoise;
pub mod enhance;
pub mod exposure;
pub mod filter;
pub mod gateway;
pub mod history;
pub mod intent;
pub mod red_eye;
pub mod session;
pub mod sharpen;
pub mod types;
pub mod upload;

pub use codec::{DEFAULT_QUALITY, EncodedImage};
pub use config::{ApiProvider, EditorConfig, Settings};
pub use filter::{Filter, FilterKind};
pub use gateway::{
    AiEditRequest, AiGateway, AiOperation, ChatRequest, DisabledGateway, GatewayError,
};
pub use history::EditHistory;
pub use intent::{Intent, IntentKind, extract_intent};
pub use session::{ChatOutcome, EditReport, Session};
pub use types::{Dimensions, EditorError, ErrorKind, FilterParams, ImageFormat, PixelGrid};
pub use upload::Upload;

/// Apply one tool to a data URL and return the re-encoded result.
///
/// This is the whole job of the filter worker: it receives the displayed
/// image as a data URL, runs the filter off the main thread, and posts the
/// encoded result back.
///
/// # Errors
///
/// Returns the decode errors of [`EncodedImage::from_data_url`],
/// [`EditorError::UnknownTool`] for an unknown `tool_id`, and
/// [`EditorError::Encode`] if re-encoding fails.
pub fn apply_to_data_url(
    data_url: &str,
    tool_id: &str,
    params: &FilterParams,
    format: ImageFormat,
    quality: u8,
) -> Result<EncodedImage, EditorError> {
    let filter = Filter::from_tool(tool_id, params)?;
    let source = EncodedImage::from_data_url(data_url)?;
    let grid = codec::decode(&source)?;
    codec::encode(&filter.apply(&grid), format, quality)
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use crate::red_eye::RedEyeParams;
    use crate::test_support::{gradient, png_bytes};

    /// 100x50 image with a red-eye patch, a dim red patch and neutral
    /// gradient elsewhere.
    fn portrait() -> PixelGrid {
        PixelGrid::from_fn(100, 50, |x, y| {
            if (40..60).contains(&x) && (20..30).contains(&y) {
                image::Rgba([200, 50, 40, 255])
            } else if x < 10 {
                image::Rgba([70, 20, 20, 255])
            } else {
                let v = ((x + y) % 200) as u8;
                image::Rgba([v, v, v, 255])
            }
        })
    }

    #[test]
    fn upload_red_eye_undo_round_trip() {
        let original = portrait();
        let upload = Upload::new("portrait.png", "image/png", &png_bytes(&original)).unwrap();
        let mut session = Session::new(EditorConfig::default(), Box::new(DisabledGateway));
        session.load_upload(upload);

        let report = session
            .apply_tool("red-eye", &FilterParams::new().with("sensitivity", 80.0))
            .unwrap();
        assert_eq!(report.dimensions, Dimensions::new(100, 50));

        let edited = codec::decode(session.image().unwrap()).unwrap();
        assert_eq!(edited.dimensions(), (100, 50));
        let params = RedEyeParams { sensitivity: 80.0 };
        for (before, after) in original.pixels().zip(edited.pixels()) {
            let [r, g, b, a] = before.0;
            if params.matches(f64::from(r), f64::from(g), f64::from(b)) {
                assert_eq!(after.0, [120, 40, 32, a]);
            } else {
                assert_eq!(after, before);
            }
        }

        session.undo().unwrap();
        let restored = codec::decode(session.image().unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn worker_handler_applies_tool() {
        let grid = gradient(6, 4);
        let source = codec::encode(&grid, ImageFormat::Png, DEFAULT_QUALITY).unwrap();
        let result = apply_to_data_url(
            &source.to_data_url(),
            "contrast",
            &FilterParams::new().with("contrast", 20.0),
            ImageFormat::Png,
            DEFAULT_QUALITY,
        )
        .unwrap();
        let expected = Filter::from_tool("contrast", &FilterParams::new().with("contrast", 20.0))
            .unwrap()
            .apply(&grid);
        assert_eq!(codec::decode(&result).unwrap(), expected);
    }

    #[test]
    fn worker_handler_rejects_unknown_tool_before_decoding() {
        let err = apply_to_data_url(
            "not a data url",
            "blur",
            &FilterParams::new(),
            ImageFormat::Png,
            DEFAULT_QUALITY,
        )
        .unwrap_err();
        assert!(matches!(err, EditorError::UnknownTool(_)));
    }

    #[test]
    fn worker_handler_reports_bad_payload() {
        let err = apply_to_data_url(
            "data:image/png;base64,AAAA",
            "sharpen",
            &FilterParams::new(),
            ImageFormat::Png,
            DEFAULT_QUALITY,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
