//! The editing session: the displayed image, its history, and the
//! operations the UI can request.
//!
//! Every operation computes its result before touching any state, so a
//! failed edit leaves the displayed image and the history exactly as they
//! were. The displayed image is always the current history entry.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::codec::{self, EncodedImage};
use crate::config::EditorConfig;
use crate::filter::Filter;
use crate::gateway::{AiEditRequest, AiGateway, AiOperation, ChatRequest};
use crate::history::EditHistory;
use crate::intent::{self, Intent};
use crate::types::{Dimensions, EditorError, FilterParams};
use crate::upload::Upload;

/// Outcome of a successful edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditReport {
    /// Tool id or AI operation that produced the edit.
    pub action: String,
    /// Wall-clock time spent, including decode and encode.
    pub duration: Duration,
    /// Dimensions of the new image.
    pub dimensions: Dimensions,
}

/// What [`Session::send_message`] did with a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChatOutcome {
    /// The message was an editing request and the edit was applied.
    Edited(EditReport),
    /// The message was forwarded as chat; this is the reply.
    Reply(String),
}

/// A single-image editing session.
pub struct Session {
    config: EditorConfig,
    gateway: Box<dyn AiGateway>,
    file_name: Option<String>,
    history: EditHistory,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new(config: EditorConfig, gateway: Box<dyn AiGateway>) -> Self {
        Self {
            config,
            gateway,
            file_name: None,
            history: EditHistory::new(),
        }
    }

    /// Display `image` and start a fresh history with it.
    pub fn load(&mut self, file_name: impl Into<String>, image: EncodedImage) {
        let file_name = file_name.into();
        info!(
            %file_name,
            dimensions = %image.dimensions(),
            format = %image.format(),
            "image loaded"
        );
        self.file_name = Some(file_name);
        self.history.reset(image);
    }

    /// [`load`](Self::load) a validated upload.
    pub fn load_upload(&mut self, upload: Upload) {
        let (file_name, image) = upload.into_parts();
        self.load(file_name, image);
    }

    /// Apply the filter named `tool_id` with `params` to the displayed image.
    ///
    /// # Errors
    ///
    /// - [`EditorError::NoImage`] if nothing is loaded.
    /// - [`EditorError::UnknownTool`] if `tool_id` names no filter.
    /// - [`EditorError::Processing`] if decoding or encoding fails; the
    ///   session is unchanged.
    pub fn apply_tool(
        &mut self,
        tool_id: &str,
        params: &FilterParams,
    ) -> Result<EditReport, EditorError> {
        if self.history.is_empty() {
            return Err(EditorError::NoImage);
        }
        let filter =
            Filter::from_tool(tool_id, params).inspect_err(|e| warn!(%e, "tool rejected"))?;
        self.apply_filter(filter)
    }

    /// Apply an already-resolved filter to the displayed image.
    ///
    /// # Errors
    ///
    /// - [`EditorError::NoImage`] if nothing is loaded.
    /// - [`EditorError::Processing`] if decoding or encoding fails; the
    ///   session is unchanged.
    pub fn apply_filter(&mut self, filter: Filter) -> Result<EditReport, EditorError> {
        let current = self.history.current().ok_or(EditorError::NoImage)?;
        let start = Instant::now();
        let edited = self.run_filter(current, filter).map_err(|e| {
            warn!(tool = %filter.kind(), %e, "filter failed, keeping previous image");
            into_processing(e)
        })?;
        Ok(self.commit(filter.kind().id().to_string(), edited, start))
    }

    fn run_filter(
        &self,
        current: &EncodedImage,
        filter: Filter,
    ) -> Result<EncodedImage, EditorError> {
        let grid = codec::decode(current)?;
        let filtered = filter.apply(&grid);
        codec::encode(
            &filtered,
            self.config.working_format,
            self.config.working_quality,
        )
    }

    /// Push a computed edit and make it the displayed image.
    fn commit(&mut self, action: String, image: EncodedImage, start: Instant) -> EditReport {
        let report = EditReport {
            action,
            duration: start.elapsed(),
            dimensions: image.dimensions(),
        };
        self.history.push(image);
        info!(
            action = %report.action,
            elapsed_ms = report.duration.as_secs_f64() * 1000.0,
            dimensions = %report.dimensions,
            history_len = self.history.len(),
            "edit applied"
        );
        report
    }

    /// Step back to the previous image.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NothingToUndo`] at the start of the history.
    /// This is informational; nothing changes.
    pub fn undo(&mut self) -> Result<&EncodedImage, EditorError> {
        self.history
            .undo()
            .inspect_err(|e| debug!(%e, "undo ignored"))?;
        debug!(index = ?self.history.index(), "undo");
        self.history.current().ok_or(EditorError::NothingToUndo)
    }

    /// Step forward to the next image.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NothingToRedo`] at the end of the history.
    /// This is informational; nothing changes.
    pub fn redo(&mut self) -> Result<&EncodedImage, EditorError> {
        self.history
            .redo()
            .inspect_err(|e| debug!(%e, "redo ignored"))?;
        debug!(index = ?self.history.index(), "redo");
        self.history.current().ok_or(EditorError::NothingToRedo)
    }

    /// Send the displayed image to the AI gateway with `prompt` and display
    /// the image it returns.
    ///
    /// # Errors
    ///
    /// - [`EditorError::NoImage`] if nothing is loaded.
    /// - [`EditorError::Processing`] if the gateway fails or returns an
    ///   unreadable image; the session is unchanged.
    pub fn apply_ai(
        &mut self,
        operation: AiOperation,
        prompt: &str,
    ) -> Result<EditReport, EditorError> {
        let current = self.history.current().ok_or(EditorError::NoImage)?;
        let start = Instant::now();
        let request = AiEditRequest {
            image_base64: current.base64().to_string(),
            prompt: prompt.to_string(),
            operation,
            model_type: self.config.settings.model_type().to_string(),
        };
        info!(%operation, model_type = %request.model_type, "AI edit requested");
        let edited = self
            .gateway
            .process(&request)
            .map_err(EditorError::from)
            .and_then(|payload| EncodedImage::from_data_url(&payload))
            .map_err(|e| {
                warn!(%operation, %e, "AI edit failed, keeping previous image");
                into_processing(e)
            })?;
        Ok(self.commit(operation.to_string(), edited, start))
    }

    /// Handle a chat message.
    ///
    /// A message with an editing intent is applied to the displayed image
    /// through [`apply_ai`](Self::apply_ai) with the whole message as the
    /// prompt. Anything else, or any message while no image is loaded, is
    /// forwarded to the gateway's chat endpoint with the displayed image as
    /// context.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Processing`] if the gateway call fails.
    pub fn send_message(&mut self, message: &str) -> Result<ChatOutcome, EditorError> {
        if let Some(intent) = self.extract_intent(message)
            && !self.history.is_empty()
        {
            debug!(intent = ?intent.kind, "chat message is an edit request");
            return self
                .apply_ai(intent.operation(), &intent.prompt)
                .map(ChatOutcome::Edited);
        }
        let request = ChatRequest {
            message: message.to_string(),
            image_context: self.history.current().map(|i| i.base64().to_string()),
        };
        let reply = self.gateway.chat(&request).map_err(|e| {
            warn!(%e, "chat failed");
            EditorError::from(e)
        })?;
        Ok(ChatOutcome::Reply(reply))
    }

    /// Recognize an editing intent in a chat message.
    #[must_use]
    pub fn extract_intent(&self, message: &str) -> Option<Intent> {
        intent::extract_intent(message)
    }

    /// The displayed image.
    #[must_use]
    pub fn image(&self) -> Option<&EncodedImage> {
        self.history.current()
    }

    /// Dimensions of the displayed image.
    #[must_use]
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.image().map(EncodedImage::dimensions)
    }

    /// Name of the loaded file.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The edit history.
    #[must_use]
    pub const fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Whether [`undo`](Self::undo) would change the image.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether [`redo`](Self::redo) would change the image.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The configuration this session was created with.
    #[must_use]
    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("file_name", &self.file_name)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

/// Failures inside an edit surface as processing errors.
fn into_processing(e: EditorError) -> EditorError {
    match e {
        EditorError::Processing(_) => e,
        other => EditorError::Processing(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::codec::{DEFAULT_QUALITY, decode};
    use crate::config::Settings;
    use crate::gateway::{DisabledGateway, GatewayError};
    use crate::test_support::{gradient, png_bytes, solid};
    use crate::types::{ErrorKind, ImageFormat, PixelGrid};

    /// Records requests and answers from fixed responses.
    #[derive(Default, Clone)]
    struct RecordingGateway {
        image: Option<String>,
        edits: Rc<RefCell<Vec<AiEditRequest>>>,
        chats: Rc<RefCell<Vec<ChatRequest>>>,
    }

    impl AiGateway for RecordingGateway {
        fn process(&self, request: &AiEditRequest) -> Result<String, GatewayError> {
            self.edits.borrow_mut().push(request.clone());
            self.image
                .clone()
                .ok_or_else(|| GatewayError::Transport("connection refused".into()))
        }

        fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
            self.chats.borrow_mut().push(request.clone());
            Ok("Chat message received".into())
        }
    }

    fn encoded(grid: &PixelGrid) -> EncodedImage {
        EncodedImage::from_bytes(&png_bytes(grid)).unwrap()
    }

    fn loaded_session(grid: &PixelGrid) -> Session {
        let mut session = Session::new(EditorConfig::default(), Box::new(DisabledGateway));
        session.load("photo.png", encoded(grid));
        session
    }

    fn displayed(session: &Session) -> PixelGrid {
        decode(session.image().unwrap()).unwrap()
    }

    #[test]
    fn new_session_is_empty() {
        let session = Session::new(EditorConfig::default(), Box::new(DisabledGateway));
        assert!(session.image().is_none());
        assert!(session.dimensions().is_none());
        assert!(session.file_name().is_none());
        assert!(!session.can_undo());
        assert!(!session.can_redo());
    }

    #[test]
    fn apply_tool_without_image_fails() {
        let mut session = Session::new(EditorConfig::default(), Box::new(DisabledGateway));
        let err = session
            .apply_tool("sharpen", &FilterParams::new())
            .unwrap_err();
        assert!(matches!(err, EditorError::NoImage));
    }

    #[test]
    fn no_image_is_checked_before_tool_id() {
        let mut session = Session::new(EditorConfig::default(), Box::new(DisabledGateway));
        let err = session
            .apply_tool("blur", &FilterParams::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoImage);
    }

    #[test]
    fn unknown_tool_leaves_session_unchanged() {
        let mut session = loaded_session(&gradient(4, 4));
        let err = session
            .apply_tool("blur", &FilterParams::new())
            .unwrap_err();
        assert!(matches!(err, EditorError::UnknownTool(_)));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn load_records_file_name_and_dimensions() {
        let session = loaded_session(&gradient(100, 50));
        assert_eq!(session.file_name(), Some("photo.png"));
        assert_eq!(session.dimensions(), Some(Dimensions::new(100, 50)));
        assert_eq!(session.history().index(), Some(0));
    }

    #[test]
    fn load_resets_history() {
        let mut session = loaded_session(&gradient(4, 4));
        session
            .apply_tool("contrast", &FilterParams::new())
            .unwrap();
        session.load("other.png", encoded(&gradient(3, 3)));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.file_name(), Some("other.png"));
        assert!(!session.can_undo());
    }

    #[test]
    fn encode_failure_keeps_previous_image() {
        // Wider than a JPEG frame can be.
        let config = EditorConfig {
            working_format: ImageFormat::Jpeg,
            ..EditorConfig::default()
        };
        let mut session = Session::new(config, Box::new(DisabledGateway));
        let original = encoded(&solid(70_000, 1, [90, 120, 150, 255]));
        session.load("wide.png", original.clone());

        let err = session
            .apply_tool("contrast", &FilterParams::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Processing);
        assert!(matches!(err, EditorError::Processing(_)));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().index(), Some(0));
        assert_eq!(session.image(), Some(&original));
    }

    #[test]
    fn apply_tool_pushes_filtered_image() {
        let grid = gradient(10, 10);
        let mut session = loaded_session(&grid);
        let report = session
            .apply_tool("denoise", &FilterParams::new().with("detail", 0.0))
            .unwrap();
        assert_eq!(report.action, "denoise");
        assert_eq!(report.dimensions, Dimensions::new(10, 10));
        assert_eq!(session.history().len(), 2);
        assert!(session.can_undo());

        let expected = Filter::from_tool("denoise", &FilterParams::new().with("detail", 0.0))
            .unwrap()
            .apply(&grid);
        assert_eq!(displayed(&session), expected);
    }

    #[test]
    fn working_format_controls_history_encoding() {
        let config = EditorConfig {
            working_format: ImageFormat::WebP,
            ..EditorConfig::default()
        };
        let mut session = Session::new(config, Box::new(DisabledGateway));
        session.load("photo.png", encoded(&gradient(4, 4)));
        session
            .apply_tool("exposure", &FilterParams::new())
            .unwrap();
        assert_eq!(session.image().unwrap().format(), ImageFormat::WebP);
    }

    #[test]
    fn undo_then_redo_restores_images() {
        let grid = gradient(6, 6);
        let mut session = loaded_session(&grid);
        session.apply_tool("red-eye", &FilterParams::new()).unwrap();
        let edited = displayed(&session);

        session.undo().unwrap();
        assert_eq!(displayed(&session), grid);
        assert!(matches!(session.undo(), Err(EditorError::NothingToUndo)));

        session.redo().unwrap();
        assert_eq!(displayed(&session), edited);
        assert!(matches!(session.redo(), Err(EditorError::NothingToRedo)));
    }

    #[test]
    fn undo_on_empty_session_is_noop() {
        let mut session = Session::new(EditorConfig::default(), Box::new(DisabledGateway));
        let err = session.undo().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoOp);
        assert!(session.history().is_empty());
    }

    #[test]
    fn ai_edit_displays_returned_image() {
        let result = encoded(&solid(5, 5, [1, 2, 3, 255]));
        let gateway = RecordingGateway {
            image: Some(result.to_data_url()),
            ..RecordingGateway::default()
        };
        let edits = Rc::clone(&gateway.edits);
        let mut session = Session::new(EditorConfig::default(), Box::new(gateway));
        session.load("photo.png", encoded(&gradient(5, 5)));
        let original = session.image().unwrap().clone();

        let report = session
            .apply_ai(AiOperation::RemoveObject, "remove the lamp")
            .unwrap();
        assert_eq!(report.action, "removeObject");
        assert_eq!(session.image(), Some(&result));

        let sent = edits.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].image_base64, original.base64());
        assert_eq!(sent[0].prompt, "remove the lamp");
        assert_eq!(sent[0].model_type, "openai");
    }

    #[test]
    fn ai_edit_accepts_bare_base64() {
        let result = encoded(&solid(2, 2, [9, 9, 9, 255]));
        let gateway = RecordingGateway {
            image: Some(result.base64().to_string()),
            ..RecordingGateway::default()
        };
        let mut session = Session::new(EditorConfig::default(), Box::new(gateway));
        session.load("photo.png", encoded(&gradient(2, 2)));
        session.apply_ai(AiOperation::Enhance, "enhance").unwrap();
        assert_eq!(session.image(), Some(&result));
    }

    #[test]
    fn ai_failure_rolls_back() {
        let mut session = loaded_session(&gradient(4, 4));
        let before = session.image().unwrap().clone();
        let err = session
            .apply_ai(AiOperation::ChangeBackground, "beach")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Processing);
        assert!(err.to_string().contains("disabled"));
        assert_eq!(session.image(), Some(&before));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn ai_garbage_payload_is_processing_error() {
        let gateway = RecordingGateway {
            image: Some("not an image".into()),
            ..RecordingGateway::default()
        };
        let mut session = Session::new(EditorConfig::default(), Box::new(gateway));
        session.load("photo.png", encoded(&gradient(4, 4)));
        let err = session.apply_ai(AiOperation::Enhance, "x").unwrap_err();
        assert!(matches!(err, EditorError::Processing(_)));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn ai_without_image_fails() {
        let mut session = Session::new(EditorConfig::default(), Box::new(DisabledGateway));
        let err = session.apply_ai(AiOperation::Enhance, "x").unwrap_err();
        assert!(matches!(err, EditorError::NoImage));
    }

    #[test]
    fn local_provider_sends_model_type() {
        let gateway = RecordingGateway::default();
        let edits = Rc::clone(&gateway.edits);
        let config = EditorConfig::with_settings(Settings {
            api_provider: crate::config::ApiProvider::Local,
            local_model_type: "rembg".into(),
            ..Settings::default()
        });
        let mut session = Session::new(config, Box::new(gateway));
        session.load("photo.png", encoded(&gradient(2, 2)));
        let _ = session.apply_ai(AiOperation::ChangeBackground, "new background");
        assert_eq!(edits.borrow()[0].model_type, "rembg");
    }

    #[test]
    fn chat_with_intent_runs_ai_edit() {
        let result = encoded(&solid(3, 3, [0, 0, 0, 255]));
        let gateway = RecordingGateway {
            image: Some(result.to_data_url()),
            ..RecordingGateway::default()
        };
        let edits = Rc::clone(&gateway.edits);
        let chats = Rc::clone(&gateway.chats);
        let mut session = Session::new(EditorConfig::default(), Box::new(gateway));
        session.load("photo.png", encoded(&gradient(3, 3)));

        let outcome = session
            .send_message("please remove the red background")
            .unwrap();
        assert!(matches!(outcome, ChatOutcome::Edited(ref r) if r.action == "removeObject"));
        assert_eq!(edits.borrow()[0].operation, AiOperation::RemoveObject);
        assert_eq!(edits.borrow()[0].prompt, "please remove the red background");
        assert!(chats.borrow().is_empty());
    }

    #[test]
    fn chat_without_intent_is_forwarded_with_context() {
        let gateway = RecordingGateway::default();
        let chats = Rc::clone(&gateway.chats);
        let mut session = Session::new(EditorConfig::default(), Box::new(gateway));
        session.load("photo.png", encoded(&gradient(3, 3)));
        let context = session.image().unwrap().base64().to_string();

        let outcome = session.send_message("what lens is this?").unwrap();
        assert_eq!(outcome, ChatOutcome::Reply("Chat message received".into()));
        assert_eq!(
            chats.borrow()[0].image_context.as_deref(),
            Some(context.as_str())
        );
    }

    #[test]
    fn chat_with_intent_but_no_image_is_forwarded() {
        let gateway = RecordingGateway::default();
        let chats = Rc::clone(&gateway.chats);
        let mut session = Session::new(EditorConfig::default(), Box::new(gateway));
        let outcome = session.send_message("remove the car").unwrap();
        assert!(matches!(outcome, ChatOutcome::Reply(_)));
        assert_eq!(chats.borrow()[0].image_context, None);
    }

    #[test]
    fn chat_failure_is_processing_error() {
        let mut session = Session::new(EditorConfig::default(), Box::new(DisabledGateway));
        let err = session.send_message("hello").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Processing);
    }

    #[test]
    fn lossy_working_format_still_records_edit() {
        let config = EditorConfig {
            working_format: ImageFormat::Jpeg,
            working_quality: DEFAULT_QUALITY,
            ..EditorConfig::default()
        };
        let mut session = Session::new(config, Box::new(DisabledGateway));
        session.load("photo.png", encoded(&gradient(8, 8)));
        session.apply_tool("sharpen", &FilterParams::new()).unwrap();
        assert_eq!(session.image().unwrap().format(), ImageFormat::Jpeg);
        assert_eq!(session.dimensions(), Some(Dimensions::new(8, 8)));
    }
}
