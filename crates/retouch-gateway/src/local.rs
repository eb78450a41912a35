//! Local-model provider.
//!
//! No inference runs here yet: edits come back unchanged and chat is
//! acknowledged, so the rest of the editor can be exercised against a
//! configured local model path.

use retouch_pipeline::{AiEditRequest, AiGateway, ChatRequest, GatewayError};
use tracing::info;

/// Reply sent for every chat message.
pub const CHAT_ACKNOWLEDGEMENT: &str = "Local model endpoint stub";

/// A locally hosted model identified by path and family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalModelGateway {
    model_path: String,
    model_type: String,
}

impl LocalModelGateway {
    /// Gateway for the model at `model_path` of family `model_type`.
    #[must_use]
    pub fn new(model_path: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            model_type: model_type.into(),
        }
    }
}

impl AiGateway for LocalModelGateway {
    fn process(&self, request: &AiEditRequest) -> Result<String, GatewayError> {
        if self.model_path.trim().is_empty() {
            return Err(GatewayError::MissingCredential);
        }
        info!(
            model_type = %self.model_type,
            model_path = %self.model_path,
            operation = %request.operation,
            "processing with local model"
        );
        let payload = request
            .image_base64
            .split_once("base64,")
            .map_or(request.image_base64.as_str(), |(_, payload)| payload);
        Ok(payload.to_string())
    }

    fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        info!(
            model_type = %self.model_type,
            len = request.message.len(),
            "local chat"
        );
        Ok(CHAT_ACKNOWLEDGEMENT.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use retouch_pipeline::AiOperation;

    fn request(image: &str) -> AiEditRequest {
        AiEditRequest {
            image_base64: image.into(),
            prompt: "remove the background".into(),
            operation: AiOperation::ChangeBackground,
            model_type: "rembg".into(),
        }
    }

    #[test]
    fn returns_image_unchanged() {
        let gateway = LocalModelGateway::new("/models/rembg.onnx", "rembg");
        let out = gateway.process(&request("iVBORw0KGgo=")).unwrap();
        assert_eq!(out, "iVBORw0KGgo=");
    }

    #[test]
    fn strips_data_url_header() {
        let gateway = LocalModelGateway::new("/models/rembg.onnx", "rembg");
        let out = gateway
            .process(&request("data:image/png;base64,iVBORw0KGgo="))
            .unwrap();
        assert_eq!(out, "iVBORw0KGgo=");
    }

    #[test]
    fn missing_model_path_is_missing_credential() {
        let gateway = LocalModelGateway::new("", "general");
        assert_eq!(
            gateway.process(&request("AAAA")),
            Err(GatewayError::MissingCredential)
        );
    }

    #[test]
    fn chat_is_acknowledged() {
        let gateway = LocalModelGateway::new("/m", "general");
        let reply = gateway
            .chat(&ChatRequest {
                message: "hello".into(),
                image_context: None,
            })
            .unwrap();
        assert_eq!(reply, CHAT_ACKNOWLEDGEMENT);
    }
}
