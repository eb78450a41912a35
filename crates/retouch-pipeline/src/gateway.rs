//! The AI gateway seam: request/response types and the [`AiGateway`] trait.
//!
//! The session never talks to the network itself. It hands an
//! [`AiEditRequest`] or [`ChatRequest`] to whatever gateway it was built
//! with; `retouch-gateway` provides the HTTP and local-model
//! implementations. Wire types serialize to the camelCase JSON bodies of
//! `POST /api/process-ai` and `POST /api/chat`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::EditorError;

/// AI editing operations the gateway understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AiOperation {
    /// Remove an object described by the prompt.
    RemoveObject,
    /// Replace the background.
    ChangeBackground,
    /// General enhancement.
    Enhance,
}

impl AiOperation {
    /// Every operation.
    pub const ALL: [Self; 3] = [Self::RemoveObject, Self::ChangeBackground, Self::Enhance];

    /// Wire name, as sent in the `operation` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RemoveObject => "removeObject",
            Self::ChangeBackground => "changeBackground",
            Self::Enhance => "enhance",
        }
    }

    /// Resolve a wire name or an AI tool id (`remove-object`,
    /// `background`).
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "removeObject" | "remove-object" => Some(Self::RemoveObject),
            "changeBackground" | "background" => Some(Self::ChangeBackground),
            "enhance" => Some(Self::Enhance),
            _ => None,
        }
    }
}

impl fmt::Display for AiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/process-ai`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiEditRequest {
    /// Current image, base64 without a `data:` header.
    pub image_base64: String,
    /// Free-text instruction.
    pub prompt: String,
    /// Requested operation.
    pub operation: AiOperation,
    /// Provider or local model type the backend should use.
    pub model_type: String,
}

/// Success body of `POST /api/process-ai`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiEditResponse {
    /// Edited image, base64 (a `data:` URL is tolerated).
    pub image: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Current image as base64, when one is loaded.
    pub image_context: Option<String>,
}

/// Success body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply.
    pub message: String,
}

/// Error body returned by the gateway on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

/// Errors from an [`AiGateway`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum GatewayError {
    /// No API key or local model is configured.
    #[error("AI features are disabled: configure an API key or a local model")]
    MissingCredential,

    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("AI gateway unreachable: {0}")]
    Transport(String),

    /// The gateway answered with a non-success status.
    #[error("AI gateway returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The body's `error` field, or the status reason.
        message: String,
    },

    /// The response body was not what the endpoint promises.
    #[error("invalid AI gateway response: {0}")]
    InvalidResponse(String),
}

impl From<GatewayError> for EditorError {
    fn from(e: GatewayError) -> Self {
        Self::Processing(e.to_string())
    }
}

/// An external AI service.
///
/// Calls are blocking and are not retried; any failure ends the request.
pub trait AiGateway {
    /// Run an AI edit and return the edited image as base64.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the call cannot be completed.
    fn process(&self, request: &AiEditRequest) -> Result<String, GatewayError>;

    /// Send a chat message and return the assistant's reply.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the call cannot be completed.
    fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError>;
}

impl<G: AiGateway + ?Sized> AiGateway for Box<G> {
    fn process(&self, request: &AiEditRequest) -> Result<String, GatewayError> {
        (**self).process(request)
    }

    fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        (**self).chat(request)
    }
}

/// Gateway used when no credential is configured. Every call fails with
/// [`GatewayError::MissingCredential`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

impl AiGateway for DisabledGateway {
    fn process(&self, _request: &AiEditRequest) -> Result<String, GatewayError> {
        Err(GatewayError::MissingCredential)
    }

    fn chat(&self, _request: &ChatRequest) -> Result<String, GatewayError> {
        Err(GatewayError::MissingCredential)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn edit_request_uses_camel_case_wire_names() {
        let request = AiEditRequest {
            image_base64: "AAAA".into(),
            prompt: "remove the lamp".into(),
            operation: AiOperation::ChangeBackground,
            model_type: "openai".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "imageBase64": "AAAA",
                "prompt": "remove the lamp",
                "operation": "changeBackground",
                "modelType": "openai",
            })
        );
    }

    #[test]
    fn chat_request_serializes_missing_context_as_null() {
        let request = ChatRequest {
            message: "hi".into(),
            image_context: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"message":"hi","imageContext":null}"#);
    }

    #[test]
    fn operation_ids() {
        for op in AiOperation::ALL {
            assert_eq!(AiOperation::from_id(op.as_str()), Some(op));
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{op}\""));
        }
        assert_eq!(
            AiOperation::from_id("remove-object"),
            Some(AiOperation::RemoveObject)
        );
        assert_eq!(
            AiOperation::from_id("background"),
            Some(AiOperation::ChangeBackground)
        );
        assert_eq!(AiOperation::from_id("sharpen"), None);
    }

    #[test]
    fn disabled_gateway_refuses_everything() {
        let gateway = DisabledGateway;
        let chat = ChatRequest {
            message: "hello".into(),
            image_context: None,
        };
        assert_eq!(gateway.chat(&chat), Err(GatewayError::MissingCredential));
    }

    #[test]
    fn gateway_errors_become_processing_errors() {
        let err: EditorError = GatewayError::Status {
            status: 401,
            message: "API key required for AI operations".into(),
        }
        .into();
        assert!(matches!(err, EditorError::Processing(ref m) if m.contains("401")));
        assert_eq!(err.kind(), crate::types::ErrorKind::Processing);
    }

    #[test]
    fn boxed_gateway_delegates() {
        let gateway: Box<dyn AiGateway> = Box::new(DisabledGateway);
        let request = AiEditRequest {
            image_base64: String::new(),
            prompt: String::new(),
            operation: AiOperation::Enhance,
            model_type: String::new(),
        };
        assert_eq!(
            gateway.process(&request),
            Err(GatewayError::MissingCredential)
        );
    }
}
