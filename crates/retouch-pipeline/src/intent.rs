//! Keyword-based editing intent extraction for chat messages.
//!
//! Matching is a case-insensitive substring test against three keyword
//! groups, checked in a fixed order. The first group with a hit wins, so
//! "remove the background" is an object removal, not a background change.

use serde::{Deserialize, Serialize};

use crate::gateway::AiOperation;

/// What a chat message asks the AI to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentKind {
    /// Remove an object from the image.
    RemoveObject,
    /// Replace or change the background.
    Background,
    /// General enhancement.
    Enhance,
}

impl IntentKind {
    /// Keyword groups in match order.
    const RULES: [(Self, &'static [&'static str]); 3] = [
        (Self::RemoveObject, &["remove", "delete", "erase"]),
        (Self::Background, &["background", "replace bg", "new background"]),
        (Self::Enhance, &["enhance", "improve", "better"]),
    ];

    /// Tool id of the matching AI tool.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::RemoveObject => "remove-object",
            Self::Background => "background",
            Self::Enhance => "enhance",
        }
    }

    /// The gateway operation that carries out this intent.
    #[must_use]
    pub const fn operation(self) -> AiOperation {
        match self {
            Self::RemoveObject => AiOperation::RemoveObject,
            Self::Background => AiOperation::ChangeBackground,
            Self::Enhance => AiOperation::Enhance,
        }
    }
}

/// An editing intent recognized in a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// The recognized operation.
    pub kind: IntentKind,
    /// The full original message, forwarded as the AI prompt.
    pub prompt: String,
}

impl Intent {
    /// The gateway operation for this intent.
    #[must_use]
    pub const fn operation(&self) -> AiOperation {
        self.kind.operation()
    }
}

/// Recognize an editing intent in `message`, or `None` for plain chat.
#[must_use]
pub fn extract_intent(message: &str) -> Option<Intent> {
    let lower = message.to_lowercase();
    IntentKind::RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|&(kind, _)| Intent {
            kind,
            prompt: message.to_string(),
        })
}
