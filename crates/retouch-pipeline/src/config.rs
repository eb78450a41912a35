//! Editor configuration.
//!
//! [`Settings`] is the user's AI configuration, persisted by the shell as
//! JSON (the browser keeps it under [`SETTINGS_STORAGE_KEY`]).
//! [`EditorConfig`] bundles it with the encoding choices of the session
//! and is passed to [`Session::new`](crate::session::Session::new) once.

use serde::{Deserialize, Serialize};

use crate::codec::DEFAULT_QUALITY;
use crate::types::{EditorError, ImageFormat};

/// Key under which browser shells persist [`Settings`].
pub const SETTINGS_STORAGE_KEY: &str = "photoEditorSettings";

/// Which AI backend handles AI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    /// Hosted API, authenticated with [`Settings::api_key`].
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    /// A locally hosted model at [`Settings::local_model_path`].
    Local,
}

impl ApiProvider {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Local => "local",
        }
    }
}

/// User-level AI settings. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// API key for the hosted provider. Empty means none.
    pub api_key: String,
    /// Selected provider.
    pub api_provider: ApiProvider,
    /// Path or URL of a local model. Empty means none.
    pub local_model_path: String,
    /// Local model family (`general`, `gfpgan`, `realesrgan`, `rembg`,
    /// `onnx`, `custom`).
    pub local_model_type: String,
}

impl Settings {
    /// Default [`local_model_type`](Self::local_model_type).
    pub const DEFAULT_LOCAL_MODEL_TYPE: &'static str = "general";

    /// Parse persisted settings.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Processing`] if `json` is not a settings
    /// object.
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        serde_json::from_str(json)
            .map_err(|e| EditorError::Processing(format!("invalid settings: {e}")))
    }

    /// Serialize for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Processing`] if serialization fails.
    pub fn to_json(&self) -> Result<String, EditorError> {
        serde_json::to_string(self)
            .map_err(|e| EditorError::Processing(format!("invalid settings: {e}")))
    }

    /// AI features are available once an API key or a local model path is
    /// configured.
    #[must_use]
    pub fn ai_enabled(&self) -> bool {
        !self.api_key.trim().is_empty() || !self.local_model_path.trim().is_empty()
    }

    /// Value for the `modelType` field of AI requests.
    #[must_use]
    pub fn model_type(&self) -> &str {
        match self.api_provider {
            ApiProvider::OpenAi => ApiProvider::OpenAi.as_str(),
            ApiProvider::Local => &self.local_model_type,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_provider: ApiProvider::default(),
            local_model_path: String::new(),
            local_model_type: Self::DEFAULT_LOCAL_MODEL_TYPE.to_string(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// AI settings.
    pub settings: Settings,
    /// Encoding of history entries produced by edits. PNG keeps edits
    /// lossless.
    pub working_format: ImageFormat,
    /// Quality for lossy working formats, 1–100.
    pub working_quality: u8,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            working_format: ImageFormat::Png,
            working_quality: DEFAULT_QUALITY,
        }
    }
}

impl EditorConfig {
    /// Default configuration with the given settings.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }
}
