//! retouch-gateway: AI gateway implementations.
//!
//! [`HttpGateway`] forwards AI edits and chat to an HTTP backend,
//! [`LocalModelGateway`] stands in for a locally hosted model, and
//! [`gateway_from_settings`] picks between them (or
//! [`DisabledGateway`]) from the user's [`Settings`].

pub mod http;
pub mod local;

pub use http::{Capabilities, DEFAULT_TIMEOUT, HttpGateway};
pub use local::LocalModelGateway;

use retouch_pipeline::{AiGateway, ApiProvider, DisabledGateway, GatewayError, Settings};
use tracing::info;

/// Where the AI backend listens when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Which gateway [`gateway_from_settings`] chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
    /// [`HttpGateway`].
    Http,
    /// [`LocalModelGateway`].
    Local,
    /// [`DisabledGateway`].
    Disabled,
}

impl GatewayKind {
    /// The gateway `settings` call for.
    ///
    /// The selected provider wins when it is configured; otherwise the
    /// other provider is used if it is; with neither, AI is disabled.
    #[must_use]
    pub fn for_settings(settings: &Settings) -> Self {
        let has_key = !settings.api_key.trim().is_empty();
        let has_model = !settings.local_model_path.trim().is_empty();
        match (settings.api_provider, has_key, has_model) {
            (ApiProvider::Local, _, true) | (ApiProvider::OpenAi, false, true) => Self::Local,
            (_, true, _) => Self::Http,
            (_, false, false) => Self::Disabled,
        }
    }
}

/// Build the gateway the settings call for, talking to `base_url` when
/// it is the HTTP one.
///
/// # Errors
///
/// Returns [`GatewayError::Transport`] if the HTTP client cannot be built.
pub fn gateway_from_settings(
    settings: &Settings,
    base_url: &str,
) -> Result<Box<dyn AiGateway>, GatewayError> {
    let kind = GatewayKind::for_settings(settings);
    info!(
        ?kind,
        provider = settings.api_provider.as_str(),
        "AI gateway selected"
    );
    Ok(match kind {
        GatewayKind::Http => Box::new(HttpGateway::new(base_url, &settings.api_key)?),
        GatewayKind::Local => Box::new(LocalModelGateway::new(
            settings.local_model_path.clone(),
            settings.local_model_type.clone(),
        )),
        GatewayKind::Disabled => Box::new(DisabledGateway),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use retouch_pipeline::ChatRequest;

    fn settings(provider: ApiProvider, key: &str, path: &str) -> Settings {
        Settings {
            api_key: key.into(),
            api_provider: provider,
            local_model_path: path.into(),
            ..Settings::default()
        }
    }

    #[test]
    fn nothing_configured_disables_ai() {
        assert_eq!(
            GatewayKind::for_settings(&Settings::default()),
            GatewayKind::Disabled
        );
        assert_eq!(
            GatewayKind::for_settings(&settings(ApiProvider::Local, "", " ")),
            GatewayKind::Disabled
        );
    }

    #[test]
    fn selected_provider_wins_when_configured() {
        assert_eq!(
            GatewayKind::for_settings(&settings(ApiProvider::OpenAi, "sk", "/m")),
            GatewayKind::Http
        );
        assert_eq!(
            GatewayKind::for_settings(&settings(ApiProvider::Local, "sk", "/m")),
            GatewayKind::Local
        );
    }

    #[test]
    fn falls_back_to_the_configured_provider() {
        assert_eq!(
            GatewayKind::for_settings(&settings(ApiProvider::OpenAi, "", "/m")),
            GatewayKind::Local
        );
        assert_eq!(
            GatewayKind::for_settings(&settings(ApiProvider::Local, "sk", "")),
            GatewayKind::Http
        );
    }

    #[test]
    fn selection_agrees_with_ai_enabled() {
        for provider in [ApiProvider::OpenAi, ApiProvider::Local] {
            for key in ["", "sk"] {
                for path in ["", "/m"] {
                    let s = settings(provider, key, path);
                    let disabled = GatewayKind::for_settings(&s) == GatewayKind::Disabled;
                    assert_eq!(disabled, !s.ai_enabled());
                }
            }
        }
    }

    #[test]
    fn disabled_gateway_is_built_without_credentials() {
        let gateway = gateway_from_settings(&Settings::default(), DEFAULT_BASE_URL).unwrap();
        let err = gateway
            .chat(&ChatRequest {
                message: "hi".into(),
                image_context: None,
            })
            .unwrap_err();
        assert_eq!(err, GatewayError::MissingCredential);
    }

    #[test]
    fn local_gateway_is_built_from_settings() {
        let gateway =
            gateway_from_settings(&settings(ApiProvider::Local, "", "/m"), DEFAULT_BASE_URL)
                .unwrap();
        let reply = gateway
            .chat(&ChatRequest {
                message: "hi".into(),
                image_context: None,
            })
            .unwrap();
        assert_eq!(reply, local::CHAT_ACKNOWLEDGEMENT);
    }
}
