//! Backend selection
//!
//! The active backend is chosen once at startup: the preferred provider if
//! its credential is present, otherwise the first provider with a
//! credential (Gemini, then OpenAI), otherwise none.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use super::gemini::GeminiBackend;
use super::openai::OpenAiBackend;
use super::{ClassifierBackend, ProviderKind};
use crate::config::AiConfig;

pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

/// Order in which providers are tried in `auto` mode
const AUTO_ORDER: [ProviderKind; 2] = [ProviderKind::Gemini, ProviderKind::OpenAi];

/// Operator preference for the AI backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderPreference {
    #[default]
    Auto,
    Gemini,
    OpenAi,
    Disabled,
}

impl fmt::Display for ProviderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderPreference::Auto => "auto",
            ProviderPreference::Gemini => "gemini",
            ProviderPreference::OpenAi => "openai",
            ProviderPreference::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// Provider credentials. Only presence matters; formats are not checked.
#[derive(Clone, Default)]
pub struct Credentials {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "***"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    /// Read provider keys from the environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read provider keys through an arbitrary lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            gemini_api_key: non_blank(lookup(GEMINI_KEY_VAR)),
            openai_api_key: non_blank(lookup(OPENAI_KEY_VAR)),
        }
    }

    pub fn key_for(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Mock => None,
        }
    }

    pub fn has(&self, kind: ProviderKind) -> bool {
        self.key_for(kind).is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Decide which provider is active
pub fn select_provider(
    preference: ProviderPreference,
    credentials: &Credentials,
) -> Option<ProviderKind> {
    let preferred = match preference {
        ProviderPreference::Disabled => return None,
        ProviderPreference::Auto => None,
        ProviderPreference::Gemini => Some(ProviderKind::Gemini),
        ProviderPreference::OpenAi => Some(ProviderKind::OpenAi),
    };

    if let Some(kind) = preferred {
        if credentials.has(kind) {
            return Some(kind);
        }
        warn!(
            "Preferred AI provider {} has no credential, falling back",
            kind
        );
    }

    AUTO_ORDER.into_iter().find(|kind| credentials.has(*kind))
}

/// Build the active backend, if any
pub fn build_backend(
    config: &AiConfig,
    credentials: &Credentials,
) -> Option<Arc<dyn ClassifierBackend>> {
    let Some(kind) = select_provider(config.provider, credentials) else {
        if config.provider == ProviderPreference::Disabled {
            info!("AI classification disabled by configuration");
        } else {
            info!("No AI credentials found, running in rule-based mode");
        }
        return None;
    };

    let key = credentials.key_for(kind)?.to_string();

    let backend: Arc<dyn ClassifierBackend> = match kind {
        ProviderKind::Gemini => {
            let mut backend = GeminiBackend::new(key, config.gemini_model.clone());
            if let Some(url) = &config.gemini_base_url {
                backend = backend.with_base_url(url.clone());
            }
            Arc::new(backend)
        }
        ProviderKind::OpenAi => {
            let mut backend = OpenAiBackend::new(key, config.openai_model.clone());
            if let Some(url) = &config.openai_base_url {
                backend = backend.with_base_url(url.clone());
            }
            Arc::new(backend)
        }
        ProviderKind::Mock => return None,
    };

    info!(
        "🤖 AI provider: {} (model {})",
        backend.provider(),
        backend.model_name()
    );
    Some(backend)
}
