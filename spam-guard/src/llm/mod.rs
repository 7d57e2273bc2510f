//! LLM backend abstraction
//!
//! Every AI provider is reduced to one capability: turn a prompt into raw
//! reply text. Prompt construction and reply decoding live in
//! [`crate::classifier`] and never depend on which backend is active.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod gemini;
pub mod mock;
pub mod openai;
pub mod provider;

pub use provider::{build_backend, select_provider, Credentials, ProviderPreference};

/// Concrete provider behind a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Mock,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Mock => "mock",
        };
        f.write_str(name)
    }
}

/// Text classifier backend trait
#[async_trait::async_trait]
pub trait ClassifierBackend: Send + Sync {
    /// Send one prompt and return the raw reply text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get model name
    fn model_name(&self) -> &str;

    /// Get provider kind
    fn provider(&self) -> ProviderKind;
}
