//! Mock backend for testing
//!
//! Replies with scripted text (or a scripted failure) and records the
//! prompts it was given.

use super::{ClassifierBackend, ProviderKind};
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Fail(String),
}

/// Mock backend implementation for testing
pub struct MockBackend {
    model_name: String,
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockBackend {
    fn with_script(script: Script) -> Self {
        Self {
            model_name: "mock-classifier-v1".to_string(),
            script,
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Always reply with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_script(Script::Reply(text.into()))
    }

    /// Always fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_script(Script::Fail(message.into()))
    }

    /// Reply with a well-formed verdict object
    pub fn verdict(is_spam: bool, confidence: u8, reason: &str) -> Self {
        let body = serde_json::json!({
            "isSpam": is_spam,
            "confidence": confidence,
            "reason": reason,
        });
        Self::replying(body.to_string())
    }

    /// Wait before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of prompts received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most recent prompt received
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .ok()
            .and_then(|prompt| prompt.clone())
    }
}

#[async_trait::async_trait]
impl ClassifierBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        debug!("MockBackend: prompt of {} chars", prompt.len());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail(message) => anyhow::bail!("{}", message),
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn provider(&self) -> ProviderKind {
        ProviderKind::Mock
    }
}
