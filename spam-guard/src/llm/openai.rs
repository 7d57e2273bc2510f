//! OpenAI-compatible chat completions backend
//!
//! Works with any server exposing `POST {base_url}/chat/completions`.

use super::{ClassifierBackend, ProviderKind};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI backend
pub struct OpenAiBackend {
    model_name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model_name: String) -> Self {
        Self {
            model_name,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Chat completions request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait::async_trait]
impl ClassifierBackend for OpenAiBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model_name,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.1,
        };

        debug!(
            "OpenAI: Sending request to {}/chat/completions with model {}",
            self.base_url, self.model_name
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("OpenAI: Request failed with status {}: {}", status, error_text);
            anyhow::bail!("OpenAI request failed: {} - {}", status, error_text);
        }

        let reply: ChatResponse = response.json().await?;
        let choice = reply
            .choices
            .into_iter()
            .next()
            .context("OpenAI response contained no choices")?;

        debug!("OpenAI: Received response, finish_reason={:?}", choice.finish_reason);

        choice
            .message
            .content
            .context("OpenAI response contained no message content")
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }
}
