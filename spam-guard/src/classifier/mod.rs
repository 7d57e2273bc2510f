//! AI classification adapter
//!
//! Wraps one [`ClassifierBackend`] with the classification prompt, a
//! per-call timeout, tolerant reply decoding and the confidence gate.
//! Provider failures never escape: they become a negative verdict.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::llm::ClassifierBackend;
use crate::spam::{Message, SpamVerdict};

pub mod decode;
pub mod prompt;

pub use decode::{decode_verdict, extract_json_object, Decoded};
pub use prompt::build_prompt;

/// Reason reported when the backend fails or times out
pub const PROVIDER_ERROR_REASON: &str = "provider error";
/// Default minimum confidence for an AI spam verdict
pub const DEFAULT_MIN_CONFIDENCE: u8 = 70;

/// AI classifier bound to one backend
#[derive(Clone)]
pub struct AiClassifier {
    backend: Arc<dyn ClassifierBackend>,
    timeout: Duration,
    min_confidence: u8,
}

impl AiClassifier {
    pub fn new(backend: Arc<dyn ClassifierBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn from_config(backend: Arc<dyn ClassifierBackend>, config: &AiConfig) -> Self {
        Self::new(backend, config.timeout()).with_min_confidence(config.min_confidence)
    }

    pub fn with_min_confidence(mut self, min_confidence: u8) -> Self {
        self.min_confidence = min_confidence.min(SpamVerdict::MAX_CONFIDENCE);
        self
    }

    pub fn backend(&self) -> &dyn ClassifierBackend {
        self.backend.as_ref()
    }

    /// Classify one message. Single attempt, never fails.
    pub async fn classify(&self, message: &Message) -> SpamVerdict {
        let prompt = build_prompt(
            &message.channel_name,
            &message.sender_display_name,
            &message.text,
        );

        let raw = match tokio::time::timeout(self.timeout, self.backend.generate(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!("AI provider {} failed: {:#}", self.backend.provider(), e);
                return SpamVerdict::clean(PROVIDER_ERROR_REASON);
            }
            Err(_) => {
                warn!(
                    "AI provider {} timed out after {:?}",
                    self.backend.provider(),
                    self.timeout
                );
                return SpamVerdict::clean(PROVIDER_ERROR_REASON);
            }
        };

        let (verdict, raw_confidence) = match decode_verdict(&raw) {
            Decoded::Verdict {
                verdict,
                raw_confidence,
            } => (verdict, raw_confidence),
            Decoded::Failed(why) => {
                warn!("Unusable AI reply ({}): {:?}", why, raw);
                return Decoded::Failed(why).into_verdict();
            }
        };

        self.apply_threshold(verdict, raw_confidence)
    }

    /// Only confident spam verdicts stay positive. Compares the unrounded value.
    fn apply_threshold(&self, verdict: SpamVerdict, raw_confidence: f64) -> SpamVerdict {
        if verdict.is_spam && raw_confidence < f64::from(self.min_confidence) {
            debug!(
                "AI verdict below threshold ({} < {}), treating as not spam",
                raw_confidence, self.min_confidence
            );
            return SpamVerdict {
                is_spam: false,
                ..verdict
            };
        }
        verdict
    }
}
