//! Spam types and data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// A chat message submitted for classification.
///
/// The text is expected to be trimmed and non-empty; the moderation layer
/// drops empty messages before they reach the classifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message body
    pub text: String,
    /// Display name of the sender
    pub sender_display_name: String,
    /// Human-readable name of the channel
    pub channel_name: String,
}

impl Message {
    pub fn new(
        text: impl Into<String>,
        sender_display_name: impl Into<String>,
        channel_name: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            sender_display_name: sender_display_name.into(),
            channel_name: channel_name.into(),
        }
    }
}

/// Outcome of a detection layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpamVerdict {
    /// Is this message spam
    pub is_spam: bool,
    /// Confidence, always within 0..=100
    pub confidence: u8,
    /// Human-readable explanation
    pub reason: String,
}

impl SpamVerdict {
    /// Highest confidence a verdict may carry
    pub const MAX_CONFIDENCE: u8 = 100;

    pub fn spam(confidence: u8, reason: impl Into<String>) -> Self {
        Self {
            is_spam: true,
            confidence: confidence.min(Self::MAX_CONFIDENCE),
            reason: reason.into(),
        }
    }

    pub fn not_spam(confidence: u8, reason: impl Into<String>) -> Self {
        Self {
            is_spam: false,
            confidence: confidence.min(Self::MAX_CONFIDENCE),
            reason: reason.into(),
        }
    }

    /// Negative verdict with zero confidence
    pub fn clean(reason: impl Into<String>) -> Self {
        Self::not_spam(0, reason)
    }
}

impl fmt::Display for SpamVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.is_spam { "spam" } else { "ham" };
        write!(f, "{} ({}%): {}", label, self.confidence, self.reason)
    }
}

/// Detection layer that produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionLayer {
    /// Operator-supplied keyword list
    Keyword,
    /// Built-in heuristic patterns
    Pattern,
    /// External AI classifier
    Ai,
    /// AI was wanted but the call budget was exhausted
    RateLimited,
    /// No layer reached a conclusion
    Default,
}

impl DetectionLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionLayer::Keyword => "keyword",
            DetectionLayer::Pattern => "pattern",
            DetectionLayer::Ai => "ai",
            DetectionLayer::RateLimited => "rate_limited",
            DetectionLayer::Default => "default",
        }
    }
}

impl fmt::Display for DetectionLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(SpamVerdict::spam(250, "x").confidence, 100);
        assert_eq!(SpamVerdict::not_spam(101, "x").confidence, 100);
    }

    #[test]
    fn test_verdict_serializes_camel_case() {
        let json = serde_json::to_value(SpamVerdict::spam(90, "invite")).unwrap();
        assert_eq!(json["isSpam"], true);
        assert_eq!(json["confidence"], 90);
        assert_eq!(json["reason"], "invite");
    }
}
