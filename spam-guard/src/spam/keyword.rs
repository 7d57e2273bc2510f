//! Operator keyword blocklist
//!
//! The first configured keyword found in the message (case-insensitive
//! substring) decides the verdict at full confidence.

use super::types::SpamVerdict;

/// Exact-substring matcher over the operator's keyword list
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    /// Build a matcher, lowercasing terms and dropping blank entries.
    /// List order is match priority.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self { keywords }
    }

    /// Configured terms in priority order
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Check a message against the list
    pub fn check(&self, text: &str) -> Option<SpamVerdict> {
        if self.keywords.is_empty() {
            return None;
        }

        let text_lower = text.to_lowercase();

        self.keywords
            .iter()
            .find(|keyword| text_lower.contains(keyword.as_str()))
            .map(|keyword| {
                SpamVerdict::spam(
                    SpamVerdict::MAX_CONFIDENCE,
                    format!("matched custom keyword: {}", keyword),
                )
            })
    }
}
