//! Heuristic pattern engine
//!
//! Scores group-invite and scam-pattern spam without any network call.
//! Rules are evaluated in order and the first one satisfied wins:
//!
//! 1. a high-confidence phrase (95)
//! 2. a group-invite link together with vocabulary terms (90 for two or
//!    more distinct terms, 75 for exactly one)
//! 3. three or more distinct vocabulary terms anywhere (80)
//!
//! Anything else is reported as clean with zero confidence.
//!
//! The phrase list, vocabulary and invite-link shapes form a data table
//! ([`PatternTable`]) that can be replaced from a TOML file.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::types::SpamVerdict;
use crate::error::{GuardError, Result};

pub const HIGH_CONFIDENCE_PHRASE: u8 = 95;
pub const INVITE_WITH_TERMS: u8 = 90;
pub const INVITE_WITH_TERM: u8 = 75;
pub const TERM_DENSITY: u8 = 80;

/// Distinct terms required by the density rule
const DENSITY_MIN_TERMS: usize = 3;
/// Terms quoted in a verdict reason
const REASON_MAX_TERMS: usize = 3;

pub const NO_PATTERNS_REASON: &str = "no spam patterns detected";

/// Raw, serializable pattern table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternTable {
    /// Phrases that are near-certain spam on their own
    #[serde(default)]
    pub high_confidence_phrases: Vec<String>,
    /// Regular expressions matching group-invite URLs
    #[serde(default)]
    pub invite_patterns: Vec<String>,
    /// Spam vocabulary grouped by category
    #[serde(default)]
    pub categories: Vec<VocabularyCategory>,
}

/// A named group of vocabulary terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyCategory {
    pub name: String,
    pub terms: Vec<String>,
}

impl VocabularyCategory {
    fn new(name: &str, terms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self {
            high_confidence_phrases: [
                "join our trading group",
                "join our crypto group",
                "join our forex group",
                "join our investment group",
                "guaranteed returns",
                "double your money",
                "risk-free investment",
                "risk free investment",
                "send me your wallet address",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            invite_patterns: vec![
                r"(?i)\b(?:https?://)?chat\.[a-z0-9-]+\.[a-z]{2,}/(?:invite/)?[a-z0-9_-]{10,}"
                    .to_string(),
                r"(?i)\b(?:https?://)?(?:t|telegram)\.me/(?:joinchat/|\+)[a-z0-9_-]{10,}"
                    .to_string(),
                r"(?i)\b(?:https?://)?(?:www\.)?discord(?:\.gg|(?:app)?\.com/invite)/[a-z0-9-]{2,}"
                    .to_string(),
            ],
            categories: vec![
                VocabularyCategory::new(
                    "financial_scam",
                    &[
                        "guaranteed profit",
                        "guaranteed income",
                        "passive income",
                        "financial freedom",
                        "investment plan",
                        "earn daily",
                        "daily profit",
                        "withdrawal proof",
                    ],
                ),
                VocabularyCategory::new(
                    "crypto",
                    &[
                        "crypto",
                        "bitcoin",
                        "btc",
                        "usdt",
                        "ethereum",
                        "binance",
                        "airdrop",
                        "signal",
                    ],
                ),
                VocabularyCategory::new(
                    "training_scam",
                    &[
                        "trading",
                        "forex",
                        "mentorship",
                        "binary options",
                        "account manager",
                        "free training",
                    ],
                ),
                VocabularyCategory::new(
                    "mlm",
                    &[
                        "network marketing",
                        "downline",
                        "be your own boss",
                        "work from home",
                        "side hustle",
                        "recruit",
                    ],
                ),
                VocabularyCategory::new(
                    "gambling",
                    &["casino", "betting", "jackpot", "lottery", "roulette", "free spins"],
                ),
                VocabularyCategory::new(
                    "adult",
                    &["onlyfans", "xxx", "nudes", "hot singles", "escort", "adult content"],
                ),
            ],
        }
    }
}

/// A vocabulary term found in a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermMatch<'a> {
    pub category: &'a str,
    pub term: &'a str,
}

/// Compiled, immutable rule set
#[derive(Debug)]
pub struct PatternRuleSet {
    phrases: Vec<String>,
    invite_links: Vec<Regex>,
    categories: Vec<VocabularyCategory>,
}

impl PatternRuleSet {
    /// Compile a table. Terms and phrases are lowercased, blanks dropped.
    pub fn from_table(table: PatternTable) -> Result<Self> {
        let invite_links = table
            .invite_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let phrases = normalize_terms(table.high_confidence_phrases);

        let categories = table
            .categories
            .into_iter()
            .map(|c| VocabularyCategory {
                name: c.name,
                terms: normalize_terms(c.terms),
            })
            .collect();

        Ok(Self {
            phrases,
            invite_links,
            categories,
        })
    }

    /// Load a replacement table from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GuardError::Config(format!(
                "Failed to read pattern file {}: {}",
                path.display(),
                e
            ))
        })?;

        let table: PatternTable = toml::from_str(&content).map_err(|e| {
            GuardError::Config(format!(
                "Failed to parse pattern file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_table(table)
    }

    /// The built-in English rule set
    pub fn builtin() -> Result<Self> {
        Self::from_table(PatternTable::default())
    }

    /// First high-confidence phrase contained in already-lowercased text
    pub fn high_confidence_phrase(&self, text_lower: &str) -> Option<&str> {
        self.phrases
            .iter()
            .find(|p| text_lower.contains(p.as_str()))
            .map(String::as_str)
    }

    /// Does the text contain a group-invite link
    pub fn has_invite_link(&self, text: &str) -> bool {
        self.invite_links.iter().any(|re| re.is_match(text))
    }

    /// Distinct vocabulary terms contained in already-lowercased text,
    /// in table order. Repeated occurrences count once.
    pub fn matched_terms(&self, text_lower: &str) -> Vec<TermMatch<'_>> {
        let mut matches: Vec<TermMatch<'_>> = Vec::new();

        for category in &self.categories {
            for term in &category.terms {
                if matches.iter().any(|m| m.term == term.as_str()) {
                    continue;
                }
                if text_lower.contains(term.as_str()) {
                    matches.push(TermMatch {
                        category: &category.name,
                        term,
                    });
                }
            }
        }

        matches
    }

    /// Number of vocabulary terms across all categories
    pub fn vocabulary_size(&self) -> usize {
        self.categories.iter().map(|c| c.terms.len()).sum()
    }
}

fn normalize_terms(terms: Vec<String>) -> Vec<String> {
    terms
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn quote_terms(matches: &[TermMatch<'_>]) -> String {
    matches
        .iter()
        .take(REASON_MAX_TERMS)
        .map(|m| m.term)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rule-based spam scorer
#[derive(Debug, Clone)]
pub struct PatternEngine {
    rules: Arc<PatternRuleSet>,
}

impl PatternEngine {
    pub fn new(rules: PatternRuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Engine over the built-in English rule set
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(PatternRuleSet::builtin()?))
    }

    pub fn rules(&self) -> &PatternRuleSet {
        &self.rules
    }

    /// Evaluate a message. Always yields a verdict.
    pub fn evaluate(&self, text: &str) -> SpamVerdict {
        let text_lower = text.to_lowercase();

        if let Some(phrase) = self.rules.high_confidence_phrase(&text_lower) {
            return SpamVerdict::spam(
                HIGH_CONFIDENCE_PHRASE,
                format!("high-confidence phrase: {}", phrase),
            );
        }

        let matches = self.rules.matched_terms(&text_lower);
        if !matches.is_empty() {
            debug!(
                "Vocabulary hits: {:?}",
                matches
                    .iter()
                    .map(|m| format!("{}/{}", m.category, m.term))
                    .collect::<Vec<_>>()
            );
        }

        if self.rules.has_invite_link(text) {
            match matches.len() {
                0 => debug!("Invite link without spam vocabulary"),
                1 => {
                    return SpamVerdict::spam(
                        INVITE_WITH_TERM,
                        format!("group invite link with spam keyword: {}", matches[0].term),
                    );
                }
                _ => {
                    return SpamVerdict::spam(
                        INVITE_WITH_TERMS,
                        format!(
                            "group invite link with spam keywords: {}",
                            quote_terms(&matches)
                        ),
                    );
                }
            }
        }

        if matches.len() >= DENSITY_MIN_TERMS {
            return SpamVerdict::spam(
                TERM_DENSITY,
                format!("multiple spam keywords: {}", quote_terms(&matches)),
            );
        }

        SpamVerdict::clean(NO_PATTERNS_REASON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PatternEngine {
        PatternEngine::builtin().unwrap()
    }

    #[test]
    fn test_builtin_table_compiles() {
        let rules = PatternRuleSet::from_table(PatternTable::default()).unwrap();
        assert_eq!(rules.invite_links.len(), 3);
        assert!(rules.high_confidence_phrase("guaranteed returns").is_some());
        assert!(rules.vocabulary_size() > 0);
    }

    #[test]
    fn test_high_confidence_phrase() {
        let verdict = engine().evaluate("This plan will DOUBLE YOUR MONEY in a week");
        assert!(verdict.is_spam);
        assert_eq!(verdict.confidence, 95);
        assert_eq!(verdict.reason, "high-confidence phrase: double your money");
    }

    #[test]
    fn test_phrase_beats_invite_rule() {
        let verdict = engine().evaluate(
            "Guaranteed returns! https://chat.whatsapp.com/AbCdEfGhIj1234567890 crypto signal",
        );
        assert_eq!(verdict.confidence, 95);
    }

    #[test]
    fn test_invite_link_with_multiple_terms() {
        let verdict = engine().evaluate(
            "Join my trading group https://chat.platform.com/AbCdEfGhIj1234567890 crypto signal guaranteed profit",
        );
        assert!(verdict.is_spam);
        assert_eq!(verdict.confidence, 90);
        assert_eq!(
            verdict.reason,
            "group invite link with spam keywords: guaranteed profit, crypto, signal"
        );
    }

    #[test]
    fn test_invite_link_with_single_term() {
        let verdict =
            engine().evaluate("forex tips here https://chat.whatsapp.com/KxYz0123456789abcdEF");
        assert!(verdict.is_spam);
        assert_eq!(verdict.confidence, 75);
        assert_eq!(verdict.reason, "group invite link with spam keyword: forex");
    }

    #[test]
    fn test_invite_link_alone_is_clean() {
        let verdict = engine().evaluate(
            "Here is the link for the hiking club https://chat.whatsapp.com/KxYz0123456789abcdEF",
        );
        assert!(!verdict.is_spam);
        assert_eq!(verdict.confidence, 0);
    }

    #[test]
    fn test_repeated_term_counts_once() {
        let verdict = engine()
            .evaluate("crypto crypto crypto https://t.me/joinchat/AAAAAExampleCode");
        assert_eq!(verdict.confidence, 75);
    }

    #[test]
    fn test_term_density_without_link() {
        let verdict = engine().evaluate("Casino jackpot and free spins waiting for you");
        assert!(verdict.is_spam);
        assert_eq!(verdict.confidence, 80);
        assert_eq!(
            verdict.reason,
            "multiple spam keywords: casino, jackpot, free spins"
        );
    }

    #[test]
    fn test_two_terms_without_link_is_clean() {
        let verdict = engine().evaluate("bitcoin and ethereum prices fell today");
        assert!(!verdict.is_spam);
        assert_eq!(verdict.reason, NO_PATTERNS_REASON);
    }

    #[test]
    fn test_single_term_is_clean() {
        let verdict = engine().evaluate("Check out this trading opportunity");
        assert!(!verdict.is_spam);
        assert_eq!(verdict.confidence, 0);
    }

    #[test]
    fn test_ordinary_chat_is_clean() {
        let verdict = engine().evaluate("Hey, did you see the game last night?");
        assert_eq!(verdict, SpamVerdict::clean(NO_PATTERNS_REASON));
    }

    #[test]
    fn test_invite_shapes() {
        let rules = PatternRuleSet::builtin().unwrap();
        assert!(rules.has_invite_link("https://chat.whatsapp.com/AbCdEfGhIj1234567890"));
        assert!(rules.has_invite_link("t.me/+AbCdEfGhIjKl"));
        assert!(rules.has_invite_link("https://discord.gg/abc123"));
        assert!(!rules.has_invite_link("https://example.com/chat"));
        assert!(!rules.has_invite_link("chat.whatsapp.com/short"));
    }

    #[test]
    fn test_custom_table() {
        let table: PatternTable = toml::from_str(
            r#"
            high_confidence_phrases = ["Gana Dinero Rapido"]
            invite_patterns = []

            [[categories]]
            name = "es"
            terms = ["inversion", "cripto", "ganancias"]
            "#,
        )
        .unwrap();
        let engine = PatternEngine::new(PatternRuleSet::from_table(table).unwrap());

        assert_eq!(engine.evaluate("gana dinero rapido hoy").confidence, 95);
        assert_eq!(engine.evaluate("inversion cripto ganancias").confidence, 80);
        assert_eq!(engine.rules().vocabulary_size(), 3);
    }

    #[test]
    fn test_invalid_invite_pattern_is_rejected() {
        let table = PatternTable {
            high_confidence_phrases: vec![],
            invite_patterns: vec!["(unclosed".to_string()],
            categories: vec![],
        };
        assert!(matches!(
            PatternRuleSet::from_table(table),
            Err(GuardError::Pattern(_))
        ));
    }
}
