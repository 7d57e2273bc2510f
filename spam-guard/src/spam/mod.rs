//! Offline spam detection layers
//!
//! Provides the operator keyword blocklist and the heuristic pattern engine.

pub mod keyword;
pub mod patterns;
pub mod types;

pub use keyword::KeywordMatcher;
pub use patterns::{PatternEngine, PatternRuleSet, PatternTable};
pub use types::*;
