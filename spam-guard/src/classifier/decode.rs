//! Tolerant decoding of AI replies
//!
//! Models often wrap their JSON in prose or markdown fences. The decoder
//! takes the first balanced `{...}` region, parses it, and checks field
//! shapes. It never panics and never returns an error type: every failure
//! becomes [`Decoded::Failed`].

use serde_json::Value;

use crate::spam::SpamVerdict;

/// Reason reported when a reply cannot be decoded
pub const PARSE_ERROR_REASON: &str = "parse error";
/// Reason used when the reply omits one
pub const MISSING_REASON: &str = "no reason given";

/// Result of decoding one reply
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Reply carried a well-formed verdict (not yet threshold-gated).
    ///
    /// `raw_confidence` is the reported value before rounding; gates
    /// compare against it so 69.6 never passes a 70 threshold.
    Verdict {
        verdict: SpamVerdict,
        raw_confidence: f64,
    },
    /// Reply was unusable
    Failed(String),
}

impl Decoded {
    /// Collapse into a verdict, mapping failures to the parse-error verdict
    pub fn into_verdict(self) -> SpamVerdict {
        match self {
            Decoded::Verdict { verdict, .. } => verdict,
            Decoded::Failed(_) => SpamVerdict::clean(PARSE_ERROR_REASON),
        }
    }
}

/// Locate the first balanced JSON object in `raw`.
///
/// Braces inside string literals (including escaped quotes) are ignored.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Decode an AI reply into a verdict
pub fn decode_verdict(raw: &str) -> Decoded {
    let Some(object) = extract_json_object(raw) else {
        return Decoded::Failed("no JSON object in reply".to_string());
    };

    let value: Value = match serde_json::from_str(object) {
        Ok(value) => value,
        Err(e) => return Decoded::Failed(format!("invalid JSON: {}", e)),
    };

    let Some(is_spam) = value.get("isSpam").and_then(Value::as_bool) else {
        return Decoded::Failed("isSpam missing or not a boolean".to_string());
    };

    let Some(confidence) = value.get("confidence").and_then(Value::as_f64) else {
        return Decoded::Failed("confidence missing or not a number".to_string());
    };
    if !confidence.is_finite() {
        return Decoded::Failed("confidence is not finite".to_string());
    }

    let reason = match value.get("reason") {
        None | Some(Value::Null) => MISSING_REASON.to_string(),
        Some(Value::String(reason)) if reason.trim().is_empty() => MISSING_REASON.to_string(),
        Some(Value::String(reason)) => reason.trim().to_string(),
        Some(_) => return Decoded::Failed("reason is not a string".to_string()),
    };

    Decoded::Verdict {
        verdict: SpamVerdict {
            is_spam,
            confidence: confidence.round().clamp(0.0, 100.0) as u8,
            reason,
        },
        raw_confidence: confidence,
    }
}
