//! Candidate acceptance policy.
//!
//! A decoded string is only ever surfaced to the host if it passes this
//! filter. Rejection is a normal outcome, not an error: the orchestrator
//! counts it and moves to the next stage.

use crate::pattern::RAW_BITS_PREFIX;

/// Length-range and character-set policy for accepted codes.
///
/// Fixed at startup, read-only thereafter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidationPolicy {
    /// Minimum accepted code length, inclusive (default: 4).
    pub min_length: usize,
    /// Maximum accepted code length, inclusive (default: 64).
    pub max_length: usize,
    /// Non-alphanumeric ASCII characters accepted in addition to
    /// `[0-9A-Za-z]` (default: `"_-./+:"`).
    pub allowed_symbols: String,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_length: 4,
            max_length: 64,
            allowed_symbols: "_-./+:".to_string(),
        }
    }
}

impl ValidationPolicy {
    /// Whether `code` is accepted: within the length range, every character
    /// allowed, and not the heuristic's raw-bits diagnostic.
    ///
    /// The raw-bits diagnostic exists for observability only and is rejected
    /// outright, regardless of how short a tiny frame made it.
    #[must_use]
    pub fn accepts(&self, code: &str) -> bool {
        if code.starts_with(RAW_BITS_PREFIX) {
            return false;
        }
        let len = code.chars().count();
        if len < self.min_length || len > self.max_length {
            return false;
        }
        code.chars()
            .all(|c| c.is_ascii_alphanumeric() || self.allowed_symbols.contains(c))
    }
}
