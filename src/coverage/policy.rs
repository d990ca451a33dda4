//! Line consumption policies.
//!
//! Deciding whether a source line was "used" by a generated record is a heuristic.
//! Policies implement [CoveragePolicy] so that the tracker does not depend on one of them.

/// Decides if a source `line` is consumed by a record with natural `key` and `answer` text.
pub trait CoveragePolicy {
    fn consumes(&self, line: &str, key: &str, answer: &str) -> bool;
}

/// A line is consumed if it contains the key (case-insensitive),
/// or if one of its whitespace-separated tokens of at least `min_token_len` characters
/// appears in the answer (case-insensitive).
///
/// Coincidental overlap of common tokens over-marks lines: this is a best-effort signal.
#[derive(Debug, Clone)]
pub struct TokenOverlap {
    min_token_len: usize,
}

impl TokenOverlap {
    pub fn with_min_token_len(min_token_len: usize) -> Self {
        Self { min_token_len }
    }

    pub fn min_token_len(&self) -> usize {
        self.min_token_len
    }
}

impl Default for TokenOverlap {
    /// tokens must be longer than 3 characters
    fn default() -> Self {
        Self { min_token_len: 4 }
    }
}

impl CoveragePolicy for TokenOverlap {
    fn consumes(&self, line: &str, key: &str, answer: &str) -> bool {
        let line = line.to_lowercase();
        let key = key.trim().to_lowercase();
        if !key.is_empty() && line.contains(&key) {
            return true;
        }

        let answer = answer.to_lowercase();
        line.split_whitespace()
            .filter(|token| token.chars().count() >= self.min_token_len)
            .any(|token| answer.contains(token))
    }
}

/// Only lines containing the key are consumed.
#[derive(Debug, Clone, Default)]
pub struct KeyOnly;

impl CoveragePolicy for KeyOnly {
    fn consumes(&self, line: &str, key: &str, _answer: &str) -> bool {
        let key = key.trim().to_lowercase();
        !key.is_empty() && line.to_lowercase().contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_match_is_case_insensitive() {
        let p = TokenOverlap::default();
        assert!(p.consumes("AHË: yours", "ahë", ""));
        assert!(!p.consumes("nothing here", "ahë", ""));
    }

    #[test]
    fn token_overlap() {
        let p = TokenOverlap::default();
        // "approach" (8 chars) appears in answer
        assert!(p.consumes("to approach slowly", "ahete", "It means to Approach."));
        // only short tokens in common
        assert!(!p.consumes("to go by", "ahete", "to go by"));
        let strict = TokenOverlap::with_min_token_len(10);
        assert!(!strict.consumes("to approach", "ahete", "to approach"));
    }

    #[test]
    fn key_only() {
        assert!(KeyOnly.consumes("ahete kõi", "ahete", ""));
        assert!(!KeyOnly.consumes("to approach", "ahete", "to approach"));
    }
}
