//! Natural keys of generated records.
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use super::Conversation;
use crate::error::Error;

lazy_static! {
    static ref QUOTED: Regex = Regex::new(r"'([^']+)'").unwrap();
}

/// All single-quoted words of `text`, in order.
pub fn quoted_words(text: &str) -> Vec<&str> {
    QUOTED
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// First single-quoted word of `text`.
pub fn quoted_word(text: &str) -> Option<&str> {
    QUOTED
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// How records are grouped when merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyKind {
    /// the first quoted word of the question (`What does 'ahë' mean?` -> `ahë`)
    #[default]
    QuotedWord,
    /// the whole question, trimmed
    Question,
}

impl KeyKind {
    pub fn extract(&self, conversation: &Conversation) -> Option<String> {
        let question = conversation.question()?;
        match self {
            KeyKind::QuotedWord => quoted_word(question).map(String::from),
            KeyKind::Question => {
                let q = question.trim();
                if q.is_empty() {
                    None
                } else {
                    Some(q.to_string())
                }
            }
        }
    }
}

impl FromStr for KeyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quoted-word" | "word" => Ok(KeyKind::QuotedWord),
            "question" => Ok(KeyKind::Question),
            other => Err(Error::InvalidConfig(format!(
                "unknown key kind {:?} (expected quoted-word or question)",
                other
            ))),
        }
    }
}
