//! Records produced by the generator, and response parsing.
use serde_json::Value;

use super::key::quoted_words;
use super::{Conversation, WordEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Entry(WordEntry),
}

/// A validated record obtained from one unit. Never mutated once accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRecord {
    question: String,
    answer: Answer,
    language: String,
}

impl GeneratedRecord {
    pub fn from_entry(entry: WordEntry, language: &str) -> Self {
        Self {
            question: entry.question(language),
            answer: Answer::Entry(entry),
            language: language.to_string(),
        }
    }

    /// Build a record from an already formed conversation.
    /// Fails if the conversation has no question or answer.
    pub fn from_conversation(conversation: &Conversation, language: &str) -> Result<Self, String> {
        let question = conversation
            .question()
            .ok_or_else(|| "conversation has no user message".to_string())?;
        let answer = conversation
            .answer()
            .ok_or_else(|| "conversation has no assistant message".to_string())?;
        Ok(Self {
            question: question.to_string(),
            answer: Answer::Text(answer.to_string()),
            language: language.to_string(),
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &Answer {
        &self.answer
    }

    /// Structured form of the answer, if it has one.
    pub fn entry(&self) -> Option<&WordEntry> {
        match &self.answer {
            Answer::Entry(entry) => Some(entry),
            Answer::Text(_) => None,
        }
    }

    /// The natural key of the record: the quoted word of its question.
    pub fn key(&self) -> Option<&str> {
        match quoted_words(&self.question).as_slice() {
            [key] => Some(*key),
            _ => None,
        }
    }

    /// Answer as natural language.
    pub fn answer_text(&self) -> String {
        match &self.answer {
            Answer::Text(text) => text.clone(),
            Answer::Entry(entry) => entry.answer(&self.language),
        }
    }

    /// A record is valid if its question has exactly one quoted key,
    /// its answer is not empty and, when structured, its required fields are filled.
    pub fn validate(&self) -> Result<(), String> {
        let keys = quoted_words(&self.question);
        if keys.len() != 1 {
            return Err(format!(
                "question {:?} should reference exactly one quoted word, found {}",
                self.question,
                keys.len()
            ));
        }

        match &self.answer {
            Answer::Text(text) if text.trim().is_empty() => Err("answer is empty".to_string()),
            Answer::Text(_) => Ok(()),
            Answer::Entry(entry) => entry.validate(),
        }
    }

    pub fn to_conversation(&self) -> Conversation {
        Conversation::new(self.question.clone(), self.answer_text())
    }
}

/// Why a generator response could not be turned into records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    /// not JSON at all
    Malformed(String),
    /// JSON, but not the expected structure or failing validation
    Invalid(String),
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseError::Malformed(e) => write!(f, "malformed JSON: {}", e),
            ResponseError::Invalid(e) => write!(f, "invalid content: {}", e),
        }
    }
}

/// Strip code fences and control characters that models tend to emit around/inside JSON.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(stripped) = text.strip_prefix("```") {
        // drop the info string (```json) up to the first newline
        text = match stripped.find('\n') {
            Some(idx) => &stripped[idx + 1..],
            None => stripped,
        };
        text = text.trim_end().strip_suffix("```").unwrap_or(text);
    }
    text.chars().filter(|c| !c.is_control()).collect::<String>()
}

/// Parse a generator response into validated records.
///
/// Accepts a single entry object, an array of entries, or a `{"messages": [..]}` conversation.
pub fn parse_response(raw: &str, language: &str) -> Result<Vec<GeneratedRecord>, ResponseError> {
    let cleaned = clean_response(raw);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| ResponseError::Malformed(e.to_string()))?;

    let invalid = |e: serde_json::Error| ResponseError::Invalid(e.to_string());
    let is_conversation = matches!(&value, Value::Object(map) if map.contains_key("messages"));

    let records = if is_conversation {
        let conversation: Conversation = serde_json::from_value(value).map_err(invalid)?;
        conversation
            .validate()
            .map_err(|e| ResponseError::Invalid(e.to_string()))?;
        vec![GeneratedRecord::from_conversation(&conversation, language)
            .map_err(ResponseError::Invalid)?]
    } else if value.is_object() {
        let entry: WordEntry = serde_json::from_value(value).map_err(invalid)?;
        vec![GeneratedRecord::from_entry(entry, language)]
    } else if value.is_array() {
        let entries: Vec<WordEntry> = serde_json::from_value(value).map_err(invalid)?;
        entries
            .into_iter()
            .map(|e| GeneratedRecord::from_entry(e, language))
            .collect()
    } else {
        return Err(ResponseError::Invalid(format!(
            "expected an object or an array, got {}",
            value
        )));
    };

    if records.is_empty() {
        return Err(ResponseError::Invalid("no entries in response".to_string()));
    }
    for record in &records {
        record.validate().map_err(ResponseError::Invalid)?;
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: &str = r#"{"word":"ahë","translation":"yours","grammar":"pronoun","examples":["ahë pë"]}"#;

    #[test]
    fn clean_fences_and_controls() {
        assert_eq!(clean_response("```json\n{\"a\":\n1}\n```"), "{\"a\":1}");
        assert_eq!(clean_response("```\n[]\n```"), "[]");
        assert_eq!(clean_response("  {}\t"), "{}");
    }

    #[test]
    fn parse_single_entry() {
        let records = parse_response(ENTRY, "Yanomami").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key(), Some("ahë"));
        assert_eq!(records[0].question(), "What does 'ahë' mean in Yanomami?");
        assert!(records[0].answer_text().contains("means 'yours'"));
    }

    #[test]
    fn parse_array_in_fences() {
        let raw = format!("```json\n[{}, {}]\n```", ENTRY, ENTRY.replace("ahë", "ahete"));
        let records = parse_response(&raw, "Yanomami").unwrap();
        let keys: Vec<_> = records.iter().filter_map(|r| r.key()).collect();
        assert_eq!(keys, vec!["ahë", "ahete"]);
    }

    #[test]
    fn parse_conversation() {
        let raw = r#"{"messages":[{"role":"user","content":"What does 'ahë' mean in Yanomami?"},{"role":"assistant","content":"It means yours, as in belonging to you."}]}"#;
        let records = parse_response(raw, "Yanomami").unwrap();
        assert_eq!(records[0].answer(), &Answer::Text("It means yours, as in belonging to you.".into()));
    }

    #[test]
    fn malformed_and_invalid() {
        assert!(matches!(
            parse_response("Sure! Here is the entry: {", "Yanomami"),
            Err(ResponseError::Malformed(_))
        ));
        assert!(matches!(
            parse_response(r#"{"word":"ahë"}"#, "Yanomami"),
            Err(ResponseError::Invalid(_))
        ));
        assert!(matches!(
            parse_response("[]", "Yanomami"),
            Err(ResponseError::Invalid(_))
        ));
        assert!(matches!(
            parse_response("42", "Yanomami"),
            Err(ResponseError::Invalid(_))
        ));
        // example object without any source text
        assert!(matches!(
            parse_response(
                r#"{"word":"ahë","translation":"yours","grammar":"pronoun","examples":[{"spanish":"tuyo"}]}"#,
                "Yanomami"
            ),
            Err(ResponseError::Invalid(e)) if e == "example 1 has no source text"
        ));
        // two quoted words in the question
        let raw = r#"{"messages":[{"role":"user","content":"Is 'a' the same as 'b'?"},{"role":"assistant","content":"No, they are different."}]}"#;
        assert!(matches!(
            parse_response(raw, "Yanomami"),
            Err(ResponseError::Invalid(_))
        ));
    }
}
