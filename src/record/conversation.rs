//! Fine-tuning conversation format.
//!
//! Each line of an output dataset is one [Conversation]:
//! ```json
//! {"messages": [{"role": "user", "content": "..."}, {"role": "assistant", "content": "..."}]}
//! ```
use std::fmt;

use serde::{Deserialize, Serialize};

/// minimum number of characters for a message content to be considered usable.
pub const MIN_CONTENT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    // some older datasets use "human"
    #[serde(alias = "human")]
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MessageCount(usize),
    Roles(Role, Role),
    TooShort { role: Role, len: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MessageCount(n) => write!(f, "expected 2 messages, got {}", n),
            ValidationError::Roles(first, second) => write!(
                f,
                "expected user then assistant roles, got {:?} then {:?}",
                first, second
            ),
            ValidationError::TooShort { role, len } => write!(
                f,
                "{:?} content has {} characters (min {})",
                role, len, MIN_CONTENT_LEN
            ),
        }
    }
}

impl Conversation {
    /// Create a user/assistant pair.
    pub fn new(question: String, answer: String) -> Self {
        Self {
            messages: vec![
                Message {
                    role: Role::User,
                    content: question,
                },
                Message {
                    role: Role::Assistant,
                    content: answer,
                },
            ],
        }
    }

    /// content of the first user message
    pub fn question(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// content of the first assistant message
    pub fn answer(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    pub fn answer_mut(&mut self) -> Option<&mut String> {
        self.messages
            .iter_mut()
            .find(|m| m.role == Role::Assistant)
            .map(|m| &mut m.content)
    }

    /// Check that the conversation is usable for fine-tuning:
    /// exactly a user message followed by an assistant message,
    /// both at least [MIN_CONTENT_LEN] characters long.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let (user, assistant) = match self.messages.as_slice() {
            [user, assistant] => (user, assistant),
            other => return Err(ValidationError::MessageCount(other.len())),
        };

        if user.role != Role::User || assistant.role != Role::Assistant {
            return Err(ValidationError::Roles(user.role, assistant.role));
        }

        for message in [user, assistant] {
            let len = message.content.trim().chars().count();
            if len < MIN_CONTENT_LEN {
                return Err(ValidationError::TooShort {
                    role: message.role,
                    len,
                });
            }
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_shape() {
        let c = Conversation::new(
            "What does 'ahë' mean in Yanomami?".to_string(),
            "It means yours.".to_string(),
        );
        let s = serde_json::to_string(&c).unwrap();
        assert_eq!(
            s,
            r#"{"messages":[{"role":"user","content":"What does 'ahë' mean in Yanomami?"},{"role":"assistant","content":"It means yours."}]}"#
        );
        let back: Conversation = serde_json::from_str(&s).unwrap();
        assert_eq!(back, c);
        assert!(back.is_valid());
    }

    #[test]
    fn human_alias() {
        let c: Conversation = serde_json::from_str(
            r#"{"messages":[{"role":"human","content":"a long enough question"},{"role":"assistant","content":"a long enough answer"}]}"#,
        )
        .unwrap();
        assert_eq!(c.messages[0].role, Role::User);
        assert!(c.is_valid());
    }

    #[test]
    fn invalid_conversations() {
        let short = Conversation::new("What is x?".to_string(), "short".to_string());
        assert_eq!(
            short.validate(),
            Err(ValidationError::TooShort {
                role: Role::Assistant,
                len: 5
            })
        );

        let mut swapped = Conversation::new("long question here".into(), "long answer here".into());
        swapped.messages.reverse();
        assert!(matches!(swapped.validate(), Err(ValidationError::Roles(..))));

        let single = Conversation {
            messages: vec![Message {
                role: Role::User,
                content: "lonely question".into(),
            }],
        };
        assert_eq!(single.validate(), Err(ValidationError::MessageCount(1)));
    }
}
