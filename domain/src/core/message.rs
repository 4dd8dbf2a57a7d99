//! User message value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Default maximum message length, in characters.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 1000;

/// A message posed to the ensemble (Value Object)
///
/// Represents the text that is fanned out to every selected backend
/// within one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserMessage {
    content: String,
}

impl UserMessage {
    /// Create a message, rejecting empty input and input longer than
    /// [`DEFAULT_MAX_MESSAGE_CHARS`].
    pub fn new(content: impl Into<String>) -> Result<Self, DomainError> {
        Self::with_limit(content, DEFAULT_MAX_MESSAGE_CHARS)
    }

    /// Create a message with an explicit character limit
    pub fn with_limit(content: impl Into<String>, max_chars: usize) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidMessage(
                "message cannot be empty".to_string(),
            ));
        }
        let len = content.chars().count();
        if len > max_chars {
            return Err(DomainError::InvalidMessage(format!(
                "message is {} characters, limit is {}",
                len, max_chars
            )));
        }
        Ok(Self { content })
    }

    /// Get the message content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for UserMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<&str> for UserMessage {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        UserMessage::new(s)
    }
}

impl TryFrom<String> for UserMessage {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        UserMessage::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let m = UserMessage::new("What is Rust?").unwrap();
        assert_eq!(m.content(), "What is Rust?");
    }

    #[test]
    fn test_empty_message_rejected() {
        assert!(UserMessage::new("").is_err());
        assert!(UserMessage::new("   ").is_err());
    }

    #[test]
    fn test_length_limit() {
        let at_limit = "a".repeat(DEFAULT_MAX_MESSAGE_CHARS);
        assert!(UserMessage::new(at_limit).is_ok());

        let over = "a".repeat(DEFAULT_MAX_MESSAGE_CHARS + 1);
        let err = UserMessage::new(over).unwrap_err();
        assert!(matches!(err, DomainError::InvalidMessage(_)));
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        assert!(UserMessage::with_limit("日本語", 3).is_ok());
        assert!(UserMessage::with_limit("日本語!", 3).is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let m = UserMessage::new("hi").unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"hi\"");
    }
}
