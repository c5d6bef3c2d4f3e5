//! Persisted conversation records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder preview for a conversation without messages
pub const EMPTY_PREVIEW: &str = "No messages yet";

/// A saved chat, messages in send order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

/// One side of an exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_from_user: bool,
}

impl Conversation {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            timestamp: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Content of the most recent message
    pub fn last_message_preview(&self) -> &str {
        self.messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or(EMPTY_PREVIEW)
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(content.into(), true);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(content.into(), false);
    }

    fn push(&mut self, content: String, is_from_user: bool) {
        let timestamp = Utc::now();
        self.messages.push(StoredMessage {
            content,
            timestamp,
            is_from_user,
        });
        self.timestamp = timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_of_empty_conversation() {
        let conversation = Conversation::new("New Chat");
        assert_eq!(conversation.last_message_preview(), EMPTY_PREVIEW);
    }

    #[test]
    fn test_preview_is_last_message() {
        let mut conversation = Conversation::new("New Chat");
        conversation.push_user("hi");
        conversation.push_assistant("hello there");
        assert_eq!(conversation.last_message_preview(), "hello there");
        assert!(conversation.messages[0].is_from_user);
        assert!(!conversation.messages[1].is_from_user);
    }
}
