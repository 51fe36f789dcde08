//! Chat message types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a message.
///
/// `human` and `ai` are the two canonical roles. Documents written by other
/// clients may carry different role strings; those are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageRole {
    /// Message from the user.
    Human,
    /// Message from the AI assistant.
    Ai,
    /// Any other role tag found in a document.
    Other(String),
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Human => "human",
            Self::Ai => "ai",
            Self::Other(role) => role,
        }
    }
}

impl From<&str> for MessageRole {
    fn from(role: &str) -> Self {
        match role {
            "human" => Self::Human,
            "ai" => Self::Ai,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for MessageRole {
    fn from(role: String) -> Self {
        Self::from(role.as_str())
    }
}

impl From<MessageRole> for String {
    fn from(role: MessageRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<MessageRole>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Human, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Ai, content)
    }
}
