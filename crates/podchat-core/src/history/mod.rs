//! Chat history domain module.
//!
//! # Module Structure
//!
//! - `message`: message types (`MessageRole`, `Message`)
//! - `list_codec`: the RDF list encoding of a history and its append patches
//! - `in_memory`: a process-local [`ChatHistory`]
//!
//! Remote implementations live in `podchat-interaction`.

pub mod list_codec;
mod in_memory;
mod message;

pub use in_memory::InMemoryChatHistory;
pub use message::{Message, MessageRole};

use async_trait::async_trait;

/// Result of an append.
///
/// Appends never raise: a failed append leaves the history as it was and
/// reports why, so the caller can decide whether to re-list and try again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The store accepted the message.
    Committed,
    /// The store answered with a non-success status. A conflict status means
    /// the list changed since it was last read.
    Rejected { status: u16 },
    /// The store could not be reached.
    Failed { reason: String },
}

impl AppendOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// The contract between the application layer and a chat history store.
///
/// None of the operations fail: reads degrade to an empty history and writes
/// to a no-op.
#[async_trait]
pub trait ChatHistory: Send {
    /// Returns the messages in append order.
    async fn list(&mut self) -> Vec<Message>;

    /// Appends a message at the end of the history.
    async fn append(&mut self, message: Message) -> AppendOutcome;

    /// Removes every message.
    async fn clear(&mut self);

    async fn add_user_message(&mut self, content: String) -> AppendOutcome {
        self.append(Message::human(content)).await
    }

    async fn add_ai_message(&mut self, content: String) -> AppendOutcome {
        self.append(Message::ai(content)).await
    }
}
