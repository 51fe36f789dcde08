use super::{AppendOutcome, ChatHistory, Message};
use async_trait::async_trait;

/// A history kept in process memory, for sessions without a pod.
#[derive(Debug, Default, Clone)]
pub struct InMemoryChatHistory {
    messages: Vec<Message>,
}

impl InMemoryChatHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatHistory for InMemoryChatHistory {
    async fn list(&mut self) -> Vec<Message> {
        self.messages.clone()
    }

    async fn append(&mut self, message: Message) -> AppendOutcome {
        self.messages.push(message);
        AppendOutcome::Committed
    }

    async fn clear(&mut self) {
        self.messages.clear();
    }
}
