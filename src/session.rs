//! Conversational session state.
//!
//! A session is owned by the caller and passed into the answer composer;
//! it lives for one conversation and is dropped when the conversation
//! ends. Nothing here is persisted or shared between users.

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

/// Ordered in-memory history of one conversation.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed exchange.
    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(ChatTurn {
            question: question.into(),
            answer: answer.into(),
        });
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The most recent `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
