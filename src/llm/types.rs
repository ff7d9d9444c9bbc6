//! Common types for completion requests and chat transcripts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a chat transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Append-only transcript of a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory(Vec<ChatTurn>);

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.0.push(turn);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn turns(&self) -> &[ChatTurn] {
        &self.0
    }

    /// Group the transcript into (question, answer) exchanges.
    ///
    /// Walks the turns two at a time. A slot whose role does not match the
    /// expected one yields an empty string, so a stray assistant turn at an
    /// even position becomes an exchange with an empty question.
    pub fn exchanges(&self) -> Vec<(String, String)> {
        self.0
            .chunks(2)
            .map(|pair| {
                let question = match pair.first() {
                    Some(turn) if turn.role == ChatRole::User => turn.text.clone(),
                    _ => String::new(),
                };
                let answer = match pair.get(1) {
                    Some(turn) if turn.role == ChatRole::Assistant => turn.text.clone(),
                    _ => String::new(),
                };
                (question, answer)
            })
            .collect()
    }
}

impl From<Vec<ChatTurn>> for ChatHistory {
    fn from(turns: Vec<ChatTurn>) -> Self {
        Self(turns)
    }
}

/// Completion request: one prompt plus the prior turns
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub prompt: String,
    pub history: ChatHistory,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: ChatHistory::new(),
        }
    }

    pub fn with_history(mut self, history: ChatHistory) -> Self {
        self.history = history;
        self
    }
}
