//! API request and response types

use crate::diagram::DiagramSource;
use crate::flagging::FlagLabel;
use crate::llm::ChatHistory;
use crate::runtime::TurnOutcome;
use crate::state_machine::SessionState;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Uploaded requirements file, base64 encoded
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub data: String,
}

/// Chat instruction for a session's diagram
#[derive(Debug, Deserialize)]
pub struct InstructionRequest {
    pub text: String,
}

/// Stateless chat message with prior turns
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: ChatHistory,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Flag a chat exchange
#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub label: FlagLabel,
    pub message: String,
    pub answer: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Result of an upload, chat, render or reset
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub state: SessionState,
    pub status: String,
    pub source: DiagramSource,
    /// PNG bytes, base64 encoded
    pub image: Option<String>,
}

impl From<TurnOutcome> for TurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            state: outcome.state,
            status: outcome.status,
            source: outcome.source,
            image: outcome.image.map(|bytes| STANDARD.encode(bytes)),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
