//! Effects produced by state transitions

use crate::diagram::DiagramSource;
use crate::llm::{ChatTurn, CompletionRequest};

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Replace the session's diagram source wholesale
    ReplaceSource(DiagramSource),

    /// Append turns to the chat transcript
    AppendTurns(Vec<ChatTurn>),

    /// Drop diagram source and transcript
    ClearSession,

    /// Make a completion request
    RequestCompletion(CompletionRequest),

    /// Render the given source
    RenderDiagram(DiagramSource),

    /// Hand a freshly rendered image to the caller
    ShowImage(Vec<u8>),

    /// Tell the user what happened
    Status(String),
}

impl Effect {
    pub fn status(message: impl Into<String>) -> Self {
        Effect::Status(message.into())
    }

    pub fn exchange(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Effect::AppendTurns(vec![ChatTurn::user(question), ChatTurn::assistant(answer)])
    }

    /// Effects that need I/O and produce a follow-up event
    pub fn is_io(&self) -> bool {
        matches!(self, Effect::RequestCompletion(_) | Effect::RenderDiagram(_))
    }
}
