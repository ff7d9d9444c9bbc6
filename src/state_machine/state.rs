//! Session state types

use crate::diagram::{AcceptancePolicy, DiagramSource};
use crate::llm::ChatHistory;
use serde::Serialize;
use std::sync::Arc;

/// Where a session rests when nothing is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No diagram yet
    Empty,
    /// Diagram source updated, image not produced yet
    Stale,
    /// Diagram source rendered
    Ready,
}

impl Phase {
    pub fn into_state(self) -> SessionState {
        match self {
            Phase::Empty => SessionState::Empty,
            Phase::Stale => SessionState::Stale,
            Phase::Ready => SessionState::Ready,
        }
    }
}

/// Session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// No diagram yet; chat instructions are refused
    #[default]
    Empty,

    /// Initial diagram requested from the completion endpoint
    Generating {
        /// Phase to fall back to if the request fails
        previous: Phase,
    },

    /// Chat instruction sent to the completion endpoint
    Refining {
        /// Phase to fall back to if the request fails
        previous: Phase,
        /// The instruction being applied, recorded once the answer arrives
        instruction: String,
    },

    /// Diagram source updated, not yet (successfully) rendered
    Stale,

    /// Diagram source rendered
    Ready,
}

impl SessionState {
    /// Settled phase, or None while a completion request is in flight
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SessionState::Empty => Some(Phase::Empty),
            SessionState::Stale => Some(Phase::Stale),
            SessionState::Ready => Some(Phase::Ready),
            SessionState::Generating { .. } | SessionState::Refining { .. } => None,
        }
    }

    /// Check if a completion request is in flight
    pub fn is_busy(&self) -> bool {
        self.phase().is_none()
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Empty => "empty",
            SessionState::Generating { .. } => "generating",
            SessionState::Refining { .. } => "refining",
            SessionState::Stale => "stale",
            SessionState::Ready => "ready",
        }
    }
}

/// Mutable per-session data, changed only through effects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionData {
    pub source: DiagramSource,
    pub history: ChatHistory,
}

/// Context for a session (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub policy: Arc<AcceptancePolicy>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, policy: Arc<AcceptancePolicy>) -> Self {
        Self {
            session_id: session_id.into(),
            policy,
        }
    }
}
