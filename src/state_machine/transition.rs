//! Pure state transition function
//!
//! Given the same state, data and event, `transition` always produces the
//! same new state and effects. All I/O happens in the runtime.

use super::state::{Phase, SessionData};
use super::{Effect, Event, SessionContext, SessionState};
use crate::diagram::extract;
use crate::llm::CompletionRequest;
use crate::prompts::{completion_failure_answer, generation_prompt, refinement_prompt};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Please upload a requirements file first.")]
    NoDiagram,
    #[error("A request is already running for this session, please wait for it to finish.")]
    Busy,
    #[error("Please describe the change you want.")]
    EmptyInstruction,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    data: &SessionData,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Reset always wins, even over in-flight requests
        (_, Event::Reset) => Ok(TransitionResult::new(SessionState::Empty)
            .with_effect(Effect::ClearSession)
            .with_effect(Effect::status("Session reset."))),

        // ============================================================
        // User requests
        // ============================================================
        (
            SessionState::Generating { .. } | SessionState::Refining { .. },
            Event::DocumentLoaded { .. }
            | Event::DocumentRejected { .. }
            | Event::UserInstruction { .. }
            | Event::RenderRequested,
        ) => Err(TransitionError::Busy),

        (_, Event::DocumentRejected { message }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::Status(message)))
        }

        // Empty|Ready|Stale + DocumentLoaded -> Generating
        (_, Event::DocumentLoaded { file_name, text }) => {
            let previous = state.phase().ok_or(TransitionError::Busy)?;
            Ok(TransitionResult::new(SessionState::Generating { previous })
                .with_effect(Effect::status(format!(
                    "File {file_name} uploaded successfully. Generating diagram..."
                )))
                .with_effect(Effect::RequestCompletion(CompletionRequest::new(
                    generation_prompt(&text),
                ))))
        }

        // Ready|Stale + UserInstruction -> Refining
        (_, Event::UserInstruction { text }) => {
            let previous = state.phase().ok_or(TransitionError::Busy)?;
            if previous == Phase::Empty || data.source.is_empty() {
                return Err(TransitionError::NoDiagram);
            }
            let instruction = text.trim();
            if instruction.is_empty() {
                return Err(TransitionError::EmptyInstruction);
            }

            let request = CompletionRequest::new(refinement_prompt(&data.source, instruction))
                .with_history(data.history.clone());
            Ok(TransitionResult::new(SessionState::Refining {
                previous,
                instruction: instruction.to_string(),
            })
            .with_effect(Effect::status("Updating diagram..."))
            .with_effect(Effect::RequestCompletion(request)))
        }

        (SessionState::Ready | SessionState::Stale, Event::RenderRequested) => {
            if data.source.is_empty() {
                return Err(TransitionError::NoDiagram);
            }
            Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::RenderDiagram(data.source.clone())))
        }

        (SessionState::Empty, Event::RenderRequested) => Err(TransitionError::NoDiagram),

        // ============================================================
        // Completion results
        // ============================================================
        (SessionState::Generating { .. }, Event::CompletionSucceeded { text }) => {
            let source = extract(&text);
            Ok(TransitionResult::new(SessionState::Stale)
                .with_effect(Effect::ReplaceSource(source.clone()))
                .with_effect(Effect::status("Diagram generated."))
                .with_effect(Effect::RenderDiagram(source)))
        }

        (SessionState::Generating { previous }, Event::CompletionFailed { message }) => {
            Ok(TransitionResult::new(previous.into_state())
                .with_effect(Effect::status(format!("Diagram generation failed: {message}"))))
        }

        (SessionState::Refining { instruction, .. }, Event::CompletionSucceeded { text }) => {
            let exchange = Effect::exchange(instruction.clone(), text.clone());
            if context.policy.accepts(&text) {
                let source = extract(&text);
                Ok(TransitionResult::new(SessionState::Stale)
                    .with_effect(Effect::ReplaceSource(source.clone()))
                    .with_effect(exchange)
                    .with_effect(Effect::status("Diagram updated."))
                    .with_effect(Effect::RenderDiagram(source)))
            } else {
                Ok(TransitionResult::new(SessionState::Stale)
                    .with_effect(exchange)
                    .with_effect(Effect::status(
                        "The answer did not contain a diagram, keeping the current one.",
                    ))
                    .with_effect(Effect::RenderDiagram(data.source.clone())))
            }
        }

        (
            SessionState::Refining {
                previous,
                instruction,
            },
            Event::CompletionFailed { message },
        ) => Ok(TransitionResult::new(previous.into_state())
            .with_effect(Effect::exchange(
                instruction.clone(),
                completion_failure_answer(&message),
            ))
            .with_effect(Effect::status(format!("Diagram update failed: {message}")))),

        // ============================================================
        // Render results
        // ============================================================
        (SessionState::Stale | SessionState::Ready, Event::RenderSucceeded { image }) => {
            Ok(TransitionResult::new(SessionState::Ready).with_effect(Effect::ShowImage(image)))
        }

        (SessionState::Stale | SessionState::Ready, Event::RenderFailed { message }) => {
            Ok(TransitionResult::new(SessionState::Stale).with_effect(Effect::status(format!(
                "The diagram source is up to date, but the image could not be rendered: {message}"
            ))))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} in state {}",
            event.name(),
            state.name()
        ))),
    }
}
