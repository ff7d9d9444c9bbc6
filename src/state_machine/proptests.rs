//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::diagram::{extract, AcceptancePolicy, END_MARKER, START_MARKER};
use crate::llm::ChatTurn;
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new("test-session", Arc::new(AcceptancePolicy::default()))
}

fn data_for(state: &SessionState, body: &str) -> SessionData {
    if matches!(state, SessionState::Empty) {
        SessionData::default()
    } else {
        SessionData {
            source: extract(body),
            history: vec![ChatTurn::user("q"), ChatTurn::assistant("a")].into(),
        }
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_phase() -> impl Strategy<Value = Phase> {
    prop_oneof![Just(Phase::Empty), Just(Phase::Stale), Just(Phase::Ready)]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 .,]{0,40}",
        "[a-zA-Z ]{1,20}".prop_map(|body| format!("```plantuml\n{body}\n```")),
        "[a-zA-Z ]{1,20}".prop_map(|body| format!("@startuml\n{body}\n@enduml")),
    ]
}

fn arb_busy_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        arb_phase().prop_map(|previous| SessionState::Generating { previous }),
        (prop_oneof![Just(Phase::Stale), Just(Phase::Ready)], "[a-z ]{1,20}").prop_map(
            |(previous, instruction)| SessionState::Refining {
                previous,
                instruction
            }
        ),
    ]
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        arb_phase().prop_map(Phase::into_state),
        arb_busy_state(),
    ]
}

/// Events a user can trigger, other than reset
fn arb_user_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        ("[a-z]{1,8}\\.txt", arb_text())
            .prop_map(|(file_name, text)| Event::DocumentLoaded { file_name, text }),
        "[a-z ]{1,20}".prop_map(|message| Event::DocumentRejected { message }),
        arb_text().prop_map(|text| Event::UserInstruction { text }),
        Just(Event::RenderRequested),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_user_event(),
        Just(Event::Reset),
        arb_text().prop_map(|text| Event::CompletionSucceeded { text }),
        "[a-z ]{1,20}".prop_map(|message| Event::CompletionFailed { message }),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(|image| Event::RenderSucceeded { image }),
        "[a-z ]{1,20}".prop_map(|message| Event::RenderFailed { message }),
    ]
}

proptest! {
    #[test]
    fn reset_always_empties(state in arb_state(), body in "[a-z ]{0,20}") {
        let data = data_for(&state, &body);
        let result = transition(&state, &test_context(), &data, Event::Reset).unwrap();
        prop_assert_eq!(result.new_state, SessionState::Empty);
        prop_assert!(result.effects.iter().any(|e| matches!(e, Effect::ClearSession)));
    }

    #[test]
    fn instruction_without_source_never_reaches_network(
        state in arb_state(),
        text in arb_text(),
    ) {
        let result = transition(
            &state,
            &test_context(),
            &SessionData::default(),
            Event::UserInstruction { text },
        );
        match result {
            Ok(r) => prop_assert!(false, "unexpected transition to {:?}", r.new_state),
            Err(e) => prop_assert!(
                matches!(e, TransitionError::NoDiagram | TransitionError::Busy),
                "unexpected error {e:?}"
            ),
        }
    }

    #[test]
    fn failed_completion_never_touches_source(
        state in arb_state(),
        body in "[a-z ]{0,20}",
        message in "[a-z ]{1,20}",
    ) {
        let data = data_for(&state, &body);
        if let Ok(result) = transition(
            &state,
            &test_context(),
            &data,
            Event::CompletionFailed { message },
        ) {
            prop_assert!(!result.effects.iter().any(|e| matches!(
                e,
                Effect::ReplaceSource(_) | Effect::ClearSession | Effect::RenderDiagram(_)
            )));
            prop_assert!(!result.new_state.is_busy());
        }
    }

    #[test]
    fn replaced_source_is_always_bracketed(
        state in arb_state(),
        body in "[a-z ]{0,20}",
        event in arb_event(),
    ) {
        let data = data_for(&state, &body);
        if let Ok(result) = transition(&state, &test_context(), &data, event) {
            for effect in &result.effects {
                if let Effect::ReplaceSource(source) = effect {
                    prop_assert!(source.as_str().starts_with(START_MARKER));
                    prop_assert!(source.as_str().ends_with(END_MARKER));
                }
            }
        }
    }

    #[test]
    fn busy_states_reject_user_requests(
        state in arb_busy_state(),
        body in "[a-z ]{0,20}",
        event in arb_user_event(),
    ) {
        let data = data_for(&state, &body);
        let err = transition(&state, &test_context(), &data, event).unwrap_err();
        prop_assert_eq!(err, TransitionError::Busy);
    }

    #[test]
    fn at_most_one_io_effect(
        state in arb_state(),
        body in "[a-z ]{0,20}",
        event in arb_event(),
    ) {
        let data = data_for(&state, &body);
        if let Ok(result) = transition(&state, &test_context(), &data, event) {
            let io = result.effects.iter().filter(|e| e.is_io()).count();
            prop_assert!(io <= 1);
        }
    }
}
