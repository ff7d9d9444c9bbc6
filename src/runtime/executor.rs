//! Session runtime executor

use crate::diagram::{DiagramRenderer, DiagramSource};
use crate::document::load_document;
use crate::llm::{ChatHistory, CompletionService};
use crate::state_machine::{transition, Effect, Event, SessionContext, SessionData, SessionState};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::time::timeout;

const DISCARDED_STATUS: &str = "The session was reset while a request was running, its result was discarded.";

/// What the caller gets back from every session operation
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub state: SessionState,
    pub status: String,
    pub source: DiagramSource,
    /// Image rendered during this turn, if any
    pub image: Option<Vec<u8>>,
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub state: SessionState,
    /// A completion request is in flight
    pub busy: bool,
    pub source: DiagramSource,
    pub history: ChatHistory,
}

struct SessionCore {
    state: SessionState,
    data: SessionData,
    /// Bumped by reset; turns started under an older epoch are discarded
    epoch: u64,
    last_active: Instant,
}

#[derive(Default)]
struct TurnReport {
    status: Option<String>,
    image: Option<Vec<u8>>,
    discarded: bool,
}

/// One user's diagram session.
///
/// Upload, chat and render turns run one at a time. Reset does not wait for
/// a running turn; it clears the session immediately and the running turn
/// drops its result when it comes back.
pub struct Session {
    context: SessionContext,
    core: Mutex<SessionCore>,
    turn_lock: tokio::sync::Mutex<()>,
    completion: Arc<dyn CompletionService>,
    renderer: Arc<dyn DiagramRenderer>,
    request_timeout: Duration,
}

impl Session {
    pub fn new(
        context: SessionContext,
        completion: Arc<dyn CompletionService>,
        renderer: Arc<dyn DiagramRenderer>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            context,
            core: Mutex::new(SessionCore {
                state: SessionState::Empty,
                data: SessionData::default(),
                epoch: 0,
                last_active: Instant::now(),
            }),
            turn_lock: tokio::sync::Mutex::new(()),
            completion,
            renderer,
            request_timeout,
        }
    }

    pub fn id(&self) -> &str {
        &self.context.session_id
    }

    /// Load an uploaded document and generate the first diagram from it
    pub async fn upload(&self, file_name: &str, bytes: &[u8]) -> TurnOutcome {
        let event = match load_document(file_name, bytes) {
            Ok(text) => Event::DocumentLoaded {
                file_name: file_name.to_string(),
                text,
            },
            Err(e) => {
                tracing::warn!(session_id = %self.id(), file_name, error = %e, "Document rejected");
                Event::DocumentRejected {
                    message: e.to_string(),
                }
            }
        };
        self.run_turn(event).await
    }

    /// Apply a chat instruction to the current diagram
    pub async fn chat(&self, text: &str) -> TurnOutcome {
        self.run_turn(Event::UserInstruction {
            text: text.to_string(),
        })
        .await
    }

    /// Render the current diagram again
    pub async fn render(&self) -> TurnOutcome {
        self.run_turn(Event::RenderRequested).await
    }

    /// Clear the diagram and transcript, abandoning any running turn
    pub fn reset(&self) -> TurnOutcome {
        let epoch = {
            let mut core = self.lock_core();
            core.epoch += 1;
            core.last_active = Instant::now();
            core.epoch
        };
        let mut report = TurnReport::default();
        self.step(epoch, Event::Reset, &mut report);
        self.outcome(report)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut core = self.lock_core();
        core.last_active = Instant::now();
        SessionSnapshot {
            session_id: self.context.session_id.clone(),
            state: core.state.clone(),
            busy: core.state.is_busy(),
            source: core.data.source.clone(),
            history: core.data.history.clone(),
        }
    }

    /// Time since the last operation finished, zero while a turn is running
    pub fn idle_for(&self) -> Duration {
        if self.turn_lock.try_lock().is_err() {
            return Duration::ZERO;
        }
        self.lock_core().last_active.elapsed()
    }

    async fn run_turn(&self, event: Event) -> TurnOutcome {
        let _turn = self.turn_lock.lock().await;
        let epoch = self.lock_core().epoch;
        let mut report = TurnReport::default();

        let mut next = Some(event);
        while let Some(event) = next.take() {
            if let Some(effect) = self.step(epoch, event, &mut report) {
                next = self.execute(effect).await;
            }
        }

        self.outcome(report)
    }

    /// Run one transition and apply its in-memory effects.
    ///
    /// Returns the I/O effect to execute next, if any.
    fn step(&self, epoch: u64, event: Event, report: &mut TurnReport) -> Option<Effect> {
        let mut core = self.lock_core();
        if core.epoch != epoch {
            tracing::info!(
                session_id = %self.id(),
                event = event.name(),
                "Dropping result of a turn superseded by reset"
            );
            report.discarded = true;
            return None;
        }

        let event_name = event.name();
        let result = match transition(&core.state, &self.context, &core.data, event) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    session_id = %self.id(),
                    state = core.state.name(),
                    event = event_name,
                    error = %e,
                    "Transition refused"
                );
                report.status = Some(e.to_string());
                return None;
            }
        };

        tracing::debug!(
            session_id = %self.id(),
            from = core.state.name(),
            to = result.new_state.name(),
            event = event_name,
            "Session transition"
        );
        core.state = result.new_state;

        let mut io = None;
        for effect in result.effects {
            match effect {
                Effect::ReplaceSource(source) => core.data.source = source,
                Effect::AppendTurns(turns) => {
                    for turn in turns {
                        core.data.history.push(turn);
                    }
                }
                Effect::ClearSession => core.data = SessionData::default(),
                Effect::ShowImage(image) => report.image = Some(image),
                Effect::Status(message) => report.status = Some(message),
                effect => {
                    debug_assert!(effect.is_io());
                    io = Some(effect);
                }
            }
        }
        io
    }

    /// Execute an I/O effect, turning its outcome into the next event
    async fn execute(&self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::RequestCompletion(request) => {
                let result = timeout(self.request_timeout, self.completion.complete(&request)).await;
                Some(match result {
                    Ok(Ok(text)) => Event::CompletionSucceeded { text },
                    Ok(Err(e)) => Event::CompletionFailed { message: e.message },
                    Err(_) => Event::CompletionFailed {
                        message: format!("no answer within {:?}", self.request_timeout),
                    },
                })
            }
            Effect::RenderDiagram(source) => {
                let result = timeout(self.request_timeout, self.renderer.render(&source)).await;
                Some(match result {
                    Ok(Ok(image)) => Event::RenderSucceeded { image },
                    Ok(Err(e)) => Event::RenderFailed {
                        message: e.to_string(),
                    },
                    Err(_) => Event::RenderFailed {
                        message: format!("no image within {:?}", self.request_timeout),
                    },
                })
            }
            _ => None,
        }
    }

    fn outcome(&self, report: TurnReport) -> TurnOutcome {
        let mut core = self.lock_core();
        core.last_active = Instant::now();
        let status = if report.discarded {
            DISCARDED_STATUS.to_string()
        } else {
            report.status.unwrap_or_default()
        };
        TurnOutcome {
            state: core.state.clone(),
            status,
            source: core.data.source.clone(),
            image: if report.discarded { None } else { report.image },
        }
    }

    fn lock_core(&self) -> MutexGuard<'_, SessionCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
