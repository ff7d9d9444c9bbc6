//! Runtime for diagram sessions
//!
//! Owns the live sessions and the shared outbound services they call.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::{Session, SessionSnapshot, TurnOutcome};

use crate::diagram::{AcceptancePolicy, DiagramRenderer};
use crate::llm::CompletionService;
use crate::state_machine::SessionContext;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Manager for all diagram sessions
pub struct SessionManager {
    completion: Arc<dyn CompletionService>,
    renderer: Arc<dyn DiagramRenderer>,
    policy: Arc<AcceptancePolicy>,
    request_timeout: Duration,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        renderer: Arc<dyn DiagramRenderer>,
        policy: AcceptancePolicy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            completion,
            renderer,
            policy: Arc::new(policy),
            request_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a fresh, empty session
    pub async fn create(&self) -> Arc<Session> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(
            SessionContext::new(&session_id, self.policy.clone()),
            self.completion.clone(),
            self.renderer.clone(),
            self.request_timeout,
        ));

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.clone(), session.clone());
        tracing::info!(session_id = %session_id, active = sessions.len(), "Session created");
        session
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Forget a session. A turn still running on it finishes, but its
    /// result is no longer reachable.
    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id, "Session removed");
        }
        removed
    }

    /// Drop every session idle for at least `max_idle`. Returns how many went.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.idle_for() < max_idle);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, active = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Evict idle sessions every `period` until the manager is dropped
    pub fn spawn_idle_sweeper(self: &Arc<Self>, max_idle: Duration, period: Duration) -> JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    tracing::debug!("SessionManager dropped, idle sweeper exiting");
                    break;
                };
                manager.evict_idle(max_idle).await;
            }
        })
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Completion service shared by every session
    pub fn completion(&self) -> &Arc<dyn CompletionService> {
        &self.completion
    }
}
