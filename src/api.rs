//! HTTP API for diagram sessions

mod assets;
mod handlers;
mod types;

pub use handlers::create_router;

use crate::flagging::FlagLog;
use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub flags: Arc<FlagLog>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, flags: FlagLog) -> Self {
        Self {
            sessions,
            flags: Arc::new(flags),
        }
    }
}
