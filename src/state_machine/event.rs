//! Events that can occur in a session

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    DocumentLoaded {
        file_name: String,
        text: String,
    },
    DocumentRejected {
        message: String,
    },
    UserInstruction {
        text: String,
    },
    RenderRequested,
    Reset,

    // Completion events
    CompletionSucceeded {
        text: String,
    },
    CompletionFailed {
        message: String,
    },

    // Renderer events
    RenderSucceeded {
        image: Vec<u8>,
    },
    RenderFailed {
        message: String,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::DocumentLoaded { .. } => "document_loaded",
            Event::DocumentRejected { .. } => "document_rejected",
            Event::UserInstruction { .. } => "user_instruction",
            Event::RenderRequested => "render_requested",
            Event::Reset => "reset",
            Event::CompletionSucceeded { .. } => "completion_succeeded",
            Event::CompletionFailed { .. } => "completion_failed",
            Event::RenderSucceeded { .. } => "render_succeeded",
            Event::RenderFailed { .. } => "render_failed",
        }
    }
}
