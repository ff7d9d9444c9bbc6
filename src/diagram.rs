//! PlantUML diagram source handling
//!
//! Extraction of diagram source from model output, the acceptance heuristic
//! used during refinement, and rendering through a PlantUML server.

mod encoding;
mod extract;
mod policy;
mod render;

#[cfg(test)]
mod proptests;

pub use extract::extract;
pub use policy::AcceptancePolicy;
pub use render::{DiagramRenderer, PlantUmlServerRenderer, RenderError, DEFAULT_SERVER_URL};

use serde::Serialize;
use std::fmt;

/// Opening marker of a PlantUML document
pub const START_MARKER: &str = "@startuml";

/// Closing marker of a PlantUML document
pub const END_MARKER: &str = "@enduml";

/// Current diagram source of a session.
///
/// Either empty, or starts with [`START_MARKER`] and ends with [`END_MARKER`].
/// Only [`extract`] produces non-empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiagramSource(String);

impl DiagramSource {
    pub(crate) fn normalized(text: String) -> Self {
        debug_assert!(text.starts_with(START_MARKER) && text.ends_with(END_MARKER));
        Self(text)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiagramSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
