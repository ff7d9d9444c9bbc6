//! Acceptance heuristic for refinement responses

use super::extract::fenced_blocks;
use super::START_MARKER;

/// Decides whether a refinement response should replace the current diagram.
///
/// A response is accepted when it contains a fenced code block (if
/// `accept_fenced` is set) or any of the `keywords` as a substring.
/// Keyword matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptancePolicy {
    pub accept_fenced: bool,
    pub keywords: Vec<String>,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            accept_fenced: true,
            keywords: vec![START_MARKER.to_string()],
        }
    }
}

impl AcceptancePolicy {
    /// Build a policy from a comma separated keyword list; blank entries are dropped
    pub fn with_keyword_list(list: &str) -> Self {
        Self {
            keywords: list
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
            ..Self::default()
        }
    }

    pub fn accepts(&self, response: &str) -> bool {
        if self.accept_fenced && !fenced_blocks(response).is_empty() {
            return true;
        }
        self.keywords.iter().any(|k| response.contains(k.as_str()))
    }
}
