//! Diagram source extraction from raw model output

use super::{DiagramSource, END_MARKER, START_MARKER};
use regex::Regex;
use std::sync::LazyLock;

/// Info-string tags that mark a fenced block as PlantUML
const DIAGRAM_TAGS: &[&str] = &["plantuml", "puml", "uml"];

/// A fence line with an optional info string, then everything up to the
/// closing fence or the end of the text (models sometimes stop mid-block).
/// Both fences must open their line; inline backtick spans are prose.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*```[ \t]*([^\n`]*)\n(.*?)(?:^[ \t]*```|\z)")
        .expect("fenced block pattern is valid")
});

/// A fenced code block found in model output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FencedBlock<'a> {
    pub tag: &'a str,
    pub body: &'a str,
}

impl FencedBlock<'_> {
    fn is_diagram(&self) -> bool {
        let tag = self.tag.split_whitespace().next().unwrap_or_default();
        DIAGRAM_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t))
    }
}

/// All fenced blocks in `raw`, in order of appearance
pub(crate) fn fenced_blocks(raw: &str) -> Vec<FencedBlock<'_>> {
    FENCED_BLOCK
        .captures_iter(raw)
        .filter_map(|caps| {
            Some(FencedBlock {
                tag: caps.get(1)?.as_str().trim(),
                body: caps.get(2)?.as_str(),
            })
        })
        .collect()
}

/// Pull the diagram source out of a model response.
///
/// Prefers the first block tagged as PlantUML, then the first fenced block of
/// any kind, then the whole text. The candidate is trimmed and bracketed with
/// the start and end markers where they are missing. Never fails: empty input
/// yields a source holding only the two markers.
pub fn extract(raw: &str) -> DiagramSource {
    let blocks = fenced_blocks(raw);
    let candidate = blocks
        .iter()
        .find(|block| block.is_diagram())
        .or_else(|| blocks.first())
        .map_or(raw, |block| block.body)
        .trim();

    normalize(candidate)
}

fn normalize(candidate: &str) -> DiagramSource {
    let mut parts = Vec::with_capacity(3);
    if !candidate.starts_with(START_MARKER) {
        parts.push(START_MARKER);
    }
    if !candidate.is_empty() {
        parts.push(candidate);
    }
    if !candidate.ends_with(END_MARKER) {
        parts.push(END_MARKER);
    }
    DiagramSource::normalized(parts.join("\n"))
}
