//! Property-based tests for diagram source extraction
//!
//! - A tagged fenced block yields exactly its trimmed body, bracketed once
//! - Unfenced text yields the trimmed text, bracketed once
//! - Output always carries both markers

use super::{extract, END_MARKER, START_MARKER};
use proptest::prelude::*;

/// Diagram body lines without fences or markers
fn arb_body() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Za-z]([A-Za-z0-9 >:-]{0,30}[A-Za-z0-9])?", 1..6)
        .prop_map(|lines| lines.join("\n"))
}

/// Prose around a block, never containing backticks
fn arb_prose() -> impl Strategy<Value = String> {
    "[A-Za-z .,!?]{0,40}"
}

fn expected(body: &str) -> String {
    format!("{START_MARKER}\n{}\n{END_MARKER}", body.trim())
}

proptest! {
    #[test]
    fn tagged_block_body_is_extracted(
        before in arb_prose(),
        body in arb_body(),
        after in arb_prose(),
    ) {
        let raw = format!("{before}\n```plantuml\n{body}\n```\n{after}");
        let source = extract(&raw);
        prop_assert_eq!(source.as_str(), expected(&body));
    }

    #[test]
    fn bracketed_block_is_not_double_bracketed(body in arb_body()) {
        let raw = format!("```plantuml\n{START_MARKER}\n{body}\n{END_MARKER}\n```");
        let source = extract(&raw);
        prop_assert_eq!(source.as_str(), expected(&body));
    }

    #[test]
    fn unfenced_text_is_bracketed(
        lead in "[ \n\t]{0,3}",
        body in arb_body(),
        trail in "[ \n\t]{0,3}",
    ) {
        let raw = format!("{lead}{body}{trail}");
        let source = extract(&raw);
        prop_assert_eq!(source.as_str(), expected(&body));
    }

    #[test]
    fn output_always_has_markers(raw in any::<String>()) {
        let source = extract(&raw);
        prop_assert!(source.as_str().starts_with(START_MARKER));
        prop_assert!(source.as_str().ends_with(END_MARKER));
    }
}
