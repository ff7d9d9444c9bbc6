//! Prompts sent to the completion endpoint

use crate::diagram::DiagramSource;

const GENERATION_PROMPT: &str = r"You are a software architect. Model the following requirements as a PlantUML diagram.
Choose the diagram type that fits the requirements best (use case, class, sequence or activity).
Answer with the complete diagram in a single ```plantuml fenced code block, starting with @startuml and ending with @enduml.

Requirements:";

const REFINEMENT_PROMPT: &str = r"Here is the current PlantUML diagram:";

const REFINEMENT_INSTRUCTIONS: &str = r"Apply the change below to the diagram. Keep everything else unchanged.
Answer with the complete updated diagram in a single ```plantuml fenced code block, starting with @startuml and ending with @enduml.

Change:";

/// Prompt asking for an initial diagram of the flattened document
pub fn generation_prompt(document_text: &str) -> String {
    format!("{GENERATION_PROMPT}\n{}", document_text.trim())
}

/// Prompt asking to apply `instruction` to the current diagram
pub fn refinement_prompt(source: &DiagramSource, instruction: &str) -> String {
    format!(
        "{REFINEMENT_PROMPT}\n```plantuml\n{source}\n```\n\n{REFINEMENT_INSTRUCTIONS}\n{}",
        instruction.trim()
    )
}

/// Chat answer recorded when the completion endpoint could not be reached
pub fn completion_failure_answer(message: &str) -> String {
    format!("Error calling the completion endpoint: {message}")
}
