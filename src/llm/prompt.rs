//! Prompt construction for code-generation requests.
//!
//! Builds the instruction prompt with the table structure injected so the
//! model grounds its script in the actual columns.

use crate::llm::types::Message;
use crate::table::TableStructure;

/// System prompt template for the analysis-code generator.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a data analysis assistant. Generate Rhai scripts that analyze an in-memory table based on user instructions.

TABLE STRUCTURE:
{structure}

INSTRUCTIONS:
- The data is available as the variable `{binding}`: an array of maps, one map per row, keyed by column name.
- Missing cells hold the unit value `()`.
- Use only the columns listed above; do not assume other columns exist.
- Assign the final answer to a variable named `result`.
- Do not attempt any file, network, or system access.
- Return ONLY the Rhai script, no explanations.

OUTPUT FORMAT:
Return the script wrapped in ```rhai code blocks."#;

/// Builds the system prompt with the table structure and binding injected.
pub fn build_system_prompt(structure: &TableStructure, binding: &str) -> String {
    SYSTEM_PROMPT_TEMPLATE
        .replace("{structure}", &structure.format_for_llm())
        .replace("{binding}", binding)
}

/// Builds the complete message list for a code-generation request.
pub fn build_messages(instruction: &str, structure: &TableStructure, binding: &str) -> Vec<Message> {
    vec![
        Message::system(build_system_prompt(structure, binding)),
        Message::user(instruction),
    ]
}
