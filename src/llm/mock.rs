//! Mock code generator for testing.
//!
//! Provides deterministic scripts based on input patterns, without making
//! real API calls.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Result, TabsightError};
use crate::llm::types::GeneratedCode;
use crate::llm::CodeGenerator;
use crate::table::TableStructure;

/// Model name reported by the mock.
const MOCK_MODEL: &str = "mock";

/// Mock code generator that returns canned scripts based on input patterns.
///
/// Used for unit testing and offline runs (`--mock-llm`).
#[derive(Debug, Clone, Default)]
pub struct MockCodeGenerator {
    /// Custom response mappings (pattern -> script).
    custom_responses: Vec<(String, String)>,
    /// Patterns that simulate a generation failure.
    failing_patterns: Vec<String>,
}

impl MockCodeGenerator {
    /// Creates a new mock generator with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the instruction contains `pattern`, the mock returns `script`.
    pub fn with_response(mut self, pattern: impl Into<String>, script: impl Into<String>) -> Self {
        self.custom_responses.push((pattern.into(), script.into()));
        self
    }

    /// Makes instructions containing `pattern` fail with a generation error.
    pub fn with_failure(mut self, pattern: impl Into<String>) -> Self {
        self.failing_patterns.push(pattern.into());
        self
    }

    /// Generates a mock script based on the instruction.
    fn mock_script(&self, instruction: &str, structure: &TableStructure) -> String {
        let instruction_lower = instruction.to_lowercase();

        // Check custom responses first
        for (pattern, script) in &self.custom_responses {
            if instruction_lower.contains(&pattern.to_lowercase()) {
                return script.clone();
            }
        }

        // Default pattern matching
        if instruction_lower.contains("count") {
            return "let result = table.len();".to_string();
        }

        if instruction_lower.contains("column") {
            return "let result = if table.len() > 0 { table[0].keys() } else { [] };".to_string();
        }

        if instruction_lower.contains("first") {
            return "let result = if table.len() > 0 { table[0] } else { () };".to_string();
        }

        // Fall back to summing the first numeric column, if there is one
        if let Some(column) = structure
            .columns
            .iter()
            .find(|c| matches!(c.ty, crate::table::ColumnType::Integer | crate::table::ColumnType::Real))
        {
            return format!(
                "let total = 0.0;\nfor row in table {{\n    if row[\"{name}\"] != () {{ total += row[\"{name}\"]; }}\n}}\nlet result = total;",
                name = column.name
            );
        }

        "let result = table.len();".to_string()
    }
}

#[async_trait]
impl CodeGenerator for MockCodeGenerator {
    async fn generate(
        &self,
        instruction: &str,
        structure: &TableStructure,
    ) -> Result<GeneratedCode> {
        let instruction_lower = instruction.to_lowercase();
        for pattern in &self.failing_patterns {
            if instruction_lower.contains(&pattern.to_lowercase()) {
                return Err(TabsightError::generation(format!(
                    "Mock generation failure for pattern '{}'",
                    pattern
                )));
            }
        }

        Ok(GeneratedCode {
            code: self.mock_script(instruction, structure),
            model: MOCK_MODEL.to_string(),
            latency: Duration::ZERO,
            prompt_tokens: 0,
            completion_tokens: 0,
        })
    }
}
