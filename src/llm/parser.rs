//! Response parsing for LLM outputs.
//!
//! Models are asked to return only code, but in practice wrap it in
//! markdown fences anyway. This extracts the script text from fenced blocks
//! when present and falls back to the raw response otherwise.

/// Extracts the generated script from an LLM response.
///
/// Looks for code in the following formats, in order:
/// - ```rhai ... ```
/// - ``` ... ``` (no language specified)
///
/// If multiple code blocks are found, the first one wins. If no fence is
/// found, the whole trimmed response is treated as code.
pub fn extract_code(response: &str) -> String {
    if let Some(code) = extract_code_block(response, "rhai") {
        return code.trim().to_string();
    }

    if let Some(code) = extract_code_block(response, "") {
        return code.trim().to_string();
    }

    response.trim().to_string()
}

/// Extracts content from a markdown code block with the specified language.
///
/// Pass an empty string for `lang` to match blocks without a language
/// specifier.
fn extract_code_block(text: &str, lang: &str) -> Option<String> {
    let start_pattern = if lang.is_empty() {
        "```".to_string()
    } else {
        format!("```{}", lang)
    };

    // Find the start of the code block
    let start_idx = text.find(&start_pattern)?;

    // Find the newline after the opening fence
    let content_start = text[start_idx + start_pattern.len()..]
        .find('\n')
        .map(|i| start_idx + start_pattern.len() + i + 1)?;

    // For generic blocks, make sure it's not actually a language-specific block
    if lang.is_empty() {
        let after_fence = &text[start_idx + 3..content_start - 1];
        if !after_fence.trim().is_empty() {
            return None;
        }
    }

    // Find the closing fence
    let end_idx = text[content_start..].find("```")?;

    Some(text[content_start..content_start + end_idx].to_string())
}
