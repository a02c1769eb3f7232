//! Query-file parsing.
//!
//! The format is plain text, line-oriented: a line of the form
//! `[Section Name]` opens a named section for all queries below it, blank
//! lines are ignored, and every other non-blank line is one query. Queries
//! before the first section marker carry no section.
//!
//! Parsing never fails on malformed input: stray characters and broken
//! bracket syntax are treated as ordinary query text (garbage in, garbage
//! query out).

use std::path::Path;

use crate::error::{Result, TabsightError};

/// One natural-language query from a batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The instruction text.
    pub text: String,
    /// Section the query belongs to, if any.
    pub section: Option<String>,
    /// 1-based position among the file's queries.
    pub ordinal: usize,
}

/// Reads and parses a query file.
pub fn load_queries(path: &Path) -> Result<Vec<Query>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TabsightError::load(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(parse_queries(&content))
}

/// Parses query-file content into ordered, sectioned queries.
pub fn parse_queries(content: &str) -> Vec<Query> {
    let mut queries = Vec::new();
    let mut current_section: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
            current_section = Some(line[1..line.len() - 1].trim().to_string());
            continue;
        }

        queries.push(Query {
            text: line.to_string(),
            section: current_section.clone(),
            ordinal: queries.len() + 1,
        });
    }

    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_and_order() {
        let content = "\
[Employee & Work Insights]
Average salary by team.
Who works the most hours?

[Finance]
Total spend per quarter.
";
        let queries = parse_queries(content);

        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].text, "Average salary by team.");
        assert_eq!(
            queries[0].section.as_deref(),
            Some("Employee & Work Insights")
        );
        assert_eq!(queries[1].text, "Who works the most hours?");
        assert_eq!(queries[2].section.as_deref(), Some("Finance"));
        assert_eq!(
            queries.iter().map(|q| q.ordinal).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_queries_before_first_section_have_none() {
        let queries = parse_queries("Count the rows.\n[Later]\nSecond query.\n");

        assert_eq!(queries[0].section, None);
        assert_eq!(queries[1].section.as_deref(), Some("Later"));
    }

    #[test]
    fn test_blank_lines_ignored() {
        let queries = parse_queries("\n\nFirst.\n\n\nSecond.\n\n");
        assert_eq!(queries.len(), 2);
    }

    #[test]
    fn test_malformed_brackets_are_query_text() {
        let queries = parse_queries("[unclosed section\nnot a section]\n");

        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].text, "[unclosed section");
        assert_eq!(queries[1].text, "not a section]");
        assert_eq!(queries[0].section, None);
    }

    #[test]
    fn test_section_name_is_trimmed() {
        let queries = parse_queries("[  Spaced Out  ]\nquery\n");
        assert_eq!(queries[0].section.as_deref(), Some("Spaced Out"));
    }

    #[test]
    fn test_empty_section_marker() {
        let queries = parse_queries("[]\nquery\n");
        assert_eq!(queries[0].section.as_deref(), Some(""));
    }

    #[test]
    fn test_empty_input_yields_no_queries() {
        assert!(parse_queries("").is_empty());
        assert!(parse_queries("\n\n[Only A Section]\n\n").is_empty());
    }

    #[test]
    fn test_load_missing_file_is_load_error() {
        let err = load_queries(Path::new("/nonexistent/queries.txt")).unwrap_err();
        assert_eq!(err.category(), "Load Error");
    }
}
