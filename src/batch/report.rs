//! Batch report types.
//!
//! A report is built incrementally while the batch runs and finalized
//! exactly once; the finalized [`BatchReport`] is read-only and is what the
//! exporter serializes. The builder-to-report split is what enforces that
//! lifecycle: only [`ReportBuilder`] can append, and finalization consumes
//! it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::batch::queries::Query;

/// Result of executing one query's generated code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    /// Generation and execution both completed.
    Success {
        /// Display form of the value the script assigned to `result`.
        result_summary: String,
        /// The script that produced it.
        generated_code: String,
        /// Wall-clock time of the generation call.
        latency_seconds: f64,
        /// Tokens consumed by the prompt.
        prompt_tokens: u32,
        /// Tokens in the completion.
        completion_tokens: u32,
    },
    /// Generation or execution failed.
    Failure {
        /// What went wrong.
        error_message: String,
        /// The generated script, or empty if generation itself failed.
        generated_code: String,
        /// Wall-clock time of the generation call (zero if it failed).
        latency_seconds: f64,
    },
}

impl Outcome {
    /// Returns true for the success variant.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One query paired with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Section the query belonged to, if any.
    pub section: Option<String>,
    /// The original query text.
    pub query: String,
    /// What happened when it ran.
    pub outcome: Outcome,
}

/// Finalized batch report: ordered records plus summary counters.
///
/// Construct through [`ReportBuilder`]; deserialize through the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    total: usize,
    succeeded: usize,
    failed: usize,
    duration_seconds: f64,
    records: Vec<QueryRecord>,
}

impl BatchReport {
    /// Records in original query order.
    pub fn records(&self) -> &[QueryRecord] {
        &self.records
    }

    /// Total number of queries recorded.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of successful queries.
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Number of failed queries.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Total wall-clock duration of the run, in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Success rate in percent (zero for an empty report).
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

/// Accumulates records during a run; consumed by finalization.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    records: Vec<QueryRecord>,
}

impl ReportBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one query's outcome, preserving insertion order.
    pub fn push(&mut self, query: &Query, outcome: Outcome) {
        self.records.push(QueryRecord {
            section: query.section.clone(),
            query: query.text.clone(),
            outcome,
        });
    }

    /// Number of records accumulated so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Computes the counters and produces the read-only report.
    pub fn finalize(self, duration: Duration) -> BatchReport {
        let succeeded = self.records.iter().filter(|r| r.outcome.is_success()).count();
        let failed = self.records.len() - succeeded;

        BatchReport {
            total: self.records.len(),
            succeeded,
            failed,
            duration_seconds: duration.as_secs_f64(),
            records: self.records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(text: &str, section: Option<&str>, ordinal: usize) -> Query {
        Query {
            text: text.to_string(),
            section: section.map(String::from),
            ordinal,
        }
    }

    fn success() -> Outcome {
        Outcome::Success {
            result_summary: "42".to_string(),
            generated_code: "let result = 42;".to_string(),
            latency_seconds: 0.31,
            prompt_tokens: 100,
            completion_tokens: 10,
        }
    }

    fn failure() -> Outcome {
        Outcome::Failure {
            error_message: "runtime error: division by zero".to_string(),
            generated_code: "let result = 1 / 0;".to_string(),
            latency_seconds: 0.27,
        }
    }

    #[test]
    fn test_counters_match_records() {
        let mut builder = ReportBuilder::new();
        builder.push(&query("a", None, 1), success());
        builder.push(&query("b", Some("S"), 2), failure());
        builder.push(&query("c", Some("S"), 3), success());

        let report = builder.finalize(Duration::from_secs(2));

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.total(), report.succeeded() + report.failed());
        assert_eq!(report.total(), report.records().len());
        assert_eq!(report.duration_seconds(), 2.0);
    }

    #[test]
    fn test_record_order_is_insertion_order() {
        let mut builder = ReportBuilder::new();
        for (i, text) in ["first", "second", "third"].iter().enumerate() {
            builder.push(&query(text, None, i + 1), success());
        }

        let report = builder.finalize(Duration::ZERO);
        let texts: Vec<&str> = report.records().iter().map(|r| r.query.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_report_finalizes_with_zero_counters() {
        let report = ReportBuilder::new().finalize(Duration::ZERO);

        assert_eq!(report.total(), 0);
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.success_rate(), 0.0);
        assert!(report.records().is_empty());
    }

    #[test]
    fn test_success_rate() {
        let mut builder = ReportBuilder::new();
        builder.push(&query("a", None, 1), success());
        builder.push(&query("b", None, 2), failure());

        let report = builder.finalize(Duration::ZERO);
        assert_eq!(report.success_rate(), 50.0);
    }

    #[test]
    fn test_outcome_kind_tagging() {
        let json = serde_json::to_string(&success()).unwrap();
        assert!(json.contains("\"kind\":\"success\""));

        let json = serde_json::to_string(&failure()).unwrap();
        assert!(json.contains("\"kind\":\"failure\""));
    }

    #[test]
    fn test_record_carries_section() {
        let mut builder = ReportBuilder::new();
        builder.push(&query("a", Some("Finance"), 1), success());
        let report = builder.finalize(Duration::ZERO);

        assert_eq!(report.records()[0].section.as_deref(), Some("Finance"));
    }
}
