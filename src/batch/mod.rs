//! Batch query execution for Tabsight.
//!
//! Parses a query file into ordered, sectioned queries, drives the code
//! generator and executor for each one, accumulates outcomes into a
//! finalized report and serializes that report to disk.

mod export;
mod queries;
mod report;
mod runner;

pub use export::{from_json, read_json, to_json, write_json};
pub use queries::{load_queries, parse_queries, Query};
pub use report::{BatchReport, Outcome, QueryRecord, ReportBuilder};
pub use runner::{BatchRunner, RunState};
