//! Report serialization.
//!
//! Serializes a finalized report to pretty-printed JSON. Serialization is
//! deterministic (struct field order, one record per query in run order),
//! so exporting the same report twice yields byte-equal output, and
//! re-reading a serialized report recovers equal records and counters.

use std::path::Path;

use crate::batch::report::BatchReport;
use crate::error::{Result, TabsightError};

/// Serializes a finalized report to a JSON string.
pub fn to_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| TabsightError::export(format!("Failed to serialize report: {e}")))
}

/// Deserializes a report from a JSON string.
pub fn from_json(json: &str) -> Result<BatchReport> {
    serde_json::from_str(json)
        .map_err(|e| TabsightError::export(format!("Failed to parse report: {e}")))
}

/// Writes a finalized report to disk, creating parent directories as needed.
pub fn write_json(report: &BatchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TabsightError::export(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
    }

    let json = to_json(report)?;
    std::fs::write(path, json)
        .map_err(|e| TabsightError::export(format!("Failed to write {}: {}", path.display(), e)))
}

/// Reads a previously exported report back from disk.
pub fn read_json(path: &Path) -> Result<BatchReport> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| TabsightError::export(format!("Failed to read {}: {}", path.display(), e)))?;
    from_json(&json)
}
