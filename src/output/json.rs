//! JSON output formatter.
//!
//! Produces one pretty-printed document with the run totals and every pass
//! result. Findings are flattened to `"<file>: <message>"` strings.

use crate::finding::{ValidationResult, ValidatorReport};

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    timestamp: &'a str,
    validators_run: usize,
    total_errors: usize,
    total_warnings: usize,
    all_passed: bool,
    results: &'a [ValidationResult],
}

/// Formats a [`ValidatorReport`] as pretty-printed JSON.
pub fn format(report: &ValidatorReport) -> String {
    let output = JsonOutput {
        timestamp: &report.timestamp,
        validators_run: report.validators_run,
        total_errors: report.total_errors,
        total_warnings: report.total_warnings,
        all_passed: report.all_passed(),
        results: &report.results,
    };

    serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| format!("{{\"error\": \"JSON serialization failed: {e}\"}}"))
}
