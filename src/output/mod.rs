//! Output formatting for validation reports.
//!
//! Three formats are supported:
//!
//! | Format | Module | Use case |
//! |--------|--------|----------|
//! | [`Text`](OutputFormat::Text)   | [`text`]  | Terminal / human review |
//! | [`Json`](OutputFormat::Json)   | [`json`]  | Automation / CI scripts |
//! | [`Sarif`](OutputFormat::Sarif) | [`sarif`] | Code-scanning upload    |
//!
//! Use [`format_report`] to render a [`ValidatorReport`] in any of the above
//! formats. The fix and marketplace-sync summaries only have a text form,
//! see [`text::format_fix_summary`] and [`text::format_sync_summary`].

pub mod json;
pub mod sarif;
pub mod text;

use crate::finding::ValidatorReport;

/// Supported output formats for validation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored text grouped by pass.
    Text,
    /// Machine-readable JSON.
    Json,
    /// [SARIF 2.1.0](https://sarifweb.azurewebsites.net/) with one rule per pass.
    Sarif,
}

/// Formats a [`ValidatorReport`] in the requested [`OutputFormat`].
///
/// # Examples
///
/// ```rust,no_run
/// use cat_toolkit::output::{format_report, OutputFormat};
/// # use cat_toolkit::finding::ValidatorReport;
/// # fn example(report: &ValidatorReport) {
/// let json = format_report(report, OutputFormat::Json);
/// println!("{json}");
/// # }
/// ```
pub fn format_report(report: &ValidatorReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => text::format(report),
        OutputFormat::Json => json::format(report),
        OutputFormat::Sarif => sarif::format(report),
    }
}
