//! Human-readable colored text formatter.
//!
//! Renders the per-pass status table, then every finding grouped by pass
//! under ERRORS, WARNINGS and INFO, then a one-line summary. The fixer and
//! marketplace-sync summaries are rendered here as well.

use crate::discovery::DiscoveryResult;
use crate::finding::{FixResult, Severity, ValidationResult, ValidatorReport};
use crate::fixer::marketplace::SyncReport;
use colored::Colorize;

fn status_icon(result: &ValidationResult) -> String {
    if !result.errors.is_empty() {
        "FAIL".red().bold().to_string()
    } else if !result.warnings.is_empty() {
        "WARN".yellow().bold().to_string()
    } else {
        "PASS".green().bold().to_string()
    }
}

/// Indents continuation lines of multi-line messages under their bullet.
fn indent_message(message: &str) -> String {
    message.replace('\n', "\n      ")
}

fn push_section(out: &mut String, report: &ValidatorReport, severity: Severity) {
    let mut groups = report
        .results
        .iter()
        .filter(|r| !r.findings(severity).is_empty())
        .peekable();
    if groups.peek().is_none() {
        return;
    }

    let (title, bullet) = match severity {
        Severity::Error => ("ERRORS".red().bold().underline(), "✗".red().to_string()),
        Severity::Warning => ("WARNINGS".yellow().bold().underline(), "!".yellow().to_string()),
        Severity::Info => ("INFO".blue().bold().underline(), "-".blue().to_string()),
    };
    out.push_str(&format!("{title}\n"));
    for result in groups {
        out.push_str(&format!("  {}:\n", result.name.bold()));
        for finding in result.findings(severity) {
            let location = match (&finding.file, finding.line) {
                (Some(f), Some(l)) => format!("{}:{}: ", f.display(), l),
                (Some(f), None) => format!("{}: ", f.display()),
                _ => String::new(),
            };
            out.push_str(&format!(
                "    {bullet} {}{}\n",
                location.dimmed(),
                indent_message(&finding.message)
            ));
        }
    }
    out.push('\n');
}

/// Formats a [`ValidatorReport`] as human-readable, ANSI-colored text.
///
/// Sections rendered (in order):
/// 1. **Header** with the run timestamp.
/// 2. **Passes**: per-pass PASS/WARN/FAIL status with counts.
/// 3. **ERRORS**, **WARNINGS**, **INFO**: findings grouped by pass.
/// 4. **Summary** line, plus a `--fix` hint when the run failed.
pub fn format(report: &ValidatorReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}\n",
        "  Cat Toolkit Validation  ".bold().on_blue().white()
    ));
    out.push_str(&format!("  Timestamp: {}\n\n", report.timestamp));

    out.push_str(&format!("{}\n", "Passes".bold().underline()));
    for result in &report.results {
        out.push_str(&format!(
            "  [{icon}] {name:<32} {e} errors, {w} warnings, {i} info\n",
            icon = status_icon(result),
            name = result.name,
            e = result.errors.len(),
            w = result.warnings.len(),
            i = result.info.len(),
        ));
    }
    out.push('\n');

    push_section(&mut out, report, Severity::Error);
    push_section(&mut out, report, Severity::Warning);
    push_section(&mut out, report, Severity::Info);

    let status_str = if report.all_passed() {
        "PASSED".green().bold().to_string()
    } else {
        "FAILED".red().bold().to_string()
    };
    out.push_str(&format!(
        "Result: {status_str}  |  {} passes, {} errors, {} warnings, {} info\n",
        report.validators_run,
        report.total_errors,
        report.total_warnings,
        report.info_count(),
    ));
    if !report.all_passed() {
        out.push_str(&format!(
            "{}\n",
            "Run with --fix to repair frontmatter and marketplace drift automatically.".dimmed()
        ));
    }

    out
}

/// Per-plugin component counts from discovery.
pub fn format_inventory(discovery: &DiscoveryResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Plugins".bold().underline()));
    for (plugin, stats) in &discovery.plugin_stats {
        out.push_str(&format!(
            "  {plugin:<32} {} skills, {} agents, {} commands, {} hook events\n",
            stats.skills, stats.agents, stats.commands, stats.hook_events
        ));
    }
    out.push_str(&format!(
        "  {} components, {} cross-plugin links\n\n",
        discovery.components.len(),
        discovery.cross_links.len()
    ));
    out
}

/// Summary of a fixer run: counts, then changes and errors per file.
pub fn format_fix_summary(results: &[FixResult], dry_run: bool) -> String {
    let mut out = String::new();
    let fixed: Vec<&FixResult> = results.iter().filter(|r| r.fixed).collect();
    let failed: Vec<&FixResult> = results.iter().filter(|r| !r.errors.is_empty()).collect();

    let title = if dry_run {
        "Fix Summary (DRY RUN)"
    } else {
        "Fix Summary"
    };
    out.push_str(&format!("\n{}\n", title.bold().underline()));
    out.push_str(&format!("  Files processed: {}\n", results.len()));
    out.push_str(&format!("  Files fixed: {}\n", fixed.len()));
    out.push_str(&format!("  Files with errors: {}\n\n", failed.len()));

    if !fixed.is_empty() {
        let heading = if dry_run {
            "CHANGES (DRY RUN - NOT APPLIED)"
        } else {
            "CHANGES MADE"
        };
        out.push_str(&format!("{}\n", heading.green().bold()));
        for result in &fixed {
            out.push_str(&format!("  {}:\n", result.file_path.display()));
            for change in &result.changes {
                out.push_str(&format!("    {} {change}\n", "✓".green()));
            }
        }
        out.push('\n');
    }

    if !failed.is_empty() {
        out.push_str(&format!("{}\n", "ERRORS".red().bold()));
        for result in &failed {
            out.push_str(&format!("  {}:\n", result.file_path.display()));
            for error in &result.errors {
                out.push_str(&format!("    {} {error}\n", "✗".red()));
            }
        }
        out.push('\n');
    }

    if fixed.is_empty() && failed.is_empty() {
        out.push_str("No fixes needed - all files are clean.\n\n");
    }
    out
}

/// Summary of a marketplace synchronization run.
pub fn format_sync_summary(report: &SyncReport, dry_run: bool) -> String {
    let mut out = String::new();
    let title = if dry_run {
        "Marketplace Sync (DRY RUN)"
    } else {
        "Marketplace Sync"
    };
    out.push_str(&format!("{}\n", title.bold().underline()));
    out.push_str(&format!(
        "  Manifests checked: {}, updated: {}\n",
        report.plugins_checked, report.plugins_synced
    ));
    for (path, changes) in &report.sanitized {
        out.push_str(&format!("  {}:\n", path.display()));
        for change in changes {
            out.push_str(&format!("    - {change}\n"));
        }
    }
    for warning in &report.warnings {
        out.push_str(&format!("  [{}] {warning}\n", "WARN".yellow().bold()));
    }
    for error in &report.errors {
        out.push_str(&format!("  [{}] {error}\n", "FAIL".red().bold()));
    }
    if report.warnings.is_empty() && report.errors.is_empty() {
        out.push_str("  Marketplace index is in sync.\n");
    }
    out.push('\n');
    out
}
