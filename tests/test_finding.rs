use std::path::{Path, PathBuf};

use cat_toolkit::finding::{Finding, FixResult, Severity, ValidationResult, ValidatorReport};

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

#[test]
fn finding_displays_file_prefix() {
    let f = Finding::at(Path::new("plugins/p/agents/a.md"), "bad tool").with_line(3);
    assert_eq!(f.to_string(), "plugins/p/agents/a.md: bad tool");
    assert_eq!(f.line, Some(3));
    assert_eq!(Finding::new("global").to_string(), "global");
}

#[test]
fn finding_serializes_as_string() {
    let f = Finding::at(Path::new("x.md"), "msg");
    assert_eq!(serde_json::to_value(&f).unwrap(), serde_json::json!("x.md: msg"));
}

#[test]
fn severity_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Severity::Warning).unwrap(), "warning");
    assert_eq!(Severity::Error.to_string(), "error");
    assert!(Severity::Error < Severity::Warning);
}

// ---------------------------------------------------------------------------
// ValidationResult / ValidatorReport
// ---------------------------------------------------------------------------

#[test]
fn push_routes_by_severity() {
    let mut r = ValidationResult::new("Pass");
    r.push(Severity::Error, Finding::new("e"));
    r.push(Severity::Warning, Finding::new("w"));
    r.push(Severity::Info, Finding::new("i"));
    assert_eq!(r.findings(Severity::Error)[0].message, "e");
    assert_eq!(r.findings(Severity::Warning)[0].message, "w");
    assert_eq!(r.findings(Severity::Info)[0].message, "i");
}

#[test]
fn report_totals_and_passed_flags() {
    let mut report = ValidatorReport::default();

    let mut failing = ValidationResult::new("Failing");
    failing.error(Finding::new("e1"));
    failing.error(Finding::new("e2"));
    failing.warning(Finding::new("w"));
    report.log_result(failing);

    let mut clean = ValidationResult::new("Clean");
    clean.passed = false;
    clean.note(Finding::new("i"));
    report.log_result(clean);

    assert_eq!(report.validators_run, 2);
    assert_eq!(report.total_errors, 2);
    assert_eq!(report.total_warnings, 1);
    assert_eq!(report.info_count(), 1);
    assert!(!report.all_passed());
    assert!(!report.result("Failing").unwrap().passed);
    // `passed` always mirrors the error stream.
    assert!(report.result("Clean").unwrap().passed);
    assert!(report.result("Missing").is_none());
}

#[test]
fn warnings_alone_do_not_fail_the_run() {
    let mut report = ValidatorReport::default();
    let mut r = ValidationResult::new("Warn");
    r.warning(Finding::new("w"));
    report.log_result(r);
    assert!(report.all_passed());
}

#[test]
fn empty_report_passes() {
    assert!(ValidatorReport::default().all_passed());
}

// ---------------------------------------------------------------------------
// FixResult
// ---------------------------------------------------------------------------

#[test]
fn fix_result_starts_unfixed() {
    let r = FixResult::new(Path::new("plugins/p/skills/s/SKILL.md"));
    assert_eq!(r.file_path, PathBuf::from("plugins/p/skills/s/SKILL.md"));
    assert!(!r.fixed);
    assert!(r.changes.is_empty());
    assert!(r.errors.is_empty());
}
