use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single message emitted by a validation pass.
///
/// Findings render as `"<file>: <message>"` (or just the message when no file
/// is attached) and serialize to that same string, so JSON consumers see flat
/// string arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub file: Option<PathBuf>,
    pub line: Option<usize>,
    pub message: String,
}

impl Finding {
    pub fn new(message: impl Into<String>) -> Self {
        Finding {
            file: None,
            line: None,
            message: message.into(),
        }
    }

    pub fn at(file: &Path, message: impl Into<String>) -> Self {
        Finding {
            file: Some(file.to_path_buf()),
            line: None,
            message: message.into(),
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {}", file.display(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl serde::Serialize for Finding {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Output of one validation pass.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationResult {
    pub name: String,
    pub passed: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub info: Vec<Finding>,
}

impl ValidationResult {
    pub fn new(name: &str) -> Self {
        ValidationResult {
            name: name.to_string(),
            passed: true,
            errors: vec![],
            warnings: vec![],
            info: vec![],
        }
    }

    pub fn error(&mut self, finding: Finding) {
        self.errors.push(finding);
    }

    pub fn warning(&mut self, finding: Finding) {
        self.warnings.push(finding);
    }

    pub fn note(&mut self, finding: Finding) {
        self.info.push(finding);
    }

    /// Appends `finding` to the stream matching `severity`.
    pub fn push(&mut self, severity: Severity, finding: Finding) {
        match severity {
            Severity::Error => self.error(finding),
            Severity::Warning => self.warning(finding),
            Severity::Info => self.note(finding),
        }
    }

    pub fn findings(&self, severity: Severity) -> &[Finding] {
        match severity {
            Severity::Error => &self.errors,
            Severity::Warning => &self.warnings,
            Severity::Info => &self.info,
        }
    }
}

/// Aggregate of every pass executed in one run.
#[derive(Debug, serde::Serialize)]
pub struct ValidatorReport {
    pub timestamp: String,
    pub validators_run: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub results: Vec<ValidationResult>,
}

impl Default for ValidatorReport {
    fn default() -> Self {
        ValidatorReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            validators_run: 0,
            total_errors: 0,
            total_warnings: 0,
            results: vec![],
        }
    }
}

impl ValidatorReport {
    /// Records a pass result, forcing `passed` to match its error stream.
    pub fn log_result(&mut self, mut result: ValidationResult) {
        result.passed = result.errors.is_empty();
        self.total_errors += result.errors.len();
        self.total_warnings += result.warnings.len();
        self.validators_run += 1;
        self.results.push(result);
    }

    pub fn all_passed(&self) -> bool {
        self.total_errors == 0 && self.results.iter().all(|r| r.passed)
    }

    pub fn info_count(&self) -> usize {
        self.results.iter().map(|r| r.info.len()).sum()
    }

    pub fn result(&self, name: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

/// Outcome of rewriting (or planning to rewrite) one file or directory.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FixResult {
    pub file_path: PathBuf,
    pub fixed: bool,
    pub changes: Vec<String>,
    pub errors: Vec<String>,
}

impl FixResult {
    pub fn new(file_path: &Path) -> Self {
        FixResult {
            file_path: file_path.to_path_buf(),
            ..Default::default()
        }
    }
}
