use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Last known analysis state of one file.
///
/// `clean == true` means the file produced no error-severity findings when it
/// was analyzed with modification time `modified_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Epoch milliseconds.
    #[serde(alias = "updatedAt")]
    pub modified_at: u64,
    #[serde(alias = "linted")]
    pub clean: bool,
}

impl FileRecord {
    pub fn new(path: PathBuf, modified_at: u64, clean: bool) -> Self {
        Self {
            path,
            modified_at,
            clean,
        }
    }

    /// First sighting of a path: known timestamp, never verified clean.
    pub fn unverified(path: PathBuf, modified_at: u64) -> Self {
        Self::new(path, modified_at, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub rule: Option<String>,
}

impl Finding {
    pub fn error(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            line,
            column,
            message: message.into(),
            rule: None,
        }
    }

    pub fn warning(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            line,
            column,
            message: message.into(),
            rule: None,
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

/// What the analysis engine says about one file's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    pub error_count: usize,
    pub warning_count: usize,
    pub findings: Vec<Finding>,
}

impl AnalysisReport {
    /// Build a report whose counts agree with its findings.
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let error_count = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        Self {
            error_count,
            warning_count: findings.len() - error_count,
            findings,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Read,
    Analysis,
}

/// The file could not be analyzed at all, as opposed to analysis finding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Analyzed(AnalysisReport),
    Failed(FileFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub record: FileRecord,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn findings(&self) -> &[Finding] {
        match &self.outcome {
            FileOutcome::Analyzed(report) => &report.findings,
            FileOutcome::Failed(_) => &[],
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(&self.outcome, FileOutcome::Analyzed(report) if report.has_errors())
    }

    pub fn failure(&self) -> Option<&FileFailure> {
        match &self.outcome {
            FileOutcome::Failed(failure) => Some(failure),
            FileOutcome::Analyzed(_) => None,
        }
    }
}

/// Outcome of one classify -> analyze -> persist pass.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Paths the classifier marked dirty, in enumeration order.
    pub work_set: Vec<PathBuf>,
    /// One entry per analyzed (or failed) file, in enumeration order.
    pub files: Vec<FileReport>,
    pub has_blocking_findings: bool,
    /// Set when the cache could not be written; the next run repeats this work.
    pub cache_warning: Option<String>,
}

impl BatchResult {
    pub fn error_count(&self) -> usize {
        self.reports().map(|r| r.error_count).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.reports().map(|r| r.warning_count).sum()
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.failure().is_some())
    }

    pub fn file(&self, path: &Path) -> Option<&FileReport> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn is_clean(&self) -> bool {
        !self.has_blocking_findings && self.failed_files().next().is_none()
    }

    fn reports(&self) -> impl Iterator<Item = &AnalysisReport> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Analyzed(report) => Some(report),
            FileOutcome::Failed(_) => None,
        })
    }
}
