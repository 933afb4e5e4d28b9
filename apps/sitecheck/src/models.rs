//! Shared data models for scan/fix results and the final run report.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
/// Severity attached to a finding. `Error` blocks publishing, `Warning`
/// and `Info` do not.
pub enum Severity {
    Info,
    Warning,
    Error,
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

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// File classification derived from the extension. Only `Html` receives
/// structural fixes; every kind is secret-scanned.
pub enum FileKind {
    Html,
    Css,
    Script,
    Markdown,
    Other,
}

impl FileKind {
    pub fn from_path(path: &Path) -> FileKind {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "html" | "htm" => FileKind::Html,
            "css" => FileKind::Css,
            "js" | "mjs" => FileKind::Script,
            "md" | "markdown" => FileKind::Markdown,
            _ => FileKind::Other,
        }
    }
}

#[derive(Clone, Debug)]
/// A file selected for processing: absolute path plus its display form
/// relative to the scan root.
pub struct ScanTarget {
    pub path: PathBuf,
    pub rel: String,
    pub kind: FileKind,
}

#[derive(Serialize, Clone, Debug)]
/// A single finding with severity and location.
pub struct Finding {
    pub file: String,
    pub rule: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub suppressed: bool,
    pub message: String,
}

#[derive(Serialize, Clone, Debug)]
/// One applied (or planned) repair. At most one per rule per file.
pub struct FixAction {
    pub file: String,
    pub rule: String,
    pub message: String,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// Per-file outcome shown as the one-line progress entry.
pub enum FileStatus {
    Clean,
    Findings,
    Fixed,
}

#[derive(Serialize, Clone, Debug)]
/// One processed file and how it came out.
pub struct FileReport {
    pub file: String,
    pub status: FileStatus,
}

#[derive(Serialize, Clone, Copy, Debug, Default)]
/// Aggregated run summary used by printers and the verdict.
pub struct RunSummary {
    pub errors: usize,
    pub warnings: usize,
    pub suppressed: usize,
    pub fixes: usize,
    pub files: usize,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Publish gate derived from the summary.
pub enum Verdict {
    Passed,
    PassedWithWarnings,
    Blocked,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => write!(f, "passed"),
            Verdict::PassedWithWarnings => write!(f, "passed_with_warnings"),
            Verdict::Blocked => write!(f, "blocked"),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
/// Final run report: everything the printers and `--report` emit.
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub findings: Vec<Finding>,
    pub fixes: Vec<FixAction>,
    pub summary: RunSummary,
    pub verdict: Verdict,
}
