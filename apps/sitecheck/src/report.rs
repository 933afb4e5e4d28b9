//! Report aggregation: fold findings and fixes into a summary and the
//! publish verdict.
//!
//! Suppressed findings stay in the report for review but never count.
//! The verdict is `Blocked` on any live Error, `PassedWithWarnings` when
//! only warnings remain, `Passed` otherwise. Exit codes: 0 for both passing
//! verdicts, 1 for `Blocked`; configuration problems exit 2 upstream before
//! a report exists.

use crate::models::{
    FileReport, FileStatus, Finding, FixAction, RunReport, RunSummary, Severity, Verdict,
};

pub fn summarize(findings: &[Finding], fixes: &[FixAction], files: usize) -> RunSummary {
    let mut errors = 0usize;
    let mut warnings = 0usize;
    let mut suppressed = 0usize;
    for f in findings {
        if f.suppressed {
            suppressed += 1;
            continue;
        }
        match f.severity {
            Severity::Error => errors += 1,
            Severity::Warning => warnings += 1,
            Severity::Info => {}
        }
    }
    RunSummary {
        errors,
        warnings,
        suppressed,
        fixes: fixes.len(),
        files,
    }
}

pub fn verdict(summary: &RunSummary) -> Verdict {
    if summary.errors > 0 {
        Verdict::Blocked
    } else if summary.warnings > 0 {
        Verdict::PassedWithWarnings
    } else {
        Verdict::Passed
    }
}

/// Stable ordering for output: file, then line, then rule id.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.line.unwrap_or(0).cmp(&b.line.unwrap_or(0)))
            .then(a.rule.cmp(&b.rule))
    });
}

/// Fix actions keep their per-file application order; files are sorted.
pub fn sort_fixes(fixes: &mut [FixAction]) {
    fixes.sort_by(|a, b| a.file.cmp(&b.file));
}

/// One status entry per processed file: live findings win over fixes, fixes
/// over clean. Entries come out sorted by path.
pub fn file_reports(
    processed: Vec<String>,
    findings: &[Finding],
    fixes: &[FixAction],
) -> Vec<FileReport> {
    let mut out: Vec<FileReport> = processed
        .into_iter()
        .map(|file| {
            let status = if findings.iter().any(|f| f.file == file && !f.suppressed) {
                FileStatus::Findings
            } else if fixes.iter().any(|x| x.file == file) {
                FileStatus::Fixed
            } else {
                FileStatus::Clean
            };
            FileReport { file, status }
        })
        .collect();
    out.sort_by(|a, b| a.file.cmp(&b.file));
    out
}

pub fn finalize(
    mut findings: Vec<Finding>,
    mut fixes: Vec<FixAction>,
    processed: Vec<String>,
) -> RunReport {
    sort_findings(&mut findings);
    sort_fixes(&mut fixes);
    let files = file_reports(processed, &findings, &fixes);
    let summary = summarize(&findings, &fixes, files.len());
    let verdict = verdict(&summary);
    RunReport {
        files,
        findings,
        fixes,
        summary,
        verdict,
    }
}

pub fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Blocked => 1,
        Verdict::Passed | Verdict::PassedWithWarnings => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(file: &str, rule: &str, severity: Severity, suppressed: bool) -> Finding {
        Finding {
            file: file.into(),
            rule: rule.into(),
            severity,
            line: None,
            excerpt: None,
            suppressed,
            message: "m".into(),
        }
    }

    #[test]
    fn test_unsuppressed_error_blocks() {
        let report = finalize(
            vec![finding("a.md", "private-key", Severity::Error, false)],
            vec![],
            vec!["a.md".into()],
        );
        assert_eq!(report.verdict, Verdict::Blocked);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(exit_code(report.verdict), 1);
    }

    #[test]
    fn test_suppressed_error_does_not_count() {
        let report = finalize(
            vec![finding("a.md", "private-key", Severity::Error, true)],
            vec![],
            vec!["a.md".into()],
        );
        assert_eq!(report.verdict, Verdict::Passed);
        assert_eq!(report.summary.errors, 0);
        assert_eq!(report.summary.suppressed, 1);
        assert_eq!(exit_code(report.verdict), 0);
        // Still present for review; the file line shows clean.
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.files[0].status, FileStatus::Clean);
    }

    #[test]
    fn test_warnings_only_pass_with_warnings() {
        let report = finalize(
            vec![finding("a.html", "description", Severity::Warning, false)],
            vec![],
            vec!["a.html".into()],
        );
        assert_eq!(report.verdict, Verdict::PassedWithWarnings);
        assert_eq!(exit_code(report.verdict), 0);
    }

    #[test]
    fn test_clean_run_passes() {
        let report = finalize(
            vec![],
            vec![],
            vec!["a.html".into(), "b.css".into(), "c.md".into()],
        );
        assert_eq!(report.verdict, Verdict::Passed);
        assert_eq!(report.summary.files, 3);
        assert!(report.files.iter().all(|f| f.status == FileStatus::Clean));
    }

    #[test]
    fn test_file_statuses_rank_findings_over_fixes() {
        let findings = vec![finding("b.html", "landmark", Severity::Error, false)];
        let fixes = vec![
            FixAction {
                file: "b.html".into(),
                rule: "encoding".into(),
                message: "m".into(),
            },
            FixAction {
                file: "c.html".into(),
                rule: "encoding".into(),
                message: "m".into(),
            },
        ];
        let files = file_reports(
            vec!["c.html".into(), "a.html".into(), "b.html".into()],
            &findings,
            &fixes,
        );
        let got: Vec<(&str, FileStatus)> =
            files.iter().map(|f| (f.file.as_str(), f.status)).collect();
        assert_eq!(
            got,
            vec![
                ("a.html", FileStatus::Clean),
                ("b.html", FileStatus::Findings),
                ("c.html", FileStatus::Fixed),
            ]
        );
    }

    #[test]
    fn test_findings_sorted_by_file_line_rule() {
        let mut findings = vec![
            finding("b.html", "encoding", Severity::Error, false),
            finding("a.html", "viewport", Severity::Error, false),
            finding("a.html", "encoding", Severity::Error, false),
        ];
        findings[0].line = Some(3);
        findings[1].line = Some(2);
        findings[2].line = Some(2);
        sort_findings(&mut findings);
        let keys: Vec<(String, String)> = findings
            .iter()
            .map(|f| (f.file.clone(), f.rule.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a.html".to_string(), "encoding".to_string()),
                ("a.html".to_string(), "viewport".to_string()),
                ("b.html".to_string(), "encoding".to_string()),
            ]
        );
    }

    #[test]
    fn test_fixes_keep_rule_order_within_file() {
        let mut fixes = vec![
            FixAction {
                file: "b.html".into(),
                rule: "encoding".into(),
                message: "m".into(),
            },
            FixAction {
                file: "a.html".into(),
                rule: "viewport".into(),
                message: "m".into(),
            },
            FixAction {
                file: "a.html".into(),
                rule: "lang-attr".into(),
                message: "m".into(),
            },
        ];
        sort_fixes(&mut fixes);
        let keys: Vec<(&str, &str)> = fixes
            .iter()
            .map(|f| (f.file.as_str(), f.rule.as_str()))
            .collect();
        // Stable sort: a.html keeps viewport before lang-attr.
        assert_eq!(
            keys,
            vec![
                ("a.html", "viewport"),
                ("a.html", "lang-attr"),
                ("b.html", "encoding"),
            ]
        );
    }
}
