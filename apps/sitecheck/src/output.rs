//! Output rendering for scan and fix commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form serializes
//! the full run report; human output lists one status line per processed
//! file, then findings, then fixes, then a one-line summary with the
//! verdict.

use crate::models::{FileReport, FileStatus, Finding, RunReport, Severity};
use crate::pipeline::FixPreview;
use owo_colors::OwoColorize;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Print a finished run in the requested format. `wrote` selects the label
/// for fix lines: applied fixes versus planned ones in --check/--diff runs.
pub fn print_report(report: &RunReport, output: &str, wrote: bool) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_report_json(report)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for fr in &report.files {
                print_file_line(fr, color);
            }
            for f in &report.findings {
                print_finding(f, color);
            }
            let label = if wrote { "✚ fixed:" } else { "✚ would fix:" };
            for fx in &report.fixes {
                if color {
                    println!(
                        "{} {} ❲{}❳ — {}",
                        label.green().bold(),
                        fx.file.bold(),
                        fx.rule,
                        fx.message
                    );
                } else {
                    println!("{} {} ❲{}❳ — {}", label, fx.file, fx.rule, fx.message);
                }
            }
            let summary = format!(
                "— Summary — errors={} warnings={} suppressed={} fixes={} files={} verdict={}",
                report.summary.errors,
                report.summary.warnings,
                report.summary.suppressed,
                report.summary.fixes,
                report.summary.files,
                report.verdict
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// One progress line per processed file.
pub fn compose_file_line(fr: &FileReport) -> String {
    let icon = match fr.status {
        FileStatus::Clean => "✔",
        FileStatus::Findings => "✖",
        FileStatus::Fixed => "✚",
    };
    format!("{} {}", icon, fr.file)
}

fn print_file_line(fr: &FileReport, color: bool) {
    let line = compose_file_line(fr);
    if !color {
        println!("{}", line);
        return;
    }
    match fr.status {
        FileStatus::Clean => println!("{}", line.green()),
        FileStatus::Findings => println!("{}", line.red()),
        FileStatus::Fixed => println!("{}", line.green().bold()),
    }
}

fn print_finding(f: &Finding, color: bool) {
    let tag = match f.severity {
        Severity::Error => "⟦error⟧",
        Severity::Warning => "⟦warn⟧",
        Severity::Info => "⟦info⟧",
    };
    let icon = match f.severity {
        Severity::Error => "✖",
        Severity::Warning => "▲",
        Severity::Info => "◆",
    };
    let loc = match f.line {
        Some(n) => format!("{}:{}", f.file, n),
        None => f.file.clone(),
    };
    let mut tail = f.message.clone();
    if let Some(ex) = &f.excerpt {
        tail.push_str(&format!(" (\"{}\")", ex));
    }
    if f.suppressed {
        let line = format!("{} {} {} ❲{}❳ — {} (allowlisted)", icon, tag, loc, f.rule, tail);
        if color {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
        return;
    }
    if color {
        let (icon, tag) = match f.severity {
            Severity::Error => (icon.red().to_string(), tag.red().bold().to_string()),
            Severity::Warning => (icon.yellow().to_string(), tag.yellow().bold().to_string()),
            Severity::Info => (icon.blue().to_string(), tag.blue().bold().to_string()),
        };
        println!("{} {} {} ❲{}❳ — {}", icon, tag, loc.bold(), f.rule, tail);
    } else {
        println!("{} {} {} ❲{}❳ — {}", icon, tag, loc, f.rule, tail);
    }
}

/// Print naive diffs for planned rewrites (`fix --diff`). JSON runs carry
/// the planned fixes in the report instead.
pub fn print_previews(previews: &[FixPreview], output: &str) {
    if output == "json" {
        return;
    }
    let color = use_colors(output);
    for p in previews {
        let d = build_naive_diff(&p.original, &p.planned);
        if color {
            println!("{} {}\n{}", "---".cyan().bold(), p.file.bold(), d);
        } else {
            println!("--- {}\n{}", p.file, d);
        }
    }
}

fn build_naive_diff(old: &str, new: &str) -> String {
    let mut out = String::new();
    out.push_str("+++ planned\n");
    out.push_str(new);
    if !new.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("--- current\n");
    out.push_str(old);
    out
}

/// Compose the report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &RunReport) -> JsonVal {
    serde_json::to_value(report).unwrap()
}

/// Write the JSON report to `path`, independent of the console output mode.
pub fn write_report_file(path: &Path, report: &RunReport) -> std::io::Result<()> {
    let mut body = serde_json::to_string_pretty(&compose_report_json(report)).unwrap();
    body.push('\n');
    std::fs::write(path, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FixAction, Verdict};
    use crate::report::finalize;

    #[test]
    fn test_compose_report_json_shape() {
        let findings = vec![
            Finding {
                file: "notes.md".into(),
                rule: "private-key".into(),
                severity: Severity::Error,
                line: Some(4),
                excerpt: Some("----…".into()),
                suppressed: false,
                message: "matches secret pattern 'private-key'".into(),
            },
            Finding {
                file: "index.html".into(),
                rule: "description".into(),
                severity: Severity::Warning,
                line: None,
                excerpt: None,
                suppressed: false,
                message: "missing description meta".into(),
            },
        ];
        let fixes = vec![FixAction {
            file: "index.html".into(),
            rule: "encoding".into(),
            message: "inserted <meta charset=\"utf-8\">".into(),
        }];
        let report = finalize(
            findings,
            fixes,
            vec!["index.html".into(), "notes.md".into()],
        );
        let out = compose_report_json(&report);
        assert_eq!(out["summary"]["errors"], 1);
        assert_eq!(out["summary"]["fixes"], 1);
        assert_eq!(out["verdict"], "blocked");
        assert_eq!(out["files"][0]["file"], "index.html");
        assert_eq!(out["files"][1]["status"], "findings");
        // Findings are sorted by file; index.html precedes notes.md.
        assert_eq!(out["findings"][0]["file"], "index.html");
        assert_eq!(out["findings"][1]["line"], 4);
        assert_eq!(out["findings"][1]["excerpt"], "----…");
        // Absent line/excerpt keys are omitted, not null.
        assert!(out["findings"][0].get("line").is_none());
        assert_eq!(out["fixes"][0]["rule"], "encoding");
    }

    #[test]
    fn test_verdict_serializes_snake_case() {
        let report = finalize(
            vec![Finding {
                file: "a.html".into(),
                rule: "inline-style".into(),
                severity: Severity::Warning,
                line: None,
                excerpt: None,
                suppressed: false,
                message: "m".into(),
            }],
            vec![],
            vec!["a.html".into()],
        );
        assert_eq!(report.verdict, Verdict::PassedWithWarnings);
        let out = compose_report_json(&report);
        assert_eq!(out["verdict"], "passed_with_warnings");
    }

    #[test]
    fn test_file_lines_show_status_icons() {
        let clean = finalize(vec![], vec![], vec!["about.html".into()]);
        assert_eq!(compose_file_line(&clean.files[0]), "✔ about.html");

        let fixed = finalize(
            vec![],
            vec![FixAction {
                file: "index.html".into(),
                rule: "encoding".into(),
                message: "m".into(),
            }],
            vec!["index.html".into()],
        );
        assert_eq!(compose_file_line(&fixed.files[0]), "✚ index.html");

        let flagged = finalize(
            vec![Finding {
                file: "notes.md".into(),
                rule: "private-key".into(),
                severity: Severity::Error,
                line: Some(1),
                excerpt: None,
                suppressed: false,
                message: "m".into(),
            }],
            vec![],
            vec!["notes.md".into()],
        );
        assert_eq!(compose_file_line(&flagged.files[0]), "✖ notes.md");
    }

    #[test]
    fn test_naive_diff_layout() {
        let d = build_naive_diff("<html>\n", "<html lang=\"en\">\n");
        assert_eq!(d, "+++ planned\n<html lang=\"en\">\n--- current\n<html>\n");
    }
}
