//! Run orchestration for scan and fix commands.
//!
//! A run moves through fixed phases: walk and scan every target, optionally
//! rewrite HTML files with per-file backups, rescan what was rewritten, and
//! finalize the report. Read-only runs skip the rewrite phases entirely.
//! Files are processed in parallel within each phase; the final report is
//! sorted, so output never depends on scheduling.
//!
//! Secret scanning always runs against the content that ends up on disk:
//! the rewritten text for verified fixes, the original for everything else.

use crate::backup::BackupGuard;
use crate::fixer::{self, FixContext, FixPlan};
use crate::models::{FileKind, Finding, FixAction, RunReport, ScanTarget, Severity};
use crate::report;
use crate::rules::{self, SecretRule};
use crate::secrets;
use crate::walk;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Phases of a single run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Scanning,
    Fixing,
    Rescanning,
    Finalized,
}

impl RunPhase {
    fn can_advance(self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (RunPhase::Init, RunPhase::Scanning)
                | (RunPhase::Scanning, RunPhase::Fixing)
                | (RunPhase::Scanning, RunPhase::Finalized)
                | (RunPhase::Fixing, RunPhase::Rescanning)
                | (RunPhase::Rescanning, RunPhase::Finalized)
        )
    }
}

struct RunState {
    phase: RunPhase,
}

impl RunState {
    fn new() -> RunState {
        RunState {
            phase: RunPhase::Init,
        }
    }

    fn advance(&mut self, next: RunPhase) {
        debug_assert!(
            self.phase.can_advance(next),
            "illegal phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        self.phase = next;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What the run does with HTML files.
pub enum RunMode {
    /// Report findings only; plan nothing.
    Scan,
    /// Plan fixes without writing (fix --check / --diff). The verdict still
    /// reflects what is on disk.
    Plan,
    /// Rewrite files with backups and post-write verification.
    Apply,
}

/// Inputs for one run, resolved upstream from CLI flags and config.
pub struct RunOptions<'a> {
    pub scan_root: &'a Path,
    pub extensions: &'a [String],
    pub excludes: &'a [glob::Pattern],
    pub secret_rules: &'a [SecretRule],
    pub filter: Option<&'a HashSet<String>>,
    pub mode: RunMode,
}

/// Planned rewrite of one file, kept for --diff rendering.
pub struct FixPreview {
    pub file: String,
    pub original: String,
    pub planned: String,
}

/// Everything a finished run produces.
pub struct RunOutcome {
    pub report: RunReport,
    pub previews: Vec<FixPreview>,
}

struct FileWork {
    rel: String,
    path: PathBuf,
    original: Option<String>,
    pre_failing: Vec<&'static str>,
    findings: Vec<Finding>,
    plan: Option<FixPlan>,
    guard: Option<BackupGuard>,
    rolled_back: bool,
}

/// Execute one full run over the scan root.
pub fn run(opts: &RunOptions) -> RunOutcome {
    let mut state = RunState::new();
    state.advance(RunPhase::Scanning);

    let (targets, walk_findings) =
        walk::collect_targets(opts.scan_root, opts.extensions, opts.excludes);
    let processed: Vec<String> = targets.iter().map(|t| t.rel.clone()).collect();

    let mut works: Vec<FileWork> = targets.par_iter().map(|t| scan_target(t, opts)).collect();

    if opts.mode == RunMode::Apply {
        let needs_rewrite = works
            .iter()
            .any(|w| w.plan.as_ref().map_or(false, |p| p.changed()));
        if needs_rewrite {
            state.advance(RunPhase::Fixing);
            works.par_iter_mut().for_each(stage_rewrite);
            state.advance(RunPhase::Rescanning);
            works
                .par_iter_mut()
                .for_each(|w| verify_rewrite(w, opts.filter));
        }
    }

    secrets_pass(&mut works, opts);

    let mut findings = walk_findings;
    let mut fixes: Vec<FixAction> = Vec::new();
    let mut previews: Vec<FixPreview> = Vec::new();
    for w in works {
        findings.extend(w.findings);
        let Some(plan) = w.plan else { continue };
        if w.rolled_back || !plan.changed() {
            continue;
        }
        if opts.mode == RunMode::Plan {
            if let Some(original) = w.original {
                previews.push(FixPreview {
                    file: w.rel,
                    original,
                    planned: plan.content.clone(),
                });
            }
        }
        fixes.extend(plan.actions);
    }
    state.advance(RunPhase::Finalized);

    RunOutcome {
        report: report::finalize(findings, fixes, processed),
        previews,
    }
}

fn scan_target(t: &ScanTarget, opts: &RunOptions) -> FileWork {
    let mut w = FileWork {
        rel: t.rel.clone(),
        path: t.path.clone(),
        original: None,
        pre_failing: Vec::new(),
        findings: Vec::new(),
        plan: None,
        guard: None,
        rolled_back: false,
    };
    let content = match fs::read_to_string(&t.path) {
        Ok(c) => c,
        Err(e) => {
            w.findings.push(io_finding(
                &t.rel,
                Severity::Error,
                format!("cannot read: {}", e),
            ));
            return w;
        }
    };
    if t.kind == FileKind::Html {
        let stem = t.path.file_stem().and_then(|s| s.to_str()).unwrap_or("page");
        match opts.mode {
            RunMode::Scan => {
                w.findings
                    .extend(fixer::detect_all(&t.rel, &content, opts.filter));
            }
            RunMode::Plan => {
                // Nothing reaches disk, so the verdict must reflect the
                // on-disk state: report the detections as scan does and keep
                // the plan for previews and would-fix lines. The plan's
                // unfixable findings duplicate detections and are dropped.
                w.findings
                    .extend(fixer::detect_all(&t.rel, &content, opts.filter));
                let ctx = FixContext { rel: &t.rel, stem };
                let plan = fixer::plan_fixes(&ctx, &content, opts.filter);
                w.plan = Some(plan);
            }
            RunMode::Apply => {
                w.pre_failing = fixer::failing_rules(&content, opts.filter);
                let ctx = FixContext { rel: &t.rel, stem };
                let mut plan = fixer::plan_fixes(&ctx, &content, opts.filter);
                w.findings.append(&mut plan.findings);
                w.plan = Some(plan);
            }
        }
    }
    w.original = Some(content);
    w
}

/// Back up and atomically rewrite one planned file. On failure the file is
/// left as it was and the plan is dropped so nothing is reported as fixed.
fn stage_rewrite(w: &mut FileWork) {
    let Some(plan) = w.plan.take() else { return };
    if !plan.changed() {
        w.plan = Some(plan);
        return;
    }
    let guard = match BackupGuard::create(&w.path) {
        Ok(g) => g,
        Err(e) => {
            w.findings.push(io_finding(
                &w.rel,
                Severity::Error,
                format!("cannot back up: {}", e),
            ));
            return;
        }
    };
    if let Err(e) = write_atomic(&w.path, &plan.content) {
        w.findings.push(io_finding(
            &w.rel,
            Severity::Error,
            format!("cannot write: {}", e),
        ));
        // The rename never happened, so the target is intact.
        if let Err(e) = guard.commit() {
            w.findings.push(io_finding(
                &w.rel,
                Severity::Warning,
                format!("cannot remove backup: {}", e),
            ));
        }
        return;
    }
    w.guard = Some(guard);
    w.plan = Some(plan);
}

/// Re-read a rewritten file and verify the fix took. The rewrite is good
/// when the bytes match the plan, every fixed rule now passes, and no rule
/// fails that was passing before. Anything else rolls back to the backup.
fn verify_rewrite(w: &mut FileWork, filter: Option<&HashSet<String>>) {
    let Some(guard) = w.guard.take() else { return };
    let Some(plan) = w.plan.take() else { return };

    let verified = match fs::read_to_string(&w.path) {
        Ok(reread) => {
            let post = fixer::failing_rules(&reread, filter);
            reread == plan.content
                && !post
                    .iter()
                    .any(|r| plan.actions.iter().any(|a| a.rule == *r))
                && post.iter().all(|r| w.pre_failing.contains(r))
        }
        Err(_) => false,
    };

    if verified {
        if let Err(e) = guard.commit() {
            w.findings.push(io_finding(
                &w.rel,
                Severity::Warning,
                format!("cannot remove backup: {}", e),
            ));
        }
        w.plan = Some(plan);
        return;
    }

    let backup = guard.backup_path().display().to_string();
    drop(guard);
    w.rolled_back = true;
    if let Some(original) = w.original.as_deref() {
        w.findings = fixer::detect_all(&w.rel, original, filter);
    }
    w.findings.push(Finding {
        file: w.rel.clone(),
        rule: rules::FIX_VERIFY_RULE.to_string(),
        severity: Severity::Error,
        line: None,
        excerpt: None,
        suppressed: false,
        message: format!("rewrite failed verification; rolled back (backup at {})", backup),
    });
    w.plan = Some(plan);
}

/// Match secret rules against the content each file ends the run with.
fn secrets_pass(works: &mut [FileWork], opts: &RunOptions) {
    let active: Vec<SecretRule> = opts
        .secret_rules
        .iter()
        .filter(|r| opts.filter.map_or(true, |f| f.contains(&r.name)))
        .cloned()
        .collect();
    if active.is_empty() {
        return;
    }
    works.par_iter_mut().for_each(|w| {
        let Some(original) = w.original.as_deref() else {
            return;
        };
        let text = match (&w.plan, opts.mode) {
            (Some(p), RunMode::Apply) if !w.rolled_back => p.content.as_str(),
            _ => original,
        };
        let mut found = secrets::scan_content(&w.rel, text, &active);
        w.findings.append(&mut found);
    });
}

fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let perms = fs::metadata(path)?.permissions();
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    let file = tmp.persist(path).map_err(|e| e.error)?;
    file.set_permissions(perms)?;
    Ok(())
}

fn io_finding(rel: &str, severity: Severity, message: String) -> Finding {
    Finding {
        file: rel.to_string(),
        rule: rules::IO_RULE.to_string(),
        severity,
        line: None,
        excerpt: None,
        suppressed: false,
        message,
    }
}
