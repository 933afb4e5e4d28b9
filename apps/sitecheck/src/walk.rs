//! File scanner: deterministic enumeration of the scan root.
//!
//! Directories are visited depth-first with entries sorted by name; the
//! final target list is sorted by relative path so every run sees the same
//! order. Symlink cycles are broken by tracking canonicalized directories.
//! Unreadable directories become `io` findings and the walk continues.

use crate::models::{FileKind, Finding, ScanTarget, Severity};
use crate::rules::IO_RULE;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory names that are never scanned, independent of configuration.
pub const EXCLUDED_DIR_NAMES: &[&str] = &[".git", ".github", "node_modules"];

/// Infix marking the scanner's own backup artifacts.
const BACKUP_MARK: &str = ".bak.";

/// Compile configured exclude globs. An invalid pattern is a configuration
/// error and is reported with its source text.
pub fn compile_excludes(patterns: &[String]) -> Result<Vec<glob::Pattern>, String> {
    let mut out = Vec::with_capacity(patterns.len());
    for p in patterns {
        match glob::Pattern::new(p) {
            Ok(pat) => out.push(pat),
            Err(e) => return Err(format!("invalid exclude pattern '{}': {}", p, e)),
        }
    }
    Ok(out)
}

/// Enumerate files under `scan_root` with one of the given extensions,
/// honoring built-in and configured exclusions.
pub fn collect_targets(
    scan_root: &Path,
    extensions: &[String],
    excludes: &[glob::Pattern],
) -> (Vec<ScanTarget>, Vec<Finding>) {
    let mut targets: Vec<ScanTarget> = Vec::new();
    let mut findings: Vec<Finding> = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();

    if let Ok(canon) = fs::canonicalize(scan_root) {
        visited.insert(canon);
    }
    walk_dir(
        scan_root,
        scan_root,
        extensions,
        excludes,
        &mut visited,
        &mut targets,
        &mut findings,
    );

    targets.sort_by(|a, b| a.rel.cmp(&b.rel));
    (targets, findings)
}

fn rel_of(path: &Path, scan_root: &Path) -> String {
    path.strip_prefix(scan_root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

fn walk_dir(
    dir: &Path,
    scan_root: &Path,
    extensions: &[String],
    excludes: &[glob::Pattern],
    visited: &mut HashSet<PathBuf>,
    targets: &mut Vec<ScanTarget>,
    findings: &mut Vec<Finding>,
) {
    let entries = match fs::read_dir(dir) {
        Ok(it) => it,
        Err(e) => {
            findings.push(Finding {
                file: rel_of(dir, scan_root),
                rule: IO_RULE.into(),
                severity: Severity::Error,
                line: None,
                excerpt: None,
                suppressed: false,
                message: format!("cannot read directory: {}", e),
            });
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let rel = rel_of(&path, scan_root);
        let meta = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                findings.push(Finding {
                    file: rel,
                    rule: IO_RULE.into(),
                    severity: Severity::Error,
                    line: None,
                    excerpt: None,
                    suppressed: false,
                    message: format!("cannot stat: {}", e),
                });
                continue;
            }
        };

        if meta.is_dir() {
            if EXCLUDED_DIR_NAMES.contains(&name.as_str()) {
                continue;
            }
            if excludes.iter().any(|p| p.matches(&rel)) {
                continue;
            }
            // Canonicalize so a symlink loop is seen once and skipped after.
            match fs::canonicalize(&path) {
                Ok(canon) => {
                    if !visited.insert(canon) {
                        continue;
                    }
                }
                Err(e) => {
                    findings.push(Finding {
                        file: rel,
                        rule: IO_RULE.into(),
                        severity: Severity::Error,
                        line: None,
                        excerpt: None,
                        suppressed: false,
                        message: format!("cannot resolve directory: {}", e),
                    });
                    continue;
                }
            }
            walk_dir(
                &path, scan_root, extensions, excludes, visited, targets, findings,
            );
        } else if meta.is_file() {
            if name.contains(BACKUP_MARK) {
                continue;
            }
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if !extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
                continue;
            }
            if excludes.iter().any(|p| p.matches(&rel)) {
                continue;
            }
            targets.push(ScanTarget {
                kind: FileKind::from_path(&path),
                path,
                rel,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exts() -> Vec<String> {
        vec!["html".into(), "css".into(), "js".into(), "md".into()]
    }

    #[test]
    fn test_collect_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("z.html"), "<html></html>").unwrap();
        fs::write(root.join("a.css"), "body{}").unwrap();
        fs::write(root.join("b/c.html"), "<html></html>").unwrap();
        fs::write(root.join("b/skip.txt"), "txt").unwrap();
        fs::write(root.join("node_modules/pkg/x.html"), "<html></html>").unwrap();
        fs::write(root.join(".git/y.html"), "<html></html>").unwrap();

        let (targets, findings) = collect_targets(root, &exts(), &[]);
        let rels: Vec<&str> = targets.iter().map(|t| t.rel.as_str()).collect();
        assert_eq!(rels, vec!["a.css", "b/c.html", "z.html"]);
        assert!(findings.is_empty());
        assert_eq!(targets[0].kind, FileKind::Css);
        assert_eq!(targets[1].kind, FileKind::Html);
    }

    #[test]
    fn test_configured_excludes_prune_dirs_and_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("vendor/deep")).unwrap();
        fs::create_dir_all(root.join("drafts")).unwrap();
        fs::write(root.join("vendor/deep/x.html"), "x").unwrap();
        fs::write(root.join("drafts/d.html"), "d").unwrap();
        fs::write(root.join("keep.html"), "k").unwrap();

        let excludes = compile_excludes(&["vendor/**".into(), "drafts".into()]).unwrap();
        let (targets, _) = collect_targets(root, &exts(), &excludes);
        let rels: Vec<&str> = targets.iter().map(|t| t.rel.as_str()).collect();
        assert_eq!(rels, vec!["keep.html"]);
    }

    #[test]
    fn test_backup_artifacts_skipped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("page.html"), "p").unwrap();
        fs::write(root.join("old.bak.html"), "b").unwrap();
        fs::write(root.join("page.html.bak.1711111111"), "b").unwrap();

        let (targets, _) = collect_targets(root, &exts(), &[]);
        let rels: Vec<&str> = targets.iter().map(|t| t.rel.as_str()).collect();
        assert_eq!(rels, vec!["page.html"]);
    }

    #[test]
    fn test_invalid_exclude_pattern_is_reported() {
        let err = compile_excludes(&["[bad".into()]).unwrap_err();
        assert!(err.contains("[bad"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/x.html"), "x").unwrap();
        std::os::unix::fs::symlink(root.join("a"), root.join("a/b/loop")).unwrap();

        let (targets, _) = collect_targets(root, &exts(), &[]);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].rel, "a/b/x.html");
    }
}
