//! Supporting helpers: stderr prefixes and path display.

use owo_colors::OwoColorize;
use std::path::Path;

fn stderr_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Prefix for fatal configuration messages on stderr.
pub fn error_prefix() -> String {
    if stderr_colors() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

/// Prefix for advisory notes on stderr.
pub fn note_prefix() -> String {
    if stderr_colors() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// Prefix for informational stderr lines.
pub fn info_prefix() -> String {
    if stderr_colors() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}

/// Render `path` relative to `base` for human output; falls back to the
/// path as given when no relative form exists.
pub fn display_rel(path: &Path, base: &Path) -> String {
    match pathdiff::diff_paths(path, base) {
        Some(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().to_string(),
        _ => path.to_string_lossy().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_display_rel_strips_base() {
        let base = PathBuf::from("/repo");
        let p = PathBuf::from("/repo/site/index.html");
        assert_eq!(display_rel(&p, &base), "site/index.html");
    }

    #[test]
    fn test_display_rel_outside_base() {
        let base = PathBuf::from("/repo/site");
        let p = PathBuf::from("/elsewhere/a.css");
        assert_eq!(display_rel(&p, &base), "../../elsewhere/a.css");
    }
}
