//! Configuration discovery and effective settings resolution.
//!
//! Sitecheck reads `sitecheck.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config. Defaults:
//! - `root`: the repository root
//! - `extensions`: html, css, js, md
//! - `output`: `human`
//! - `secrets.patterns`: `$HOME/.config/sitecheck/secret-patterns.conf`
//! - `fix.check|diff`: false
//!
//! Overrides precedence: CLI > config file > defaults. The environment is
//! consulted only here (the default pattern path lives under `$HOME`);
//! everything downstream receives resolved values.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions scanned when the config does not narrow them.
pub const DEFAULT_EXTENSIONS: &[&str] = &["html", "css", "js", "md"];

const DEFAULT_PATTERNS_REL: &str = ".config/sitecheck/secret-patterns.conf";

#[derive(Debug, Default, Deserialize, Clone)]
/// Secrets-related configuration section under `[secrets]`.
pub struct SecretsCfg {
    pub patterns: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Fix-related configuration section under `[fix]`.
pub struct FixCfg {
    pub check: Option<bool>,
    pub diff: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `sitecheck.toml|yaml`.
pub struct SiteConfig {
    pub root: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub output: Option<String>,
    #[serde(default)]
    pub secrets: Option<SecretsCfg>,
    #[serde(default)]
    pub fix: Option<FixCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub scan_root: PathBuf,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub output: String,
    pub secrets_file: PathBuf,
    pub check: bool,
    pub diff: bool,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `sitecheck.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("sitecheck.toml").exists()
            || cur.join("sitecheck.yaml").exists()
            || cur.join("sitecheck.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `SiteConfig` from `sitecheck.toml` or `sitecheck.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<SiteConfig> {
    let toml_path = root.join("sitecheck.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: SiteConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["sitecheck.yaml", "sitecheck.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: SiteConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

fn default_patterns_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(DEFAULT_PATTERNS_REL),
        None => PathBuf::from(DEFAULT_PATTERNS_REL),
    }
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_root: Option<&str>,
    cli_output: Option<&str>,
    cli_secrets_file: Option<&str>,
    cli_check: Option<bool>,
    cli_diff: Option<bool>,
) -> Effective {
    let start = PathBuf::from(cli_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();

    let scan_root = match cli_root {
        Some(r) => PathBuf::from(r),
        None => match cfg.root.as_deref() {
            Some(sub) => repo_root.join(sub),
            None => repo_root.clone(),
        },
    };

    let extensions = cfg.extensions.clone().unwrap_or_else(|| {
        DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    });
    let exclude = cfg.exclude.clone().unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let secrets_file = match cli_secrets_file {
        Some(p) => PathBuf::from(p),
        None => match cfg.secrets.as_ref().and_then(|s| s.patterns.clone()) {
            Some(p) => {
                let p = PathBuf::from(p);
                if p.is_absolute() {
                    p
                } else {
                    repo_root.join(p)
                }
            }
            None => default_patterns_path(),
        },
    };

    let check = cli_check
        .or_else(|| cfg.fix.as_ref().and_then(|f| f.check))
        .unwrap_or(false);
    let diff = cli_diff
        .or_else(|| cfg.fix.as_ref().and_then(|f| f.diff))
        .unwrap_or(false);

    Effective {
        repo_root,
        scan_root,
        extensions,
        exclude,
        output,
        secrets_file,
        check,
        diff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("sitecheck.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
root = "site"
output = "json"
exclude = ["vendor/**"]
[secrets]
patterns = "conf/patterns.conf"
    "#
        )
        .unwrap();

        // Resolve using explicit root to avoid global CWD races
        let eff = resolve_effective(root.to_str(), None, None, None, None);
        assert_eq!(eff.repo_root, root);
        // CLI --root wins over config root when given; here it was given as the
        // discovery start, so it is also the scan root.
        assert_eq!(eff.scan_root, root);
        assert_eq!(eff.output, "json");
        assert_eq!(eff.exclude, vec!["vendor/**".to_string()]);
        assert_eq!(eff.secrets_file, root.join("conf/patterns.conf"));
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("sitecheck.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output: human
extensions:
  - html
  - css
            "#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, None, None, None);
        assert_eq!(eff.output, "human");
        assert_eq!(eff.extensions, vec!["html".to_string(), "css".to_string()]);
        assert!(!eff.check);
        assert!(!eff.diff);
    }

    #[test]
    fn test_cli_precedence_over_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("sitecheck.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "json"
[fix]
check = true
            "#
        )
        .unwrap();

        let eff = resolve_effective(
            root.to_str(),
            Some("human"),
            Some("/tmp/patterns.conf"),
            Some(false),
            None,
        );
        assert_eq!(eff.output, "human");
        assert!(!eff.check);
        assert_eq!(eff.secrets_file, PathBuf::from("/tmp/patterns.conf"));
    }

    #[test]
    fn test_cli_root_wins_over_config_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("site")).unwrap();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("sitecheck.toml"), "root = \"site\"\n").unwrap();

        // Discovery walks up from the CLI root to find the config; the CLI
        // root itself stays the scan root.
        let eff = resolve_effective(root.join("nested").to_str(), None, None, None, None);
        assert_eq!(eff.repo_root, root);
        assert_eq!(eff.scan_root, root.join("nested"));
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();

        let eff = resolve_effective(root.to_str(), None, None, None, None);
        assert_eq!(eff.repo_root, root);
        assert_eq!(eff.scan_root, root);
        assert_eq!(
            eff.extensions,
            vec!["html", "css", "js", "md"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
        assert!(eff
            .secrets_file
            .to_string_lossy()
            .ends_with(".config/sitecheck/secret-patterns.conf"));
    }
}
