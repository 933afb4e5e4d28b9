//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sitecheck",
    version,
    about = "Sitecheck (Rust)",
    long_about = "Sitecheck — a small, fast publish gate for static sites: structural HTML fixes plus secret scanning.\n\nConfiguration precedence: CLI > sitecheck.toml > defaults.",
    after_help = "Examples:\n  sitecheck scan\n  sitecheck scan --root public --output json --report sitecheck.json\n  sitecheck fix --rules encoding,viewport,alt-text\n  sitecheck fix --check",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for scanning and fixing site content.
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current sitecheck version."
    )]
    Version,
    /// Scan content for structural issues and leaked secrets
    #[command(
        about = "Run a read-only scan",
        long_about = "Walk the content root, check HTML structure, and match every scanned file against the secret pattern file. Never writes.",
        after_help = "Examples:\n  sitecheck scan\n  sitecheck scan --root public --output json"
    )]
    Scan {
        #[arg(long, help = "Content root to scan (default: detected repo root)")]
        root: Option<String>,
        #[arg(long, help = "Comma-separated rule ids to run (default: all)")]
        rules: Option<String>,
        #[arg(
            long,
            help = "Secret pattern file (default: ~/.config/sitecheck/secret-patterns.conf)"
        )]
        secrets_file: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Also write the JSON report to this path")]
        report: Option<String>,
    },
    /// Fix HTML structure in place, then rescan before finalizing
    #[command(
        about = "Apply structural fixes",
        long_about = "Rewrite HTML files with per-file backups, rescan the results, and roll back any file that fails verification. When --diff or --check is set, write is disabled.",
        after_help = "Examples:\n  sitecheck fix\n  sitecheck fix --diff\n  sitecheck fix --check --rules alt-text,lang-attr"
    )]
    Fix {
        #[arg(long, help = "Content root to scan (default: detected repo root)")]
        root: Option<String>,
        #[arg(long, help = "Comma-separated rule ids to run (default: all)")]
        rules: Option<String>,
        #[arg(
            long,
            help = "Secret pattern file (default: ~/.config/sitecheck/secret-patterns.conf)"
        )]
        secrets_file: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Also write the JSON report to this path")]
        report: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit non-zero if fixes would occur (implies write=false)")]
        check: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Show diffs for planned fixes (implies write=false)")]
        diff: bool,
    },
}
