//! Sitecheck CLI binary entry point.
//! Resolves configuration, loads secret patterns, runs the pipeline, and
//! prints results.

mod backup;
mod cli;
mod config;
mod fixer;
mod models;
mod output;
mod pipeline;
mod report;
mod rules;
mod secrets;
mod utils;
mod walk;

use clap::Parser;
use cli::{Cli, Commands};
use std::collections::HashSet;
use std::path::Path;

fn main() {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Scan {
            root,
            rules: rule_arg,
            secrets_file,
            output,
            report: report_path,
        } => {
            let eff = config::resolve_effective(
                root.as_deref(),
                output.as_deref(),
                secrets_file.as_deref(),
                None,
                None,
            );
            if config::load_config(&eff.repo_root).is_none() {
                eprintln!(
                    "{} {}",
                    crate::utils::note_prefix(),
                    "No sitecheck.toml found; using defaults."
                );
            }
            if !eff.scan_root.is_dir() {
                eprintln!(
                    "{} {}",
                    crate::utils::error_prefix(),
                    format!(
                        "Scan root not found: {} (pass --root or configure sitecheck.toml)",
                        eff.scan_root.to_string_lossy()
                    )
                );
                std::process::exit(2);
            }
            let excludes = match walk::compile_excludes(&eff.exclude) {
                Ok(x) => x,
                Err(e) => {
                    eprintln!("{} {}", crate::utils::error_prefix(), e);
                    std::process::exit(2);
                }
            };
            let secret_rules = match rules::load_secret_rules(&eff.secrets_file) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{} {}", crate::utils::error_prefix(), e);
                    std::process::exit(2);
                }
            };
            if eff.output != "json" {
                eprintln!(
                    "{} {}",
                    crate::utils::info_prefix(),
                    format!(
                        "Using {} secret pattern(s) from {}",
                        secret_rules.len(),
                        crate::utils::display_rel(&eff.secrets_file, &eff.repo_root)
                    )
                );
            }
            let filter_ids = rule_arg
                .as_deref()
                .map(rules::parse_filter)
                .unwrap_or_default();
            if let Some(bad) = rules::unknown_rule_id(&filter_ids, &secret_rules) {
                eprintln!(
                    "{} {}",
                    crate::utils::error_prefix(),
                    format!("Unknown rule id '{}' (see sitecheck scan --help)", bad)
                );
                std::process::exit(2);
            }
            let filter: Option<HashSet<String>> = if filter_ids.is_empty() {
                None
            } else {
                Some(filter_ids.into_iter().collect())
            };
            let opts = pipeline::RunOptions {
                scan_root: &eff.scan_root,
                extensions: &eff.extensions,
                excludes: &excludes,
                secret_rules: &secret_rules,
                filter: filter.as_ref(),
                mode: pipeline::RunMode::Scan,
            };
            let outcome = pipeline::run(&opts);
            output::print_report(&outcome.report, &eff.output, false);
            if let Some(path) = report_path {
                if let Err(e) = output::write_report_file(Path::new(&path), &outcome.report) {
                    eprintln!(
                        "{} {}",
                        crate::utils::error_prefix(),
                        format!("Cannot write report {}: {}", path, e)
                    );
                    std::process::exit(2);
                }
            }
            let code = report::exit_code(outcome.report.verdict);
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Fix {
            root,
            rules: rule_arg,
            secrets_file,
            output,
            report: report_path,
            check,
            diff,
        } => {
            let eff = config::resolve_effective(
                root.as_deref(),
                output.as_deref(),
                secrets_file.as_deref(),
                if check { Some(true) } else { None },
                if diff { Some(true) } else { None },
            );
            if config::load_config(&eff.repo_root).is_none() {
                eprintln!(
                    "{} {}",
                    crate::utils::note_prefix(),
                    "No sitecheck.toml found; using defaults."
                );
            }
            if !eff.scan_root.is_dir() {
                eprintln!(
                    "{} {}",
                    crate::utils::error_prefix(),
                    format!(
                        "Scan root not found: {} (pass --root or configure sitecheck.toml)",
                        eff.scan_root.to_string_lossy()
                    )
                );
                std::process::exit(2);
            }
            let excludes = match walk::compile_excludes(&eff.exclude) {
                Ok(x) => x,
                Err(e) => {
                    eprintln!("{} {}", crate::utils::error_prefix(), e);
                    std::process::exit(2);
                }
            };
            let secret_rules = match rules::load_secret_rules(&eff.secrets_file) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{} {}", crate::utils::error_prefix(), e);
                    std::process::exit(2);
                }
            };
            if eff.output != "json" {
                eprintln!(
                    "{} {}",
                    crate::utils::info_prefix(),
                    format!(
                        "Using {} secret pattern(s) from {}",
                        secret_rules.len(),
                        crate::utils::display_rel(&eff.secrets_file, &eff.repo_root)
                    )
                );
            }
            let filter_ids = rule_arg
                .as_deref()
                .map(rules::parse_filter)
                .unwrap_or_default();
            if let Some(bad) = rules::unknown_rule_id(&filter_ids, &secret_rules) {
                eprintln!(
                    "{} {}",
                    crate::utils::error_prefix(),
                    format!("Unknown rule id '{}' (see sitecheck fix --help)", bad)
                );
                std::process::exit(2);
            }
            let filter: Option<HashSet<String>> = if filter_ids.is_empty() {
                None
            } else {
                Some(filter_ids.into_iter().collect())
            };
            // --check/--diff disable writes for this run.
            let mode = if eff.check || eff.diff {
                pipeline::RunMode::Plan
            } else {
                pipeline::RunMode::Apply
            };
            let opts = pipeline::RunOptions {
                scan_root: &eff.scan_root,
                extensions: &eff.extensions,
                excludes: &excludes,
                secret_rules: &secret_rules,
                filter: filter.as_ref(),
                mode,
            };
            let outcome = pipeline::run(&opts);
            if eff.diff {
                output::print_previews(&outcome.previews, &eff.output);
            }
            output::print_report(&outcome.report, &eff.output, mode == pipeline::RunMode::Apply);
            if let Some(path) = report_path {
                if let Err(e) = output::write_report_file(Path::new(&path), &outcome.report) {
                    eprintln!(
                        "{} {}",
                        crate::utils::error_prefix(),
                        format!("Cannot write report {}: {}", path, e)
                    );
                    std::process::exit(2);
                }
            }
            // In check mode, exit non-zero when any fix would occur.
            if eff.check && !outcome.report.fixes.is_empty() {
                std::process::exit(1);
            }
            let code = report::exit_code(outcome.report.verdict);
            if code != 0 {
                std::process::exit(code);
            }
        }
    }
}
