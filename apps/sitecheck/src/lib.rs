//! Sitecheck core library.
//!
//! This crate exposes programmatic APIs for the static-site publish gate:
//! structural HTML checks with auto-fixes, and secret scanning over site
//! content.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `rules`: Built-in structural rule table and the secret pattern loader.
//! - `walk`: Deterministic file enumeration under the scan root.
//! - `fixer`: Ordered structural detectors and repairs over HTML content.
//! - `secrets`: Secret pattern matching with allowlist suppression.
//! - `backup`: Per-file backup guard for rollback on failed rewrites.
//! - `pipeline`: Scan/fix run orchestration and phase handling.
//! - `report`: Finding aggregation, verdicts, and exit codes.
//! - `models`: Data models for findings, fixes, and the run report.
//! - `output`: Human/JSON printers for finished runs.
//! - `utils`: Supporting helpers.
pub mod backup;
pub mod cli;
pub mod config;
pub mod fixer;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod secrets;
pub mod utils;
pub mod walk;
