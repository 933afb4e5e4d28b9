//! Auto-fixer: ordered structural rules over HTML content.
//!
//! Each rule has a detector and a repair. Repairs emit byte-range edits
//! that are applied in descending offset order, so earlier offsets stay
//! valid while later ones are spliced. Rules run in the fixed order of
//! `rules::STRUCTURAL_RULES`; a later rule sees the content produced by
//! earlier repairs (the skip link targets the landmark inserted by the
//! landmark rule). A rule produces at most one `FixAction` per file.
//!
//! Unrepairable structure (no anchor element, ambiguous landmarks) yields
//! an Error finding and leaves the content untouched by that rule.

use crate::models::{Finding, FixAction, Severity};
use crate::rules::{structural_rule, STRUCTURAL_RULES};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static HTML_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<html\b[^>]*>").unwrap());
static HEAD_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<head\b[^>]*>").unwrap());
static HEAD_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</head\s*>").unwrap());
static BODY_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<body\b[^>]*>").unwrap());
static BODY_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</body\s*>").unwrap());
static CHARSET_META: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<meta\b[^>]*\bcharset\s*=[^>]*>").unwrap());
static VIEWPORT_META: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\b[^>]*\bname\s*=\s*["']viewport["'][^>]*>"#).unwrap());
static DESCRIPTION_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*\bname\s*=\s*["']description["'][^>]*>"#).unwrap()
});
static TITLE_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());
static ALT_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\balt\s*=").unwrap());
static MAIN_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<main\b[^>]*>").unwrap());
static ROLE_MAIN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<[a-z][a-z0-9-]*\b[^>]*\brole\s*=\s*["']main["'][^>]*>"#).unwrap()
});
static SKIP_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*\bclass\s*=\s*["'][^"']*\bskip-link\b[^"']*["']"#).unwrap()
});
static LANG_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\blang\s*=").unwrap());
static STYLE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s+style\s*=\s*("[^"]*"|'[^']*')"#).unwrap());
static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bsrc\s*=").unwrap());
static JSON_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\btype\s*=\s*["'][^"']*json[^"']*["']"#).unwrap());
static HEADER_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<header\b[^>]*>.*?</header\s*>").unwrap());
static FOOTER_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<footer\b[^>]*>.*?</footer\s*>").unwrap());
static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bid\s*=\s*["']([^"']+)["']"#).unwrap());

const DEFAULT_LANDMARK_ID: &str = "main-content";

/// One byte-range splice against the current content.
#[derive(Debug)]
pub struct Edit {
    pub offset: usize,
    pub delete: usize,
    pub insert: String,
}

/// Detector outcome for a single rule.
pub enum Check {
    Pass,
    Fail { severity: Severity, message: String },
}

enum Repair {
    Edits { message: String, edits: Vec<Edit> },
    Unfixable { reason: String },
}

/// Per-file context for repairs that synthesize text.
pub struct FixContext<'a> {
    pub rel: &'a str,
    pub stem: &'a str,
}

/// Result of the ordered fix pass over one file's content.
pub struct FixPlan {
    pub content: String,
    pub actions: Vec<FixAction>,
    pub findings: Vec<Finding>,
}

impl FixPlan {
    pub fn changed(&self) -> bool {
        !self.actions.is_empty()
    }
}

fn rule_enabled(filter: Option<&HashSet<String>>, id: &str) -> bool {
    filter.map_or(true, |set| set.contains(id))
}

/// Offset just before a tag's `>` (or ` />`), past any trailing space, so
/// an inserted attribute keeps single spacing.
fn attr_insert_offset(tag_start: usize, tag: &str) -> usize {
    let trimmed = if tag.ends_with("/>") {
        &tag[..tag.len() - 2]
    } else {
        &tag[..tag.len() - 1]
    };
    tag_start + trimmed.trim_end().len()
}

/// Apply edits in descending offset order so offsets computed against the
/// original content stay valid throughout.
pub fn apply_edits(mut content: String, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.offset.cmp(&a.offset));
    for e in edits {
        content.replace_range(e.offset..e.offset + e.delete, &e.insert);
    }
    content
}

/// Detect every enabled rule against `content` without repairing.
pub fn detect_all(rel: &str, content: &str, filter: Option<&HashSet<String>>) -> Vec<Finding> {
    let mut out = Vec::new();
    for rule in STRUCTURAL_RULES {
        if !rule_enabled(filter, rule.id) {
            continue;
        }
        if let Check::Fail { severity, message } = detect(rule.id, content) {
            out.push(Finding {
                file: rel.to_string(),
                rule: rule.id.to_string(),
                severity,
                line: None,
                excerpt: None,
                suppressed: false,
                message,
            });
        }
    }
    out
}

/// Rule ids currently failing detection; used by fix verification.
pub fn failing_rules(content: &str, filter: Option<&HashSet<String>>) -> Vec<&'static str> {
    STRUCTURAL_RULES
        .iter()
        .filter(|r| rule_enabled(filter, r.id))
        .filter(|r| matches!(detect(r.id, content), Check::Fail { .. }))
        .map(|r| r.id)
        .collect()
}

/// Run the ordered fix pass. Content is rewritten in memory only; callers
/// decide whether the plan reaches disk.
pub fn plan_fixes(ctx: &FixContext, original: &str, filter: Option<&HashSet<String>>) -> FixPlan {
    let mut content = original.to_string();
    let mut actions: Vec<FixAction> = Vec::new();
    let mut findings: Vec<Finding> = Vec::new();

    for rule in STRUCTURAL_RULES {
        if !rule_enabled(filter, rule.id) {
            continue;
        }
        if matches!(detect(rule.id, &content), Check::Pass) {
            continue;
        }
        match repair(rule.id, &content, ctx) {
            Repair::Edits { message, edits } => {
                content = apply_edits(content, edits);
                actions.push(FixAction {
                    file: ctx.rel.to_string(),
                    rule: rule.id.to_string(),
                    message,
                });
            }
            Repair::Unfixable { reason } => {
                findings.push(Finding {
                    file: ctx.rel.to_string(),
                    rule: rule.id.to_string(),
                    severity: Severity::Error,
                    line: None,
                    excerpt: None,
                    suppressed: false,
                    message: format!("cannot auto-fix: {}", reason),
                });
            }
        }
    }

    FixPlan {
        content,
        actions,
        findings,
    }
}

fn table_severity(id: &str) -> Severity {
    structural_rule(id).map(|r| r.severity).unwrap_or(Severity::Warning)
}

fn fail(id: &str, message: String) -> Check {
    Check::Fail {
        severity: table_severity(id),
        message,
    }
}

/// Detector for one rule id. Unknown ids pass.
pub fn detect(rule_id: &str, content: &str) -> Check {
    match rule_id {
        "encoding" => {
            if CHARSET_META.is_match(content) {
                Check::Pass
            } else {
                fail(rule_id, "missing <meta charset=\"utf-8\">".into())
            }
        }
        "viewport" => {
            if VIEWPORT_META.is_match(content) {
                Check::Pass
            } else {
                fail(rule_id, "missing viewport meta".into())
            }
        }
        "description" => {
            if DESCRIPTION_META.is_match(content) {
                Check::Pass
            } else {
                fail(rule_id, "missing description meta".into())
            }
        }
        "alt-text" => {
            let missing = imgs_without_alt(content).len();
            if missing == 0 {
                Check::Pass
            } else {
                fail(rule_id, format!("{} <img> element(s) missing alt", missing))
            }
        }
        "landmark" => match landmark_count(content) {
            1 => Check::Pass,
            0 => fail(
                rule_id,
                "no primary landmark (<main> or role=\"main\")".into(),
            ),
            n => Check::Fail {
                severity: Severity::Error,
                message: format!("{} primary landmarks; expected exactly one", n),
            },
        },
        "skip-link" => {
            if landmark_count(content) != 1 {
                // Nothing to target; not applicable.
                Check::Pass
            } else if SKIP_LINK.is_match(content) {
                Check::Pass
            } else {
                fail(rule_id, "no skip navigation link".into())
            }
        }
        "lang-attr" => match HTML_OPEN.find(content) {
            Some(m) if LANG_ATTR.is_match(m.as_str()) => Check::Pass,
            Some(_) => fail(rule_id, "<html> missing lang attribute".into()),
            None => fail(rule_id, "no <html> element".into()),
        },
        "inline-style" => {
            let n = STYLE_ATTR.find_iter(content).count();
            if n == 0 {
                Check::Pass
            } else {
                fail(rule_id, format!("{} inline style attribute(s)", n))
            }
        }
        "inline-script" => {
            let n = inline_script_ranges(content).len();
            if n == 0 {
                Check::Pass
            } else {
                fail(rule_id, format!("{} inline script block(s)", n))
            }
        }
        _ => Check::Pass,
    }
}

fn repair(rule_id: &str, content: &str, ctx: &FixContext) -> Repair {
    match rule_id {
        "encoding" => match HEAD_OPEN.find(content) {
            Some(m) => Repair::Edits {
                message: "inserted <meta charset=\"utf-8\">".into(),
                edits: vec![Edit {
                    offset: m.end(),
                    delete: 0,
                    insert: "\n  <meta charset=\"utf-8\">".into(),
                }],
            },
            None => Repair::Unfixable {
                reason: "no <head> element to anchor the charset meta".into(),
            },
        },
        "viewport" => {
            let anchor = CHARSET_META
                .find(content)
                .map(|m| m.end())
                .or_else(|| HEAD_OPEN.find(content).map(|m| m.end()));
            match anchor {
                Some(off) => Repair::Edits {
                    message: "inserted viewport meta".into(),
                    edits: vec![Edit {
                        offset: off,
                        delete: 0,
                        insert:
                            "\n  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
                                .into(),
                    }],
                },
                None => Repair::Unfixable {
                    reason: "no <head> element to anchor the viewport meta".into(),
                },
            }
        }
        "description" => {
            let text = TITLE_TEXT
                .captures(content)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| ctx.stem.to_string());
            let meta = format!(
                "<meta name=\"description\" content=\"{}\">",
                attr_escape(&text)
            );
            if let Some(m) = HEAD_CLOSE.find(content) {
                Repair::Edits {
                    message: "inserted description meta".into(),
                    edits: vec![Edit {
                        offset: m.start(),
                        delete: 0,
                        insert: format!("  {}\n", meta),
                    }],
                }
            } else if let Some(m) = HEAD_OPEN.find(content) {
                Repair::Edits {
                    message: "inserted description meta".into(),
                    edits: vec![Edit {
                        offset: m.end(),
                        delete: 0,
                        insert: format!("\n  {}", meta),
                    }],
                }
            } else {
                Repair::Unfixable {
                    reason: "no <head> element to anchor the description meta".into(),
                }
            }
        }
        "alt-text" => {
            let missing = imgs_without_alt(content);
            let n = missing.len();
            let edits = missing
                .into_iter()
                .map(|(start, end)| Edit {
                    offset: attr_insert_offset(start, &content[start..end]),
                    delete: 0,
                    insert: " alt=\"\"".into(),
                })
                .collect();
            Repair::Edits {
                message: format!("added empty alt to {} image(s)", n),
                edits,
            }
        }
        "landmark" => match landmark_count(content) {
            0 => wrap_body_in_main(content),
            _ => Repair::Unfixable {
                reason: "multiple primary landmarks; cannot choose one".into(),
            },
        },
        "skip-link" => insert_skip_link(content),
        "lang-attr" => match HTML_OPEN.find(content) {
            Some(m) => Repair::Edits {
                message: "added lang=\"en\" to <html>".into(),
                edits: vec![Edit {
                    offset: attr_insert_offset(m.start(), m.as_str()),
                    delete: 0,
                    insert: " lang=\"en\"".into(),
                }],
            },
            None => Repair::Unfixable {
                reason: "no <html> element".into(),
            },
        },
        "inline-style" => {
            let edits: Vec<Edit> = STYLE_ATTR
                .find_iter(content)
                .map(|m| Edit {
                    offset: m.start(),
                    delete: m.end() - m.start(),
                    insert: String::new(),
                })
                .collect();
            Repair::Edits {
                message: format!("removed {} inline style attribute(s)", edits.len()),
                edits,
            }
        }
        "inline-script" => {
            let ranges = inline_script_ranges(content);
            let n = ranges.len();
            let edits = ranges
                .into_iter()
                .map(|(start, end)| Edit {
                    offset: start,
                    delete: end - start,
                    insert: String::new(),
                })
                .collect();
            Repair::Edits {
                message: format!("removed {} inline script block(s)", n),
                edits,
            }
        }
        _ => Repair::Unfixable {
            reason: "unknown rule".into(),
        },
    }
}

fn imgs_without_alt(content: &str) -> Vec<(usize, usize)> {
    IMG_TAG
        .find_iter(content)
        .filter(|m| !ALT_ATTR.is_match(m.as_str()))
        .map(|m| (m.start(), m.end()))
        .collect()
}

fn landmark_count(content: &str) -> usize {
    let mains = MAIN_OPEN.find_iter(content).count();
    let role_mains = ROLE_MAIN_TAG
        .find_iter(content)
        .filter(|m| {
            // A <main role="main"> tag is already counted above.
            MAIN_OPEN
                .find(m.as_str())
                .map_or(true, |mm| mm.start() != 0)
        })
        .count();
    mains + role_mains
}

/// Open tag of the document's sole primary landmark.
fn landmark_tag(content: &str) -> Option<(usize, usize)> {
    if let Some(m) = MAIN_OPEN.find(content) {
        return Some((m.start(), m.end()));
    }
    ROLE_MAIN_TAG.find(content).map(|m| (m.start(), m.end()))
}

fn inline_script_ranges(content: &str) -> Vec<(usize, usize)> {
    SCRIPT_BLOCK
        .find_iter(content)
        .filter(|m| {
            let block = m.as_str();
            let open = block.find('>').map(|i| &block[..=i]).unwrap_or(block);
            // Data blocks (JSON-LD and friends) stay; external scripts stay.
            !SRC_ATTR.is_match(open) && !JSON_TYPE.is_match(open)
        })
        .map(|m| (m.start(), m.end()))
        .collect()
}

fn wrap_body_in_main(content: &str) -> Repair {
    let open = match BODY_OPEN.find(content) {
        Some(m) => m,
        None => {
            return Repair::Unfixable {
                reason: "no <body> element to wrap".into(),
            }
        }
    };
    let close = match BODY_CLOSE.find_iter(content).last() {
        Some(m) => m,
        None => {
            return Repair::Unfixable {
                reason: "no </body> to bound the landmark".into(),
            }
        }
    };
    let inner_start = open.end();
    let inner_end = close.start();
    if inner_end < inner_start {
        return Repair::Unfixable {
            reason: "malformed <body> element".into(),
        };
    }

    // Keep a leading <header> and a trailing <footer> outside the landmark.
    let mut wrap_start = inner_start;
    if let Some(h) = HEADER_BLOCK.find(content) {
        if h.start() >= inner_start
            && h.end() <= inner_end
            && content[inner_start..h.start()].trim().is_empty()
        {
            wrap_start = h.end();
        }
    }
    let mut wrap_end = inner_end;
    if let Some(f) = FOOTER_BLOCK.find_iter(content).last() {
        if f.start() >= wrap_start
            && f.end() <= inner_end
            && content[f.end()..inner_end].trim().is_empty()
        {
            wrap_end = f.start();
        }
    }
    if wrap_end < wrap_start {
        wrap_start = inner_start;
        wrap_end = inner_end;
    }

    Repair::Edits {
        message: format!("wrapped body content in <main id=\"{}\">", DEFAULT_LANDMARK_ID),
        edits: vec![
            Edit {
                offset: wrap_end,
                delete: 0,
                insert: "\n</main>\n".into(),
            },
            Edit {
                offset: wrap_start,
                delete: 0,
                insert: format!("\n<main id=\"{}\">\n", DEFAULT_LANDMARK_ID),
            },
        ],
    }
}

fn insert_skip_link(content: &str) -> Repair {
    let body = match BODY_OPEN.find(content) {
        Some(m) => m,
        None => {
            return Repair::Unfixable {
                reason: "no <body> element for the skip link".into(),
            }
        }
    };
    let (tag_start, tag_end) = match landmark_tag(content) {
        Some(t) => t,
        None => {
            return Repair::Unfixable {
                reason: "no landmark to target".into(),
            }
        }
    };
    let tag = &content[tag_start..tag_end];
    let mut edits: Vec<Edit> = Vec::new();
    let id = match ID_ATTR.captures(tag).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().to_string(),
        None => {
            edits.push(Edit {
                offset: attr_insert_offset(tag_start, tag),
                delete: 0,
                insert: format!(" id=\"{}\"", DEFAULT_LANDMARK_ID),
            });
            DEFAULT_LANDMARK_ID.to_string()
        }
    };
    edits.push(Edit {
        offset: body.end(),
        delete: 0,
        insert: format!(
            "\n<a class=\"skip-link\" href=\"#{}\">Skip to main content</a>",
            id
        ),
    });
    Repair::Edits {
        message: format!("inserted skip link targeting #{}", id),
        edits,
    }
}

fn attr_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
