//! Type-annotation coverage scan.
//!
//! Counts annotated vs. unannotated `def` signatures in a project's Python
//! files. This is a line-oriented approximation, not a parse: a signature is
//! considered annotated when it declares a return type (`->`) or any
//! parameter annotation (a `:` directly inside the parameter list). That is
//! the full extent of source analysis the engine performs.

use crate::core::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Directories that never hold first-party source.
const EXCLUDED_DIRS: &[&str] = &[
    "venv",
    ".venv",
    "env",
    ".env",
    "node_modules",
    "__pycache__",
    ".git",
    "build",
    "dist",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageStats {
    /// Percentage 0-100. A project with no functions counts as fully typed.
    pub percentage: f64,
    pub typed_functions: usize,
    pub total_functions: usize,
}

impl CoverageStats {
    fn from_counts(typed: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            typed as f64 / total as f64 * 100.0
        };
        CoverageStats {
            percentage,
            typed_functions: typed,
            total_functions: total,
        }
    }
}

fn def_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:async\s+)?def\s+\w+\s*\(").expect("valid regex"))
}

/// Scan every `.py` file under `root`, skipping vendored directories.
/// Unreadable or non-UTF-8 files are skipped silently; the scan never fails
/// on file content.
pub fn annotation_coverage(root: &Path) -> Result<CoverageStats> {
    let mut typed = 0;
    let mut total = 0;

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        entry
            .file_name()
            .to_str()
            .map(|name| !EXCLUDED_DIRS.contains(&name))
            .unwrap_or(true)
    });

    for entry in walker {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        let Ok(source) = std::fs::read_to_string(path) else {
            continue;
        };
        let (file_typed, file_total) = count_signatures(&source);
        typed += file_typed;
        total += file_total;
    }

    Ok(CoverageStats::from_counts(typed, total))
}

/// Count (annotated, total) function signatures in one source text.
pub fn count_signatures(source: &str) -> (usize, usize) {
    let lines: Vec<&str> = source.lines().collect();
    let mut typed = 0;
    let mut total = 0;

    for (i, line) in lines.iter().enumerate() {
        if !def_regex().is_match(line) {
            continue;
        }
        total += 1;
        if signature_is_annotated(&lines[i..]) {
            typed += 1;
        }
    }

    (typed, total)
}

/// Walk the signature starting at its `def` line until the parameter list
/// closes. Annotated when a `:` appears at bracket depth 1 (a parameter
/// annotation) or a `->` follows the closing paren.
fn signature_is_annotated(lines: &[&str]) -> bool {
    let mut depth = 0usize;
    let mut seen_open = false;

    for line in lines.iter().take(50) {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '(' | '[' | '{' => {
                    depth += 1;
                    seen_open = true;
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    if seen_open && depth == 0 {
                        // Parameter list closed; annotated iff a return
                        // annotation follows on this line.
                        let rest: String = chars.collect();
                        return rest.contains("->");
                    }
                }
                ':' if depth == 1 => return true,
                '#' if depth == 0 => break,
                _ => {}
            }
        }
    }
    false
}
