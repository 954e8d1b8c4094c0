//! Text patterns and value formatting for generated report text.
//!
//! The generator writes multi-line cell values with HTML line breaks and
//! inline bullet dashes; these are rewritten into plain newline-separated
//! text before the template step sees them.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// Any HTML line break variant: `<br>`, `<br/>`, `<BR />`
    pub static ref LINE_BREAK_PATTERN: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();

    /// One or more line breaks (with trailing whitespace) at the end of a value
    static ref TRAILING_BREAKS_PATTERN: Regex = Regex::new(r"(?i)(?:<br\s*/?>\s*)+$").unwrap();

    /// A run of line breaks inside a value
    static ref BREAK_RUN_PATTERN: Regex = Regex::new(r"(?i)(?:<br\s*/?>[ \t]*)+").unwrap();

    /// A bullet dash with its surrounding horizontal whitespace
    static ref BULLET_PATTERN: Regex = Regex::new(r"[ \t]*-[ \t]+").unwrap();

    /// Leading "Process:" label in a process cell
    pub static ref PROCESS_LABEL_PATTERN: Regex = Regex::new(r"(?i)^process:\s*").unwrap();

    /// Leading "Evidence:" label in an evidence cell
    pub static ref EVIDENCE_LABEL_PATTERN: Regex = Regex::new(r"(?i)^evidence:\s*").unwrap();
}

/// Check if a value contains any HTML line break.
pub fn has_line_breaks(value: &str) -> bool {
    LINE_BREAK_PATTERN.is_match(value)
}

/// Normalize a multi-line field value.
///
/// 1. Trailing line breaks are dropped.
/// 2. Each run of inner line breaks becomes one newline.
/// 3. A newline is inserted before every bullet dash not already at line start.
pub fn format_multiline(value: &str) -> String {
    let trimmed = value.trim();
    let without_trailing = TRAILING_BREAKS_PATTERN.replace(trimmed, "");
    let with_newlines = BREAK_RUN_PATTERN.replace_all(without_trailing.trim_end(), "\n");
    let text = with_newlines.as_ref();

    BULLET_PATTERN
        .replace_all(text, |caps: &Captures| {
            let start = caps.get(0).map_or(0, |m| m.start());
            if start == 0 || text[..start].ends_with('\n') {
                "- ".to_string()
            } else {
                "\n- ".to_string()
            }
        })
        .into_owned()
}

/// Whether a line is a markdown table separator (`|---|:--:|`).
pub fn is_separator_row(line: &str) -> bool {
    let inner = line.trim().trim_matches('|');
    inner.contains('-')
        && inner
            .split('|')
            .all(|cell| cell.trim().chars().all(|c| matches!(c, '-' | ':' | '+')))
}

/// Whether a line is a markdown heading.
pub fn is_heading(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Heading text without the marker, emphasis, or trailing colon.
pub fn heading_text(line: &str) -> &str {
    line.trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches('*')
        .trim()
        .trim_end_matches(':')
        .trim()
}

/// Split a pipe-delimited line into trimmed cells.
///
/// Leading and trailing pipes are ignored, so `| a | b |` and `a | b` both
/// yield two cells.
pub fn split_cells(line: &str) -> Vec<&str> {
    line.trim()
        .trim_matches('|')
        .split('|')
        .map(str::trim)
        .collect()
}
