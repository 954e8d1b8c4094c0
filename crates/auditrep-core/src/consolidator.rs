//! Consolidation of rows sharing a spreadsheet evidence file.
//!
//! A workbook often backs several process rows (one per sheet or per
//! customer entry), but the rendered table shows it once. Rows naming the
//! same spreadsheet are folded into the first of them:
//!
//! - every merged row's process name is kept in `consolidated_processes`
//! - the classification is the dominant of all merged flags
//! - non-empty comments are joined with `"; "`
//!
//! Other rows pass through in order; merged groups follow them in
//! first-seen order.

use crate::evidence::is_spreadsheet_name;
use crate::types::{Category, ProcessRow};

/// Separator between merged comments.
pub const COMMENT_SEPARATOR: &str = "; ";

/// Consolidate rows that reference the same spreadsheet evidence.
///
/// Spreadsheet evidence is matched by exact file name, ignoring case.
pub fn consolidate(body: Vec<ProcessRow>, spreadsheet_extensions: &[String]) -> Vec<ProcessRow> {
    let mut passthrough = Vec::new();
    let mut groups: Vec<(String, ProcessRow, Vec<String>)> = Vec::new();

    for row in body {
        let evidence = row.sighted_evidence.trim();
        if evidence.is_empty() || !is_spreadsheet_name(evidence, spreadsheet_extensions) {
            passthrough.push(row);
            continue;
        }

        let key = evidence.to_lowercase();
        match groups.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, base, processes)) => {
                processes.extend(merged_names(&row));
                fold_into(base, row);
            }
            None => {
                let processes = merged_names(&row);
                groups.push((key, row, processes));
            }
        }
    }

    let merged = groups.into_iter().map(|(key, mut base, processes)| {
        if processes.len() > 1 {
            tracing::debug!(evidence = %key, count = processes.len(), "Consolidated spreadsheet rows");
            base.consolidated_processes = processes;
        }
        base
    });

    passthrough.into_iter().chain(merged).collect()
}

/// Process names a row contributes to a group.
fn merged_names(row: &ProcessRow) -> Vec<String> {
    if row.is_consolidated() {
        row.consolidated_processes.clone()
    } else {
        vec![row.process.clone()]
    }
}

/// Merge an incoming row's flag and comments into the group base.
fn fold_into(base: &mut ProcessRow, incoming: ProcessRow) {
    base.classification = Category::dominant(base.classification, incoming.classification);

    let comment = incoming.additional_comments.trim();
    if comment.is_empty() {
        return;
    }
    if base.additional_comments.trim().is_empty() {
        base.additional_comments = comment.to_string();
    } else {
        base.additional_comments.push_str(COMMENT_SEPARATOR);
        base.additional_comments.push_str(comment);
    }
}
