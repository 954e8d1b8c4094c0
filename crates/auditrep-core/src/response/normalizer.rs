//! Row normalization for the process/evidence table.
//!
//! The table header names the columns; each data row is mapped onto a
//! [`ProcessRow`] through that header, with cell labels stripped and
//! classification marks resolved to a single category.

use crate::types::{Category, ProcessRow};

use super::format::{EVIDENCE_LABEL_PATTERN, PROCESS_LABEL_PATTERN};

/// Number of cells in the process table.
pub const PROCESS_TABLE_WIDTH: usize = 7;

/// What a table column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Process,
    SightedEvidence,
    Flag(Category),
    Comments,
    Other,
}

impl ColumnKind {
    /// Classify a header cell.
    pub fn from_header(name: &str) -> Self {
        let upper = name.trim().trim_matches('*').trim().to_uppercase();
        if upper.starts_with("PROCESS") {
            ColumnKind::Process
        } else if upper.starts_with("SIGHTED") {
            ColumnKind::SightedEvidence
        } else if let Some(category) = Category::from_code(&upper) {
            ColumnKind::Flag(category)
        } else if upper.contains("COMMENT") {
            ColumnKind::Comments
        } else {
            ColumnKind::Other
        }
    }
}

/// Column layout taken from the table's header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTemplate {
    columns: Vec<ColumnKind>,
}

impl ColumnTemplate {
    /// Build a template from a header line's cells.
    ///
    /// Returns `None` unless the line has exactly seven cells and the first
    /// one is `PROCESS` (any case).
    pub fn from_header_cells(cells: &[&str]) -> Option<Self> {
        if cells.len() != PROCESS_TABLE_WIDTH || !cells[0].eq_ignore_ascii_case("PROCESS") {
            return None;
        }
        Some(Self {
            columns: cells.iter().map(|c| ColumnKind::from_header(c)).collect(),
        })
    }

    pub fn columns(&self) -> &[ColumnKind] {
        &self.columns
    }

    /// Map a data line's cells onto a row.
    ///
    /// Returns `None` when the cell count does not match the template.
    /// Emptiness is not checked here, see [`is_malformed_process`].
    pub fn parse_row(&self, cells: &[&str]) -> Option<ProcessRow> {
        if cells.len() != self.columns.len() {
            return None;
        }

        let mut row = ProcessRow::default();
        let mut flags = Vec::new();

        for (kind, cell) in self.columns.iter().zip(cells) {
            let value = cell.trim();
            match kind {
                ColumnKind::Process => {
                    row.process = PROCESS_LABEL_PATTERN.replace(value, "").trim().to_string();
                }
                ColumnKind::SightedEvidence => {
                    row.sighted_evidence =
                        EVIDENCE_LABEL_PATTERN.replace(value, "").trim().to_string();
                }
                ColumnKind::Flag(category) => {
                    if is_flag_set(value) {
                        flags.push(*category);
                    }
                }
                ColumnKind::Comments => row.additional_comments = value.to_string(),
                ColumnKind::Other => {}
            }
        }

        row.classification = Category::resolve(flags);
        Some(row)
    }
}

/// Whether a classification cell carries a mark.
///
/// Any non-blank content counts (check marks, crosses, "Yes"); a bare dash
/// is a placeholder.
pub fn is_flag_set(cell: &str) -> bool {
    let value = cell.trim();
    !value.is_empty() && !value.chars().all(|c| matches!(c, '-' | '–' | '—'))
}

/// Whether a process value marks a row to drop.
///
/// A process is malformed when it is empty, equals one of the sentinels,
/// or consists only of hyphens/pipes (table residue).
pub fn is_malformed_process(process: &str, sentinels: &[String]) -> bool {
    let value = process.trim();
    value.is_empty()
        || sentinels.iter().any(|s| s == value)
        || value.chars().all(|c| matches!(c, '-' | '|' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [&str; 7] = [
        "PROCESS",
        "SIGHTED EVIDENCE",
        "OK",
        "OFI",
        "NC",
        "NA",
        "ADDITIONAL COMMENTS",
    ];

    fn sentinels() -> Vec<String> {
        vec!["[EMPTY]".to_string(), "EMPTY".to_string()]
    }

    #[test]
    fn test_header_requires_seven_cells_and_process() {
        assert!(ColumnTemplate::from_header_cells(&HEADER).is_some());
        assert!(ColumnTemplate::from_header_cells(&HEADER[..6]).is_none());

        let mut wrong = HEADER;
        wrong[0] = "STEP";
        assert!(ColumnTemplate::from_header_cells(&wrong).is_none());

        let mut lower = HEADER;
        lower[0] = "process";
        assert!(ColumnTemplate::from_header_cells(&lower).is_some());
    }

    #[test]
    fn test_column_kinds() {
        let template = ColumnTemplate::from_header_cells(&HEADER).unwrap();
        assert_eq!(
            template.columns(),
            &[
                ColumnKind::Process,
                ColumnKind::SightedEvidence,
                ColumnKind::Flag(Category::Ok),
                ColumnKind::Flag(Category::Ofi),
                ColumnKind::Flag(Category::Nc),
                ColumnKind::Flag(Category::Na),
                ColumnKind::Comments,
            ]
        );
    }

    #[test]
    fn test_labels_stripped() {
        let template = ColumnTemplate::from_header_cells(&HEADER).unwrap();
        let row = template
            .parse_row(&[
                "Process: Customer Feedback",
                "EVIDENCE: feedback.xlsx",
                "✓",
                "",
                "",
                "",
                "Reviewed monthly",
            ])
            .unwrap();

        assert_eq!(row.process, "Customer Feedback");
        assert_eq!(row.sighted_evidence, "feedback.xlsx");
        assert_eq!(row.classification, Some(Category::Ok));
        assert_eq!(row.additional_comments, "Reviewed monthly");
        assert!(row.consolidated_processes.is_empty());
    }

    #[test]
    fn test_multiple_flags_resolve_to_nc() {
        let template = ColumnTemplate::from_header_cells(&HEADER).unwrap();
        let row = template
            .parse_row(&["Purchasing", "po.pdf", "✓", "✓", "X", "", ""])
            .unwrap();
        assert_eq!(row.classification, Some(Category::Nc));
    }

    #[test]
    fn test_dash_is_not_a_flag() {
        assert!(!is_flag_set(" - "));
        assert!(!is_flag_set("—"));
        assert!(is_flag_set("✔"));
        assert!(is_flag_set("x"));
    }

    #[test]
    fn test_row_width_mismatch() {
        let template = ColumnTemplate::from_header_cells(&HEADER).unwrap();
        assert!(template.parse_row(&["a", "b"]).is_none());
    }

    #[test]
    fn test_malformed_process() {
        let sentinels = sentinels();
        assert!(is_malformed_process("", &sentinels));
        assert!(is_malformed_process("  ", &sentinels));
        assert!(is_malformed_process("[EMPTY]", &sentinels));
        assert!(is_malformed_process("---", &sentinels));
        assert!(is_malformed_process("| |", &sentinels));
        assert!(!is_malformed_process("Training", &sentinels));
        assert!(!is_malformed_process("Re-work", &sentinels));
    }
}
