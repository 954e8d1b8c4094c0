//! Corrective action register entries derived from an assembled report.
//!
//! One entry summarizes a whole report. Writing it to the register
//! spreadsheet is left to the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assembler::AssembledReport;
use crate::types::Category;

const DEFAULT_ROOT_CAUSE: &str = "Infancy of the quality management system";
const DEFAULT_PERSON: &str = "Management team";
const DETAILS_FALLBACK: &str = "Refer to full audit report for process improvement details.";
const ACTION_FALLBACK: &str = "Implement process improvements based on audit findings.";
const DETAILS_SEPARATOR: &str = " | ";

/// Keyword groups and the action proposed when any keyword appears in the details.
const ACTION_TABLE: &[(&[&str], &str)] = &[
    (
        &["documentation", "record", "document"],
        "Revise documentation system to ensure proper maintenance and accessibility of quality records.",
    ),
    (
        &["training", "competence", "knowledge"],
        "Implement targeted training program to address identified competency gaps.",
    ),
    (
        &["customer", "client", "feedback"],
        "Enhance customer feedback mechanism and implement systematic review process for complaints and suggestions.",
    ),
    (
        &["equipment", "maintenance", "calibration"],
        "Revise equipment maintenance schedule and establish verification procedures for critical equipment.",
    ),
    (
        &["supplier", "vendor", "purchasing"],
        "Improve supplier evaluation process and implement regular performance reviews for critical suppliers.",
    ),
];

const PROCESS_CONTROL_ACTION: &str =
    "Establish additional process controls and monitoring mechanisms to prevent recurrence.";

/// Source keywords, checked in order against the lower-cased response.
const SOURCE_TABLE: &[(&[&str], &str)] = &[
    (&["external audit", "third party"], "External Audit"),
    (&["customer complaint", "client feedback"], "Customer Complaint"),
    (&["management review"], "Management Review"),
    (&["employee suggestion", "staff feedback"], "Employee Suggestion"),
];

const INTERNAL_AUDIT: &str = "Internal Audit";

/// Register classification of a report's issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(rename = "Nonconformance")]
    Nonconformance,
    #[serde(rename = "Opportunity for Improvement")]
    OpportunityForImprovement,
}

impl IssueType {
    /// The register type a finding category maps to; OK and NA map to none.
    pub fn from_category(category: Category) -> Option<Self> {
        match category {
            Category::Nc => Some(IssueType::Nonconformance),
            Category::Ofi => Some(IssueType::OpportunityForImprovement),
            Category::Ok | Category::Na => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IssueType::Nonconformance => "Nonconformance",
            IssueType::OpportunityForImprovement => "Opportunity for Improvement",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One corrective action register row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectiveAction {
    pub date: NaiveDate,
    pub source_of_issue: String,
    pub issue_type: IssueType,
    pub details: String,
    pub root_cause: String,
    pub person: String,
    pub corrective_action: String,
    #[serde(default)]
    pub close_out_date: Option<NaiveDate>,
}

/// Build the register entry for an assembled report.
///
/// `raw` is the generated response text, scanned for the issue source.
pub fn derive_corrective_action(
    report: &AssembledReport,
    raw: &str,
    date: NaiveDate,
) -> CorrectiveAction {
    let issue_type = report
        .findings()
        .filter_map(|(_, category)| IssueType::from_category(category))
        .min_by_key(|t| match t {
            IssueType::Nonconformance => 0,
            IssueType::OpportunityForImprovement => 1,
        })
        .unwrap_or(IssueType::OpportunityForImprovement);

    let details = report
        .findings()
        .filter_map(|(row, _)| {
            row.finding
                .as_deref()
                .map(|comment| format!("Issue in {} process: {}", row.row.finding_label(), comment))
        })
        .collect::<Vec<_>>()
        .join(DETAILS_SEPARATOR);

    let (details, corrective_action) = if details.is_empty() {
        (DETAILS_FALLBACK.to_string(), ACTION_FALLBACK.to_string())
    } else {
        let action = suggest_action(&details, issue_type).to_string();
        (details, action)
    };

    let source_of_issue = source_of_issue(raw, report.header.get("AUDIT TYPE"));
    tracing::debug!(
        issue_type = %issue_type,
        source = %source_of_issue,
        "Derived corrective action"
    );

    CorrectiveAction {
        date,
        source_of_issue,
        issue_type,
        details,
        root_cause: DEFAULT_ROOT_CAUSE.to_string(),
        person: DEFAULT_PERSON.to_string(),
        corrective_action,
        close_out_date: None,
    }
}

/// Pick a corrective action from keywords in the finding details.
pub fn suggest_action(details: &str, issue_type: IssueType) -> &'static str {
    let lower = details.to_lowercase();

    let matched = ACTION_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, action)| *action);
    if let Some(action) = matched {
        return action;
    }

    if lower.contains("process") && (lower.contains("control") || lower.contains("monitoring")) {
        return PROCESS_CONTROL_ACTION;
    }

    match issue_type {
        IssueType::Nonconformance => {
            "Conduct root cause analysis and implement systemic changes to prevent recurrence of the nonconformity."
        }
        IssueType::OpportunityForImprovement => {
            "Develop and implement process enhancements to address the identified opportunity for improvement."
        }
    }
}

/// Where the issue came from, judged from the response text.
///
/// Falls back to the `AUDIT TYPE` header value, then to internal audit.
pub fn source_of_issue(raw: &str, audit_type: Option<&str>) -> String {
    let lower = raw.to_lowercase();

    if let Some((_, source)) = SOURCE_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
    {
        return source.to_string();
    }
    if lower.contains("monitoring") && lower.contains("process") {
        return "Process Monitoring".to_string();
    }
    if lower.contains("internal audit") {
        return INTERNAL_AUDIT.to_string();
    }

    match audit_type.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) if t.to_lowercase().contains("internal") => INTERNAL_AUDIT.to_string(),
        Some(t) if t.to_lowercase().contains("external") => "External Audit".to_string(),
        Some(t) => t.to_string(),
        None => INTERNAL_AUDIT.to_string(),
    }
}

impl CorrectiveAction {
    /// Whether the report had any nonconformity.
    pub fn is_nonconformance(&self) -> bool {
        self.issue_type == IssueType::Nonconformance
    }

    /// Register date in `dd/mm/yyyy`.
    pub fn date_display(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }
}
