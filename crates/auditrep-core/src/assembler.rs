//! Report assembler: runs the full pipeline for one report.
//!
//! raw text → tokenize → consolidate → match → classify → aggregate
//!
//! Each call to [`ReportAssembler::assemble`] opens its own
//! [`MatchSession`], so one assembler can serve concurrent reports.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::aggregator::{finding_entry, Findings, FooterAggregator};
use crate::classifier::{CategoryClassifier, Classification};
use crate::config::AssemblyConfig;
use crate::consolidator::consolidate;
use crate::evidence::EvidencePool;
use crate::matcher::{EvidenceMatch, EvidenceMatcher, MatchSession, MatchTier};
use crate::response::SectionTokenizer;
use crate::types::{Category, FieldMap, ProcessRow, SectionModel};

/// The artifact attached to a row, as handed to the template step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowEvidence {
    pub file_name: String,
    pub tier: MatchTier,

    /// Format tag of the image rendered into the evidence cell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_format: Option<String>,

    /// Source label of that image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_label: Option<String>,

    pub image_count: usize,

    /// Effective score of the artifact, as text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
}

impl RowEvidence {
    fn from_match(found: &EvidenceMatch<'_>) -> Self {
        let artifact = found.artifact;
        let primary = artifact.primary_image();
        Self {
            file_name: artifact.file_name.clone(),
            tier: found.tier,
            image_format: primary.map(|img| img.format.clone()),
            image_label: primary
                .map(|img| img.label.clone())
                .filter(|label| !label.is_empty()),
            image_count: artifact.images.len(),
            score: artifact.score().map(|s| s.to_string()),
        }
    }
}

/// One process row after matching and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledRow {
    #[serde(flatten)]
    pub row: ProcessRow,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<RowEvidence>,

    /// Comment promoted to the footer for NC/OFI rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding: Option<String>,
}

impl AssembledRow {
    pub fn category(&self) -> Option<Category> {
        self.row.classification
    }

    /// Hex fill for the checkmark cell.
    pub fn fill_color(&self) -> Option<&'static str> {
        self.row.classification.map(|c| c.fill_color())
    }
}

/// Output of one assembly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssembledReport {
    pub header: FieldMap,
    pub legend: BTreeMap<Category, String>,
    pub rows: Vec<AssembledRow>,
    pub footer: FieldMap,

    /// Distinct audited process names, title-cased
    pub processes: Vec<String>,
}

impl AssembledReport {
    /// The report as a plain section model.
    pub fn section_model(&self) -> SectionModel {
        SectionModel {
            header: self.header.clone(),
            legend: self.legend.clone(),
            body: self.rows.iter().map(|r| r.row.clone()).collect(),
            footer: self.footer.clone(),
        }
    }

    /// Rows carrying a finding, with their category.
    pub fn findings(&self) -> impl Iterator<Item = (&AssembledRow, Category)> {
        self.rows.iter().filter_map(|row| match (row.category(), &row.finding) {
            (Some(category), Some(_)) if category.is_finding() => Some((row, category)),
            _ => None,
        })
    }

    pub fn has_nonconformity(&self) -> bool {
        self.rows.iter().any(|r| r.category() == Some(Category::Nc))
    }
}

/// Assembles reports under one configuration.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    config: AssemblyConfig,
    classifier: CategoryClassifier,
    aggregator: FooterAggregator,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new(AssemblyConfig::default())
    }
}

impl ReportAssembler {
    pub fn new(config: AssemblyConfig) -> Self {
        let classifier = CategoryClassifier::new(config.thresholds);
        let aggregator = FooterAggregator::new(&config);
        Self {
            config,
            classifier,
            aggregator,
        }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Tokenize raw text without touching evidence.
    pub fn parse(&self, raw: &str) -> SectionModel {
        SectionTokenizer::new(&self.config).tokenize(raw)
    }

    /// Run the whole pipeline against an evidence pool.
    pub fn assemble(&self, raw: &str, pool: &EvidencePool) -> AssembledReport {
        let SectionModel {
            header,
            legend,
            body,
            mut footer,
        } = self.parse(raw);

        let body = consolidate(body, &self.config.spreadsheet_extensions);
        let matcher = EvidenceMatcher::new(pool);
        let mut session = MatchSession::new();
        let mut seen = HashSet::new();
        let mut findings = Findings::new();
        let mut rows = Vec::with_capacity(body.len());

        for row in body {
            let key = (
                row.process.trim().to_lowercase(),
                row.sighted_evidence.trim().to_lowercase(),
            );
            if !seen.insert(key) {
                tracing::info!(
                    process = %row.process,
                    evidence = %row.sighted_evidence,
                    "Skipping duplicate row"
                );
                continue;
            }

            let assembled = self.assemble_row(row, &matcher, &mut session);
            if let (Some(category), Some(comment)) = (assembled.category(), &assembled.finding) {
                findings.push(category, finding_entry(assembled.row.finding_label(), comment));
            }
            rows.push(assembled);
        }

        self.aggregator.strip_legend_codes(&mut footer);
        self.aggregator.aggregate(&mut footer, &findings);
        let date = self
            .config
            .report_date
            .unwrap_or_else(|| Utc::now().date_naive());
        self.aggregator.sign_off(&mut footer, date);

        tracing::info!(
            rows = rows.len(),
            nonconformities = findings.nc.len(),
            improvements = findings.ofi.len(),
            evidence_used = session.used_count(),
            "Assembled report"
        );

        let processes = process_list(&rows);
        AssembledReport {
            header,
            legend,
            rows,
            footer,
            processes,
        }
    }

    fn assemble_row(
        &self,
        mut row: ProcessRow,
        matcher: &EvidenceMatcher<'_>,
        session: &mut MatchSession,
    ) -> AssembledRow {
        let found = matcher.find(session, &row.process, &row.sighted_evidence);
        let classification = found.as_ref().map(|m| {
            let artifact = m.artifact;
            self.classifier.classify(
                artifact.score().as_ref(),
                artifact.is_spreadsheet(&self.config.spreadsheet_extensions),
            )
        });

        let explicit = row.classification;
        // A conforming score adds nothing to an explicit flag, NA included.
        let classified = classification
            .as_ref()
            .map(|c| c.category)
            .filter(|c| explicit.is_none() || *c != Category::Ok);
        let category = Category::dominant(explicit, classified);
        let finding = row_finding(&row, explicit, category, classification.as_ref());

        if let Some(c) = &classification {
            if Some(c.category) == category
                && !c.comment.is_empty()
                && row.additional_comments.trim().is_empty()
            {
                row.additional_comments = c.comment.clone();
            }
        }
        row.classification = category;

        AssembledRow {
            row,
            evidence: found.as_ref().map(RowEvidence::from_match),
            finding,
        }
    }
}

/// The comment a row promotes to the footer, if any.
fn row_finding(
    row: &ProcessRow,
    explicit: Option<Category>,
    category: Option<Category>,
    classification: Option<&Classification>,
) -> Option<String> {
    let category = category.filter(Category::is_finding)?;

    if let Some(c) = classification {
        if c.category == category && !c.comment.is_empty() {
            return Some(c.comment.clone());
        }
    }

    let comment = row.additional_comments.trim();
    (explicit == Some(category) && !comment.is_empty()).then(|| comment.to_string())
}

/// Distinct process names across rows, expanding merged rows.
fn process_list(rows: &[AssembledRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut processes = Vec::new();
    for assembled in rows {
        let row = &assembled.row;
        let names = if row.is_consolidated() {
            row.consolidated_processes.as_slice()
        } else {
            std::slice::from_ref(&row.process)
        };
        for name in names {
            let title = title_case(name);
            if !title.is_empty() && seen.insert(title.to_lowercase()) {
                processes.push(title);
            }
        }
    }
    processes
}

fn title_case(name: &str) -> String {
    name.replace(['_', '-'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{EvidenceArtifact, EvidenceImage};
    use chrono::NaiveDate;

    const RESPONSE: &str = "\
| AUDIT TITLE | Annual QMS Audit |
| AUDITEE | Operations |
| OK | Conforming |
| OFI | Opportunity for improvement |
| NC | Nonconformity |
| NA | Not applicable |
| PROCESS | SIGHTED EVIDENCE | OK | OFI | NC | NA | ADDITIONAL COMMENTS |
| Customer_Feedback | feedback.xlsx | | | | | |
| Complaints | feedback.xlsx | | | | | |
| Purchasing | po_register.pdf | | ✓ | | | Supplier list out of date |
| Purchasing | po_register.pdf | | ✓ | | | Supplier list out of date |
| Training | training_matrix.pdf | ✓ | | | | |
| NONCONFORMANCES | Nil |
| OPPORTUNITIES FOR IMPROVEMENTS | Nil |
| OK | leaked |
## AUDIT REPORT FINAL COMMENTS
The system is effective overall.
Internal Auditor";

    fn assembler() -> ReportAssembler {
        let config = AssemblyConfig::default()
            .with_report_date(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        ReportAssembler::new(config)
    }

    fn pool() -> EvidencePool {
        EvidencePool::new()
            .with(
                EvidenceArtifact::new("feedback.xlsx")
                    .with_image(EvidenceImage::new(vec![0x89], "png").with_label("feedback.xlsx sheet 1"))
                    .with_score("15/25"),
            )
            .with(EvidenceArtifact::new("po_register.pdf"))
            .with(EvidenceArtifact::new("training_matrix.pdf").with_score(9.0))
    }

    #[test]
    fn test_assemble_full_report() {
        let report = assembler().assemble(RESPONSE, &pool());

        assert_eq!(report.rows.len(), 3);
        let names: Vec<_> = report.rows.iter().map(|r| r.row.process.as_str()).collect();
        assert_eq!(names, vec!["Purchasing", "Training", "Customer_Feedback"]);

        let feedback = &report.rows[2];
        assert_eq!(feedback.category(), Some(Category::Nc));
        assert_eq!(feedback.fill_color(), Some("FF0000"));
        assert_eq!(feedback.row.consolidated_processes, vec!["Customer_Feedback", "Complaints"]);
        let evidence = feedback.evidence.as_ref().unwrap();
        assert_eq!(evidence.file_name, "feedback.xlsx");
        assert_eq!(evidence.tier, MatchTier::Exact);
        assert_eq!(evidence.image_label.as_deref(), Some("feedback.xlsx sheet 1"));
        assert_eq!(evidence.score.as_deref(), Some("15/25"));
        assert!(feedback.row.additional_comments.contains("15/25"));

        let nc = report.footer.get("NONCONFORMANCES").unwrap();
        assert!(nc.starts_with("feedback: Low score of 15/25"));
        assert_eq!(
            report.footer.get("OPPORTUNITIES FOR IMPROVEMENTS"),
            Some("Purchasing: Supplier list out of date")
        );
        assert!(!report.footer.contains_key("OK"));
        assert_eq!(
            report.footer.get("AUDIT REPORT FINAL COMMENTS"),
            Some("The system is effective overall.")
        );
    }

    #[test]
    fn test_explicit_flag_kept_when_classifier_is_ok() {
        let report = assembler().assemble(RESPONSE, &pool());
        let training = &report.rows[1];
        assert_eq!(training.category(), Some(Category::Ok));
        assert!(training.finding.is_none());
        assert_eq!(training.evidence.as_ref().map(|e| e.score.as_deref()), Some(Some("9")));
    }

    #[test]
    fn test_explicit_not_applicable_survives_matching() {
        let raw = "\
| PROCESS | SIGHTED EVIDENCE | OK | OFI | NC | NA | ADDITIONAL COMMENTS |
| Purchasing | po_register.pdf | | | | ✓ | No purchasing this period |
| Training | training_matrix.pdf | | | | ✓ | |";
        let pool = EvidencePool::new()
            .with(EvidenceArtifact::new("po_register.pdf"))
            .with(EvidenceArtifact::new("training_matrix.pdf").with_score(9.0));

        let report = assembler().assemble(raw, &pool);
        assert_eq!(report.rows.len(), 2);
        for row in &report.rows {
            assert!(row.evidence.is_some());
            assert_eq!(row.category(), Some(Category::Na));
            assert!(row.finding.is_none());
        }
        assert_eq!(report.footer.get("NONCONFORMANCES"), None);
    }

    #[test]
    fn test_low_score_still_overrides_explicit_flag() {
        let raw = "\
| PROCESS | SIGHTED EVIDENCE | OK | OFI | NC | NA | ADDITIONAL COMMENTS |
| Customer Feedback | feedback.xlsx | | | | ✓ | |";

        let report = assembler().assemble(raw, &pool());
        assert_eq!(report.rows[0].category(), Some(Category::Nc));
    }

    #[test]
    fn test_process_list() {
        let report = assembler().assemble(RESPONSE, &pool());
        assert_eq!(
            report.processes,
            vec!["Purchasing", "Training", "Customer Feedback", "Complaints"]
        );
    }

    #[test]
    fn test_empty_pool_keeps_explicit_flags() {
        let report = assembler().assemble(RESPONSE, &EvidencePool::new());
        assert!(report.rows.iter().all(|r| r.evidence.is_none()));
        assert_eq!(report.rows[2].category(), None);
        assert_eq!(report.footer.get("NONCONFORMANCES"), Some("Nil"));
    }

    #[test]
    fn test_empty_input() {
        let report = assembler().assemble("", &pool());
        assert!(report.rows.is_empty());
        assert!(report.header.is_empty());
        assert_eq!(
            report.footer.get("AUDIT REPORT FINAL COMMENTS"),
            Some("INTERNAL AUDITOR\n14/03/2025")
        );
    }

    #[test]
    fn test_section_model_view() {
        let report = assembler().assemble(RESPONSE, &pool());
        let model = report.section_model();
        assert_eq!(model.title(), Some("Annual QMS Audit"));
        assert_eq!(model.legend.len(), 4);
        assert_eq!(model.body.len(), 3);
        assert_eq!(report.findings().count(), 2);
        assert!(report.has_nonconformity());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("customer_feedback"), "Customer Feedback");
        assert_eq!(title_case("IN-HOUSE training"), "In House Training");
    }

    #[test]
    fn test_assembler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReportAssembler>();
        assert_send_sync::<AssembledReport>();
    }
}
