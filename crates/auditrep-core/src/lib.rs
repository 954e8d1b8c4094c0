//! # auditrep-core
//!
//! Deterministic assembly of generated audit reports.
//!
//! A language model fills an audit template as loose markdown. This crate
//! turns that text into a typed report and attaches supporting evidence:
//! - Which process rows did the report claim, and with what outcome?
//! - Which evidence file backs each row?
//! - What do the evidence scores say about compliance?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same text and evidence pool always produce the same report
//! 2. **No LLM calls**: Parsing, matching and classification are rule-based
//! 3. **Never fails on bad text**: Missing sections degrade to empty containers
//! 4. **Session-scoped state**: Evidence usage is tracked per assembly, never globally
//!
//! ## Example
//!
//! ```rust,ignore
//! use auditrep_core::{AssemblyConfig, EvidenceArtifact, EvidencePool, ReportAssembler};
//!
//! let config = AssemblyConfig::from_yaml_file("assembly.yaml")?;
//! let pool = EvidencePool::new()
//!     .with(EvidenceArtifact::new("feedback.xlsx").with_score("15/25"));
//!
//! let report = ReportAssembler::new(config).assemble(&raw_text, &pool);
//! for row in &report.rows {
//!     println!("{}: {:?}", row.row.process, row.category());
//! }
//! ```

pub mod aggregator;
pub mod assembler;
pub mod classifier;
pub mod config;
pub mod consolidator;
pub mod corrective;
pub mod evidence;
pub mod matcher;
pub mod response;
pub mod types;

// Re-export main types at crate root
pub use aggregator::{Findings, FooterAggregator};
pub use assembler::{AssembledReport, AssembledRow, ReportAssembler, RowEvidence};
pub use classifier::{extract_score, CategoryClassifier, Classification, ScoreError};
pub use config::{AssemblyConfig, ConfigError, FooterFields, SectionMarkers, Thresholds};
pub use consolidator::consolidate;
pub use corrective::{derive_corrective_action, CorrectiveAction, IssueType};
pub use evidence::{EvidenceArtifact, EvidenceImage, EvidencePool};
pub use matcher::{EvidenceMatch, EvidenceMatcher, MatchSession, MatchTier};
pub use response::SectionTokenizer;
pub use types::{Category, FieldMap, ProcessRow, Score, SectionModel};

/// Parse generated report text with the default configuration.
pub fn parse_response(raw: &str) -> SectionModel {
    ReportAssembler::default().parse(raw)
}

/// Assemble a report with the default configuration.
///
/// The sign-off date is today (UTC); use [`ReportAssembler`] with
/// [`AssemblyConfig::with_report_date`] for reproducible output.
pub fn assemble(raw: &str, pool: &EvidencePool) -> AssembledReport {
    ReportAssembler::default().assemble(raw, pool)
}
