//! Property-Based Tests
//!
//! Invariants of the assembly pipeline over generated inputs:
//! - Tokenizing never panics and empty text gives an empty model
//! - Simultaneous flags always resolve to the dominant category
//! - Consolidation is idempotent and keeps every merged process name
//! - Evidence is never reused while unused artifacts remain

use auditrep_core::{
    consolidate, parse_response, AssemblyConfig, Category, CategoryClassifier, EvidenceArtifact,
    EvidenceMatcher, EvidencePool, MatchSession, ProcessRow, Score, SectionModel,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn spreadsheet_exts() -> Vec<String> {
    AssemblyConfig::default().spreadsheet_extensions
}

// ============================================================================
// Tokenizer Properties
// ============================================================================

/// Property: Arbitrary text never panics the tokenizer
#[test]
fn proptest_tokenize_no_panic() {
    proptest!(|(text in ".*{0,500}")| {
        let _ = parse_response(&text);
    });
}

/// Property: Pipe-heavy text never panics the tokenizer
#[test]
fn proptest_tokenize_table_noise() {
    proptest!(|(text in "[|A-Z #:\\-\n<br>✓]{0,400}")| {
        let model = parse_response(&text);
        for row in &model.body {
            prop_assert!(!row.process.trim().is_empty());
        }
    });
}

/// Property: Whitespace-only text yields four empty partitions
#[test]
fn proptest_blank_text_is_empty() {
    proptest!(|(text in "[ \t\n]{0,50}")| {
        prop_assert_eq!(parse_response(&text), SectionModel::default());
    });
}

// ============================================================================
// Precedence Properties
// ============================================================================

/// Property: Any set of marked flag cells resolves to the highest-ranked one
#[test]
fn proptest_flag_precedence() {
    proptest!(|(flags in proptest::array::uniform4(any::<bool>()))| {
        let cells: Vec<&str> = flags.iter().map(|set| if *set { "✓" } else { "" }).collect();
        let raw = format!(
            "| PROCESS | SIGHTED EVIDENCE | OK | OFI | NC | NA | ADDITIONAL COMMENTS |\n\
             | Sales | sales.pdf | {} | {} | {} | {} | |",
            cells[0], cells[1], cells[2], cells[3]
        );

        let expected = Category::ALL
            .into_iter()
            .zip(flags)
            .filter(|(_, set)| *set)
            .map(|(c, _)| c)
            .max_by_key(Category::rank);

        let model = parse_response(&raw);
        prop_assert_eq!(model.body.len(), 1);
        prop_assert_eq!(model.body[0].classification, expected);
    });
}

// ============================================================================
// Consolidation Properties
// ============================================================================

fn arb_row() -> impl Strategy<Value = ProcessRow> {
    (
        "[A-D][a-z]{0,4}",
        prop_oneof![
            Just("a.xlsx"),
            Just("A.XLSX"),
            Just("b.xls"),
            Just("c.pdf"),
            Just("d.docx"),
        ],
        proptest::option::of(prop_oneof![
            Just(Category::Ok),
            Just(Category::Ofi),
            Just(Category::Nc),
            Just(Category::Na),
        ]),
        "[a-z ]{0,6}",
    )
        .prop_map(|(process, evidence, flag, comments)| {
            let mut row = ProcessRow::new(process, evidence).with_comments(comments);
            row.classification = flag;
            row
        })
}

/// Property: Consolidating twice equals consolidating once
#[test]
fn proptest_consolidation_idempotent() {
    proptest!(|(rows in proptest::collection::vec(arb_row(), 0..12))| {
        let exts = spreadsheet_exts();
        let once = consolidate(rows, &exts);
        let twice = consolidate(once.clone(), &exts);
        prop_assert_eq!(once, twice);
    });
}

/// Property: A merged row lists every merged process, in input order
#[test]
fn proptest_consolidated_processes_complete() {
    proptest!(|(rows in proptest::collection::vec(arb_row(), 0..12))| {
        let exts = spreadsheet_exts();
        let out = consolidate(rows.clone(), &exts);

        for merged in out.iter().filter(|r| r.is_consolidated()) {
            let key = merged.sighted_evidence.to_lowercase();
            let expected: Vec<String> = rows
                .iter()
                .filter(|r| r.sighted_evidence.to_lowercase() == key)
                .map(|r| r.process.clone())
                .collect();
            prop_assert!(merged.consolidated_processes.len() >= 2);
            prop_assert_eq!(&merged.consolidated_processes, &expected);
        }

        let distinct_sheets: HashSet<String> = rows
            .iter()
            .filter(|r| !r.sighted_evidence.ends_with(".pdf") && !r.sighted_evidence.ends_with(".docx"))
            .map(|r| r.sighted_evidence.to_lowercase())
            .collect();
        let passthrough = rows.len() - rows.iter().filter(|r| distinct_sheets.contains(&r.sighted_evidence.to_lowercase())).count();
        prop_assert_eq!(out.len(), passthrough + distinct_sheets.len());
    });
}

// ============================================================================
// Classifier Properties
// ============================================================================

/// Property: X/25 lands on the documented side of each threshold
#[test]
fn proptest_twenty_five_point_fractions() {
    proptest!(|(x in 0u32..=25)| {
        let result = CategoryClassifier::default().classify(Some(&Score::Text(format!("{}/25", x))), false);
        let percent = x * 4;
        let expected = if percent >= 80 {
            Category::Ok
        } else if percent >= 70 {
            Category::Ofi
        } else {
            Category::Nc
        };
        prop_assert_eq!(result.category, expected);
        prop_assert_eq!(result.comment.is_empty(), expected == Category::Ok);
    });
}

/// Property: Classification never panics on arbitrary score text
#[test]
fn proptest_classify_any_text() {
    proptest!(|(text in "\\PC{0,20}", spreadsheet in any::<bool>())| {
        let _ = CategoryClassifier::default().classify(Some(&Score::Text(text)), spreadsheet);
    });
}

// ============================================================================
// Matcher Properties
// ============================================================================

/// Property: The first N lookups against N artifacts never reuse one
#[test]
fn proptest_no_reuse_before_exhaustion() {
    proptest!(|(
        names in proptest::collection::hash_set("[a-z]{1,6}\\.(pdf|xlsx|png)", 1..8),
        queries in proptest::collection::vec("[a-z .]{0,10}", 8..12),
    )| {
        let pool: EvidencePool = names.iter().map(|n| EvidenceArtifact::new(n.as_str())).collect();
        let matcher = EvidenceMatcher::new(&pool);
        let mut session = MatchSession::new();

        let mut assigned = HashSet::new();
        for (i, query) in queries.iter().enumerate() {
            let found = matcher.find(&mut session, query, query);
            prop_assert!(found.is_some());
            if i < pool.len() {
                let found = found.unwrap();
                prop_assert!(!found.tier.is_reuse());
                prop_assert!(assigned.insert(found.artifact.file_name.clone()));
            }
        }
        prop_assert_eq!(session.used_count(), pool.len());
    });
}
