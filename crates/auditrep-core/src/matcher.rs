//! Evidence matcher: resolves each process row to one artifact of the pool.
//!
//! Generated rows often misname or paraphrase the evidence file, so
//! resolution degrades through tiers, each tried against unused artifacts
//! in pool order:
//!
//! 1. **Exact**: the file name equals the row's evidence text; failing that,
//!    one contains the other
//! 2. **Keyword overlap**: row and file-name token sets intersect
//! 3. **Loose keyword**: a row token longer than two characters appears in the file name
//! 4. **First unused**: the earliest artifact not yet assigned
//!
//! Once every artifact has been used, the best-overlap score picks one for
//! reuse, falling back to the first artifact in the pool.
//!
//! The "used" set lives in a [`MatchSession`] owned by the caller, one per
//! report, so concurrent assemblies never share state.

use std::collections::HashSet;

use crate::evidence::{EvidenceArtifact, EvidencePool};

/// Overlap bonus for a process or evidence string found verbatim in a file name.
const EXACT_SUBSTRING_BONUS: usize = 10;

/// Minimum token length (exclusive) for the loose keyword tier.
const LOOSE_TOKEN_MIN_LEN: usize = 2;

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    KeywordOverlap,
    LooseKeyword,
    FirstUnused,
    BestOverlap,
    FirstInPool,
}

impl MatchTier {
    /// Whether this tier reuses an already-assigned artifact.
    pub fn is_reuse(&self) -> bool {
        matches!(self, MatchTier::BestOverlap | MatchTier::FirstInPool)
    }
}

/// Artifacts assigned so far while assembling one report.
#[derive(Debug, Clone, Default)]
pub struct MatchSession {
    used: HashSet<String>,
}

impl MatchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_used(&self, file_name: &str) -> bool {
        self.used.contains(file_name)
    }

    pub fn mark_used(&mut self, file_name: &str) {
        self.used.insert(file_name.to_string());
    }

    pub fn used_count(&self) -> usize {
        self.used.len()
    }
}

/// A resolved artifact and the tier that found it.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceMatch<'p> {
    pub artifact: &'p EvidenceArtifact,
    pub tier: MatchTier,
}

/// Matches rows against a read-only evidence pool.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceMatcher<'p> {
    pool: &'p EvidencePool,
}

/// Lower-cased row strings and their tokens, computed once per lookup.
struct RowKeys {
    process: String,
    evidence: String,
    tokens: HashSet<String>,
}

impl RowKeys {
    fn new(process: &str, evidence: &str) -> Self {
        let process = process.trim().to_lowercase();
        let evidence = evidence.trim().to_lowercase();
        let mut tokens = tokenize(&process);
        tokens.extend(tokenize(&evidence));
        Self {
            process,
            evidence,
            tokens,
        }
    }
}

impl<'p> EvidenceMatcher<'p> {
    pub fn new(pool: &'p EvidencePool) -> Self {
        Self { pool }
    }

    /// Resolve one row. Returns `None` only when the pool is empty.
    ///
    /// Matches from the first four tiers are recorded in `session`.
    pub fn find(
        &self,
        session: &mut MatchSession,
        process: &str,
        sighted_evidence: &str,
    ) -> Option<EvidenceMatch<'p>> {
        if self.pool.is_empty() {
            return None;
        }

        let keys = RowKeys::new(process, sighted_evidence);

        let found = self
            .find_unused(session, MatchTier::Exact, |name, _| {
                !keys.evidence.is_empty() && name == keys.evidence
            })
            .or_else(|| {
                self.find_unused(session, MatchTier::Exact, |name, _| {
                    is_exact(&keys.evidence, name)
                })
            })
            .or_else(|| {
                self.find_unused(session, MatchTier::KeywordOverlap, |_, tokens| {
                    !keys.tokens.is_disjoint(tokens)
                })
            })
            .or_else(|| {
                self.find_unused(session, MatchTier::LooseKeyword, |name, _| {
                    keys.tokens
                        .iter()
                        .any(|t| t.chars().count() > LOOSE_TOKEN_MIN_LEN && name.contains(t.as_str()))
                })
            })
            .or_else(|| self.find_unused(session, MatchTier::FirstUnused, |_, _| true));

        if let Some(found) = found {
            session.mark_used(&found.artifact.file_name);
            tracing::debug!(
                process = %process,
                artifact = %found.artifact.file_name,
                tier = ?found.tier,
                "Matched evidence"
            );
            return Some(found);
        }

        let found = self.best_overlap(&keys);
        tracing::debug!(
            process = %process,
            artifact = ?found.map(|m| m.artifact.file_name.as_str()),
            tier = ?found.map(|m| m.tier),
            "Evidence pool exhausted, reusing artifact"
        );
        found
    }

    /// First unused artifact accepted by `accept(lowercase_name, name_tokens)`.
    fn find_unused(
        &self,
        session: &MatchSession,
        tier: MatchTier,
        accept: impl Fn(&str, &HashSet<String>) -> bool,
    ) -> Option<EvidenceMatch<'p>> {
        self.pool
            .iter()
            .filter(|artifact| !session.is_used(&artifact.file_name))
            .find(|artifact| {
                let name = artifact.base_name().to_lowercase();
                let tokens = tokenize(&name);
                accept(&name, &tokens)
            })
            .map(|artifact| EvidenceMatch { artifact, tier })
    }

    /// Highest overlap score over the whole pool; ties go to the earliest.
    fn best_overlap(&self, keys: &RowKeys) -> Option<EvidenceMatch<'p>> {
        let mut best: Option<(&'p EvidenceArtifact, usize)> = None;
        for artifact in self.pool.iter() {
            let score = overlap_score(keys, artifact);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((artifact, score));
            }
        }

        match best {
            Some((artifact, _)) => Some(EvidenceMatch {
                artifact,
                tier: MatchTier::BestOverlap,
            }),
            None => self.pool.first().map(|artifact| EvidenceMatch {
                artifact,
                tier: MatchTier::FirstInPool,
            }),
        }
    }
}

fn is_exact(evidence: &str, name: &str) -> bool {
    !evidence.is_empty() && (name.contains(evidence) || evidence.contains(name))
}

fn overlap_score(keys: &RowKeys, artifact: &EvidenceArtifact) -> usize {
    let name = artifact.base_name().to_lowercase();
    let mut score = keys.tokens.intersection(&tokenize(&name)).count();
    if !keys.process.is_empty() && name.contains(keys.process.as_str()) {
        score += EXACT_SUBSTRING_BONUS;
    }
    if !keys.evidence.is_empty() && name.contains(keys.evidence.as_str()) {
        score += EXACT_SUBSTRING_BONUS;
    }
    score
}

/// Lower-case word tokens, treating `.`, `_` and `-` as spaces.
fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .replace(['.', '_', '-'], " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
