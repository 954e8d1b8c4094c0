//! Core types shared across the assembly pipeline.
//!
//! These mirror the four partitions of a generated audit report (header,
//! legend, process/evidence body, footer) plus the compliance categories
//! a process row can carry.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Compliance category of a process row.
///
/// Variants are declared in legend order. Precedence when several are
/// present at once is a separate ordering, see [`Category::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Conforming
    #[serde(rename = "OK")]
    Ok,

    /// Opportunity for improvement
    #[serde(rename = "OFI")]
    Ofi,

    /// Nonconformity
    #[serde(rename = "NC")]
    Nc,

    /// Not applicable
    #[serde(rename = "NA")]
    Na,
}

impl Category {
    /// All categories in legend order.
    pub const ALL: [Category; 4] = [Category::Ok, Category::Ofi, Category::Nc, Category::Na];

    /// The fixed code used in the legend and table header.
    pub fn code(&self) -> &'static str {
        match self {
            Category::Ok => "OK",
            Category::Ofi => "OFI",
            Category::Nc => "NC",
            Category::Na => "NA",
        }
    }

    /// Parse a legend/table code. Surrounding whitespace and markdown
    /// emphasis are ignored, case is not significant.
    pub fn from_code(code: &str) -> Option<Self> {
        let cleaned = code.trim().trim_matches('*').trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(cleaned))
    }

    /// Precedence rank: NC > OFI > OK > NA.
    pub fn rank(&self) -> u8 {
        match self {
            Category::Nc => 3,
            Category::Ofi => 2,
            Category::Ok => 1,
            Category::Na => 0,
        }
    }

    /// Resolve a set of simultaneously present flags to the dominant one.
    pub fn resolve(flags: impl IntoIterator<Item = Category>) -> Option<Category> {
        flags.into_iter().max_by_key(Category::rank)
    }

    /// The dominant of two optional categories.
    pub fn dominant(a: Option<Category>, b: Option<Category>) -> Option<Category> {
        Self::resolve(a.into_iter().chain(b))
    }

    /// Whether this category is reported as a finding in the footer.
    pub fn is_finding(&self) -> bool {
        matches!(self, Category::Nc | Category::Ofi)
    }

    /// Human-readable name.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Ok => "Conforming",
            Category::Ofi => "Opportunity for improvement",
            Category::Nc => "Nonconformity",
            Category::Na => "Not applicable",
        }
    }

    /// Hex fill colour of the checkmark cell in the rendered evidence table.
    pub fn fill_color(&self) -> &'static str {
        match self {
            Category::Ok => "92D050",
            Category::Ofi => "8DB3E2",
            Category::Nc => "FF0000",
            Category::Na => "FFFFFF",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One line item of the process/evidence table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRow {
    /// The audited process, with any "Process:" label removed
    pub process: String,

    /// File-name-like reference to the evidence, with any "Evidence:" label removed
    pub sighted_evidence: String,

    /// At most one classification; simultaneous flags are resolved on parse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Category>,

    /// Free text from the comments column
    #[serde(default)]
    pub additional_comments: String,

    /// Process names of every row merged into this one (empty unless merged)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consolidated_processes: Vec<String>,
}

impl ProcessRow {
    pub fn new(process: impl Into<String>, sighted_evidence: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            sighted_evidence: sighted_evidence.into(),
            ..Default::default()
        }
    }

    pub fn with_classification(mut self, category: Category) -> Self {
        self.classification = Some(category);
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.additional_comments = comments.into();
        self
    }

    /// Whether this row stands for several merged source rows.
    pub fn is_consolidated(&self) -> bool {
        !self.consolidated_processes.is_empty()
    }

    /// Evidence file name without directory or extension.
    pub fn evidence_stem(&self) -> &str {
        file_stem(&self.sighted_evidence)
    }

    /// Label used when this row's finding is promoted to the footer.
    pub fn finding_label(&self) -> &str {
        if self.is_consolidated() {
            self.evidence_stem()
        } else {
            &self.process
        }
    }
}

/// File name without directory or extension; the input itself when it has neither.
pub(crate) fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Insertion-ordered string mapping.
///
/// Header and footer fields keep the order the generator emitted them in;
/// the first header entry is the report title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.entries.retain(|(k, v)| keep(k, v));
    }

    /// Apply `f` to every value in place.
    pub fn map_values(&mut self, mut f: impl FnMut(usize, &str, &str) -> String) {
        for (index, (key, value)) in self.entries.iter_mut().enumerate() {
            *value = f(index, key, value);
        }
    }

    pub fn first(&self) -> Option<(&str, &str)> {
        self.entries.first().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of string fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut map = FieldMap::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    map.insert(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

/// The parsed report: header, legend, process rows and footer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionModel {
    /// Header fields; the first entry is the report title
    #[serde(default)]
    pub header: FieldMap,

    /// Legend text per category code
    #[serde(default)]
    pub legend: BTreeMap<Category, String>,

    /// Process/evidence rows in table order
    #[serde(default)]
    pub body: Vec<ProcessRow>,

    /// Summary fields, updated by footer aggregation
    #[serde(default)]
    pub footer: FieldMap,
}

impl SectionModel {
    /// True when no partition holds anything.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.legend.is_empty() && self.body.is_empty() && self.footer.is_empty()
    }

    /// The report title (first header value).
    pub fn title(&self) -> Option<&str> {
        self.header.first().map(|(_, v)| v)
    }
}

/// A score attached to an evidence artifact.
///
/// Either a bare number or the text an extraction step produced, typically
/// `"X/Y"`. Text holding a plain number is treated as that number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Number(f64),
    Text(String),
}

impl Score {
    /// A numeric zero, which extraction emits when nothing was scored.
    pub fn is_zero(&self) -> bool {
        matches!(self, Score::Number(n) if *n == 0.0)
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Score::Number(value)
    }
}

impl From<u32> for Score {
    fn from(value: u32) -> Self {
        Score::Number(f64::from(value))
    }
}

impl From<&str> for Score {
    fn from(value: &str) -> Self {
        Score::Text(value.to_string())
    }
}

impl From<String> for Score {
    fn from(value: String) -> Self {
        Score::Text(value)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Number(n) => write!(f, "{}", n),
            Score::Text(t) => f.write_str(t.trim()),
        }
    }
}
