//! Footer aggregator: promotes row findings into the summary fields.
//!
//! Policy for each summary field (nonconformances, improvements):
//! 1. No findings of that kind → field untouched
//! 2. Field absent, empty, or holding only the placeholder → replaced by the findings
//! 3. Otherwise → findings appended after a newline
//!
//! Findings are one line each, already formatted as `<label>: <comment>`.

use chrono::NaiveDate;

use crate::config::{AssemblyConfig, FooterFields};
use crate::types::{Category, FieldMap};

/// Title appended to the auditor name in the sign-off.
const SIGN_OFF_TITLE: &str = "INTERNAL AUDITOR";

/// Final comments at or below this many characters get a sign-off.
const SIGN_OFF_MAX_EXISTING: usize = 5;

/// Row-level findings collected for the footer, in row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    pub nc: Vec<String>,
    pub ofi: Vec<String>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding under its category; OK and NA are ignored.
    pub fn push(&mut self, category: Category, entry: impl Into<String>) {
        match category {
            Category::Nc => self.nc.push(entry.into()),
            Category::Ofi => self.ofi.push(entry.into()),
            Category::Ok | Category::Na => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nc.is_empty() && self.ofi.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nc.len() + self.ofi.len()
    }
}

/// Format one footer line.
pub fn finding_entry(label: &str, comment: &str) -> String {
    format!("{}: {}", label.trim(), comment.trim())
}

/// Applies findings and sign-off to a footer.
#[derive(Debug, Clone)]
pub struct FooterAggregator {
    fields: FooterFields,
    final_comments_key: String,
    auditor_name: Option<String>,
}

impl FooterAggregator {
    pub fn new(config: &AssemblyConfig) -> Self {
        Self {
            fields: config.footer.clone(),
            final_comments_key: config.markers.final_comments.clone(),
            auditor_name: config
                .auditor_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    /// Merge findings into the two summary fields.
    pub fn aggregate(&self, footer: &mut FieldMap, findings: &Findings) {
        self.merge_field(footer, &self.fields.nonconformances, &findings.nc);
        self.merge_field(footer, &self.fields.improvements, &findings.ofi);
    }

    /// Remove legend entries that leaked into the footer.
    pub fn strip_legend_codes(&self, footer: &mut FieldMap) {
        footer.retain(|key, _| {
            let leaked = Category::from_code(key).is_some();
            if leaked {
                tracing::debug!(key = key, "Dropping legend code from footer");
            }
            !leaked
        });
    }

    /// Complete short or missing final comments with the auditor sign-off.
    pub fn sign_off(&self, footer: &mut FieldMap, date: NaiveDate) {
        let existing = footer.get(&self.final_comments_key).unwrap_or("").trim();
        if existing.chars().count() > SIGN_OFF_MAX_EXISTING {
            return;
        }

        let signature = match &self.auditor_name {
            Some(name) => format!("{} {}", name, SIGN_OFF_TITLE),
            None => SIGN_OFF_TITLE.to_string(),
        };
        let block = format!("{}\n{}", signature, date.format("%d/%m/%Y"));
        let text = if existing.is_empty() {
            block
        } else {
            format!("{}\n\n{}", existing, block)
        };

        tracing::debug!(field = %self.final_comments_key, "Added auditor sign-off");
        footer.insert(self.final_comments_key.as_str(), text);
    }

    fn merge_field(&self, footer: &mut FieldMap, field: &str, entries: &[String]) {
        if entries.is_empty() {
            return;
        }
        let joined = entries.join("\n");

        let value = match footer.get(field) {
            Some(current) if !self.is_placeholder(current) => {
                format!("{}\n{}", current.trim_end(), joined)
            }
            _ => joined,
        };

        tracing::info!(field = field, count = entries.len(), "Updated footer field");
        footer.insert(field, value);
    }

    fn is_placeholder(&self, value: &str) -> bool {
        let value = value.trim();
        value.is_empty() || value.eq_ignore_ascii_case(self.fields.placeholder.trim())
    }
}
