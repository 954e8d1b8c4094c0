//! Section tokenizer for generated report text.
//!
//! The generator follows a fixed template but not a strict grammar, so the
//! text is scanned line by line with a section cursor driven by structural
//! cues: legend codes, the seven-column process table header, two-cell
//! key/value lines, and the final comments heading.
//!
//! ## Cursor transitions
//!
//! | From | Cue | To |
//! |------|-----|----|
//! | header | `CODE \| text` with a legend code | legend |
//! | any | 7 cells, first is `PROCESS` | body |
//! | legend, body | `key \| value` | footer |
//! | any | final comments heading | capture (until signature token) |
//!
//! Tokenizing never fails: missing sections are left empty.

use crate::config::AssemblyConfig;
use crate::types::{Category, SectionModel};

use super::format::{
    format_multiline, has_line_breaks, heading_text, is_heading, is_separator_row, split_cells,
};
use super::normalizer::{is_malformed_process, ColumnTemplate};

/// Where the cursor currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Legend,
    Body,
    Footer,
}

/// Splits raw generated text into a [`SectionModel`].
#[derive(Debug, Clone)]
pub struct SectionTokenizer<'c> {
    config: &'c AssemblyConfig,
}

/// Mutable scan state for one tokenizer run.
struct ScanState {
    section: Section,
    template: Option<ColumnTemplate>,
    capturing: bool,
    final_comments: Vec<String>,
    model: SectionModel,
}

impl<'c> SectionTokenizer<'c> {
    pub fn new(config: &'c AssemblyConfig) -> Self {
        Self { config }
    }

    /// Tokenize raw text into sections.
    pub fn tokenize(&self, raw: &str) -> SectionModel {
        let mut state = ScanState {
            section: Section::Header,
            template: None,
            capturing: false,
            final_comments: Vec::new(),
            model: SectionModel::default(),
        };

        for line in raw.trim().trim_matches('`').lines() {
            self.scan_line(&mut state, line.trim());
        }

        self.finish(state)
    }

    fn scan_line(&self, state: &mut ScanState, line: &str) {
        if line.is_empty() || line.starts_with("```") {
            return;
        }

        if is_heading(line) {
            if self.is_final_comments_heading(line) {
                tracing::debug!(from = ?state.section, "Entering final comments capture");
                state.capturing = true;
                state.section = Section::Footer;
            }
            return;
        }

        if state.capturing {
            if line.contains(self.config.markers.signature_token.as_str()) {
                self.commit_final_comments(state);
                state.capturing = false;
            } else {
                state.final_comments.push(line.to_string());
            }
            return;
        }

        if is_separator_row(line) {
            return;
        }

        let cells = split_cells(line);

        if cells.len() == 2 {
            if let Some(category) = self.legend_code(state.section, cells[0]) {
                if state.section != Section::Legend {
                    tracing::debug!(from = ?state.section, "Entering legend");
                }
                state.model.legend.insert(category, cells[1].to_string());
                state.section = Section::Legend;
                return;
            }
        }

        if let Some(template) = ColumnTemplate::from_header_cells(&cells) {
            tracing::debug!(from = ?state.section, "Entering process table");
            state.template = Some(template);
            state.section = Section::Body;
            return;
        }

        if let Some(template) = &state.template {
            if let Some(row) = template.parse_row(&cells) {
                state.model.body.push(row);
                return;
            }
        }

        if cells.len() == 2 {
            let (key, value) = (cells[0], cells[1]);
            match state.section {
                Section::Header => {
                    state.model.header.insert(key, value);
                }
                Section::Legend | Section::Body => {
                    tracing::debug!(from = ?state.section, key = key, "Entering footer");
                    state.section = Section::Footer;
                    state.model.footer.insert(key, value);
                }
                Section::Footer => {
                    state.model.footer.insert(key, value);
                }
            }
        }
    }

    /// Legend lines are recognized while still in the header or legend.
    fn legend_code(&self, section: Section, cell: &str) -> Option<Category> {
        match section {
            Section::Header | Section::Legend => Category::from_code(cell),
            Section::Body | Section::Footer => None,
        }
    }

    fn is_final_comments_heading(&self, line: &str) -> bool {
        heading_text(line).eq_ignore_ascii_case(self.config.markers.final_comments.trim())
    }

    fn commit_final_comments(&self, state: &mut ScanState) {
        if state.final_comments.is_empty() {
            return;
        }
        let text = std::mem::take(&mut state.final_comments).join("\n");
        state
            .model
            .footer
            .insert(self.config.markers.final_comments.as_str(), text);
    }

    fn finish(&self, mut state: ScanState) -> SectionModel {
        // Capture that never reached a signature still keeps what it collected
        self.commit_final_comments(&mut state);

        let mut model = state.model;
        let sentinels = &self.config.markers.empty_sentinels;
        model
            .body
            .retain(|row| !is_malformed_process(&row.process, sentinels));

        model.header.map_values(|index, _, value| {
            if index == 0 {
                value.to_string()
            } else {
                format_multiline(value)
            }
        });

        model.footer.map_values(|_, _, value| {
            if has_line_breaks(value) {
                format_multiline(value)
            } else {
                value.to_string()
            }
        });

        if !model.footer.contains_key(&self.config.markers.final_comments) {
            tracing::warn!(
                section = %self.config.markers.final_comments,
                "Final comments section is missing"
            );
        }

        model
    }
}
