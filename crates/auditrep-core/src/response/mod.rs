//! Parsing of generated report text.
//!
//! The generator emits a loose markdown dialect: pipe-delimited key/value
//! lines, a seven-column process table and a free-text final comments
//! section. This module turns that text into a [`crate::SectionModel`].

pub mod format;
mod normalizer;
mod tokenizer;

pub use normalizer::{is_flag_set, is_malformed_process, ColumnKind, ColumnTemplate};
pub use tokenizer::SectionTokenizer;
