//! Evidence artifacts supplied by the extraction step.
//!
//! The pool is built once per report by an external collaborator (file
//! upload, screenshotting, vision extraction) and is read-only here. Pool
//! order is significant: matching ties and fallbacks resolve to the
//! earliest artifact.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classifier::extract_score;
use crate::types::{file_stem, Score};

/// One renderable image taken from an evidence file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceImage {
    /// Encoded image bytes; never serialized
    #[serde(skip)]
    pub data: Vec<u8>,

    /// Image format tag (e.g., "png")
    #[serde(default = "default_format")]
    pub format: String,

    /// Human-readable source label (e.g., "audit.pdf page 2")
    #[serde(default)]
    pub label: String,

    /// Score read from this image, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
}

fn default_format() -> String {
    "png".to_string()
}

impl EvidenceImage {
    pub fn new(data: Vec<u8>, format: impl Into<String>) -> Self {
        Self {
            data,
            format: format.into(),
            label: String::new(),
            score: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_score(mut self, score: impl Into<Score>) -> Self {
        self.score = Some(score.into());
        self
    }
}

/// All evidence extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceArtifact {
    /// Source file name; may include a directory
    pub file_name: String,

    /// Images in extraction order
    #[serde(default)]
    pub images: Vec<EvidenceImage>,

    /// Explicit score for the whole file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,

    /// Text a vision/OCR step produced for this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

impl EvidenceArtifact {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: EvidenceImage) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_score(mut self, score: impl Into<Score>) -> Self {
        self.score = Some(score.into());
        self
    }

    pub fn with_extracted_text(mut self, text: impl Into<String>) -> Self {
        self.extracted_text = Some(text.into());
        self
    }

    /// File name without any directory part.
    pub fn base_name(&self) -> &str {
        Path::new(&self.file_name)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }

    /// Base name without extension.
    pub fn stem(&self) -> &str {
        file_stem(&self.file_name)
    }

    /// The image rendered into the evidence cell.
    pub fn primary_image(&self) -> Option<&EvidenceImage> {
        self.images.first()
    }

    /// Effective score: the file-level score, else the first image score,
    /// else one recovered from the extracted text.
    pub fn score(&self) -> Option<Score> {
        self.score
            .clone()
            .or_else(|| self.images.iter().find_map(|img| img.score.clone()))
            .or_else(|| self.extracted_text.as_deref().and_then(extract_score))
    }

    pub fn is_spreadsheet(&self, extensions: &[String]) -> bool {
        is_spreadsheet_name(&self.file_name, extensions)
    }
}

/// Whether a file name carries one of the given spreadsheet extensions.
///
/// Extensions are compared without a leading dot and case-insensitively.
pub fn is_spreadsheet_name(name: &str, extensions: &[String]) -> bool {
    let Some(ext) = Path::new(name.trim()).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Ordered collection of evidence artifacts, keyed by file name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidencePool {
    artifacts: Vec<EvidenceArtifact>,
}

impl EvidencePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact. An artifact with an already-present file name is
    /// merged into the existing entry (images appended, first score kept).
    pub fn insert(&mut self, artifact: EvidenceArtifact) {
        match self
            .artifacts
            .iter_mut()
            .find(|a| a.file_name == artifact.file_name)
        {
            Some(existing) => {
                existing.images.extend(artifact.images);
                if existing.score.is_none() {
                    existing.score = artifact.score;
                }
                if existing.extracted_text.is_none() {
                    existing.extracted_text = artifact.extracted_text;
                }
            }
            None => self.artifacts.push(artifact),
        }
    }

    pub fn with(mut self, artifact: EvidenceArtifact) -> Self {
        self.insert(artifact);
        self
    }

    pub fn get(&self, file_name: &str) -> Option<&EvidenceArtifact> {
        self.artifacts.iter().find(|a| a.file_name == file_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvidenceArtifact> {
        self.artifacts.iter()
    }

    pub fn first(&self) -> Option<&EvidenceArtifact> {
        self.artifacts.first()
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.iter().map(|a| a.file_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl FromIterator<EvidenceArtifact> for EvidencePool {
    fn from_iter<I: IntoIterator<Item = EvidenceArtifact>>(iter: I) -> Self {
        let mut pool = EvidencePool::new();
        for artifact in iter {
            pool.insert(artifact);
        }
        pool
    }
}
