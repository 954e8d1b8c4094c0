//! Evidence manifest loading.
//!
//! The manifest is a JSON array describing what an extraction step produced
//! for each uploaded file. Image paths are relative to the manifest.

use anyhow::{Context, Result};
use auditrep_core::{EvidenceArtifact, EvidenceImage, EvidencePool, Score};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    file_name: String,
    #[serde(default)]
    extracted_text: Option<String>,
    #[serde(default)]
    score: Option<Score>,
    #[serde(default)]
    images: Vec<ManifestImage>,
}

#[derive(Debug, Deserialize)]
struct ManifestImage {
    path: PathBuf,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    score: Option<Score>,
}

/// Load an evidence pool from a manifest file.
pub fn load_pool(path: &Path) -> Result<EvidencePool> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read evidence manifest {}", path.display()))?;
    let entries: Vec<ManifestEntry> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid evidence manifest {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut pool = EvidencePool::new();
    for entry in entries {
        pool.insert(load_artifact(base, entry)?);
    }

    tracing::info!(artifacts = pool.len(), manifest = %path.display(), "Loaded evidence pool");
    Ok(pool)
}

fn load_artifact(base: &Path, entry: ManifestEntry) -> Result<EvidenceArtifact> {
    let mut artifact = EvidenceArtifact::new(entry.file_name);
    artifact.score = entry.score;
    artifact.extracted_text = entry.extracted_text;

    for image in entry.images {
        let path = base.join(&image.path);
        let data = fs::read(&path)
            .with_context(|| format!("Failed to read evidence image {}", path.display()))?;
        let format = image.format.unwrap_or_else(|| {
            image
                .path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
                .unwrap_or_else(|| "png".to_string())
        });
        let label = image
            .label
            .unwrap_or_else(|| image.path.display().to_string());

        let mut evidence_image = EvidenceImage::new(data, format).with_label(label);
        evidence_image.score = image.score;
        artifact = artifact.with_image(evidence_image);
    }

    Ok(artifact)
}
