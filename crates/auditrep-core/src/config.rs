//! Assembly configuration from YAML/JSON.
//!
//! Everything the pipeline treats as a constant of the report template
//! (section markers, footer field names, score thresholds) lives here and
//! is passed to [`crate::ReportAssembler`] at construction time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Literal cues the tokenizer looks for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SectionMarkers {
    /// Heading that opens the multi-line final comments section
    pub final_comments: String,

    /// Token that marks the signature block closing the final comments
    pub signature_token: String,

    /// Process values that mean "no row here"
    pub empty_sentinels: Vec<String>,
}

impl Default for SectionMarkers {
    fn default() -> Self {
        Self {
            final_comments: "AUDIT REPORT FINAL COMMENTS".to_string(),
            signature_token: "Internal Auditor".to_string(),
            empty_sentinels: vec!["[EMPTY]".to_string(), "EMPTY".to_string()],
        }
    }
}

/// Footer field names that receive promoted findings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FooterFields {
    /// Field collecting nonconformity comments
    pub nonconformances: String,

    /// Field collecting improvement-opportunity comments
    pub improvements: String,

    /// Placeholder meaning "nothing recorded yet"
    pub placeholder: String,
}

impl Default for FooterFields {
    fn default() -> Self {
        Self {
            nonconformances: "NONCONFORMANCES".to_string(),
            improvements: "OPPORTUNITIES FOR IMPROVEMENTS".to_string(),
            placeholder: "Nil".to_string(),
        }
    }
}

/// Percentage cut-offs for score classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// At or above: conforming
    pub ok: f64,

    /// At or above (and below `ok`): opportunity for improvement
    pub ofi: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { ok: 80.0, ofi: 70.0 }
    }
}

/// Configuration for one report assembler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssemblyConfig {
    pub markers: SectionMarkers,

    /// Extensions identifying spreadsheet-type evidence
    pub spreadsheet_extensions: Vec<String>,

    pub thresholds: Thresholds,

    pub footer: FooterFields,

    /// Name written into the final comments sign-off
    pub auditor_name: Option<String>,

    /// Date written into the sign-off; today (UTC) when unset
    pub report_date: Option<NaiveDate>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            markers: SectionMarkers::default(),
            spreadsheet_extensions: vec!["xlsx".to_string(), "xls".to_string()],
            thresholds: Thresholds::default(),
            footer: FooterFields::default(),
            auditor_name: None,
            report_date: None,
        }
    }
}

impl AssemblyConfig {
    /// Parse a config from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: AssemblyConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AssemblyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load from a file, choosing the format by extension (`.json` or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_file(path)
        } else {
            Self::from_yaml_file(path)
        }
    }

    pub fn with_auditor(mut self, name: impl Into<String>) -> Self {
        self.auditor_name = Some(name.into());
        self
    }

    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date = Some(date);
        self
    }

    /// Validate the config structure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markers.final_comments.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "markers.final_comments must not be empty".to_string(),
            ));
        }

        if self.markers.signature_token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "markers.signature_token must not be empty".to_string(),
            ));
        }

        if self
            .spreadsheet_extensions
            .iter()
            .all(|e| e.trim_start_matches('.').trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "spreadsheet_extensions must name at least one extension".to_string(),
            ));
        }

        let Thresholds { ok, ofi } = self.thresholds;
        if !(0.0..=100.0).contains(&ofi) || !(0.0..=100.0).contains(&ok) || ofi > ok {
            return Err(ConfigError::ValidationError(format!(
                "thresholds must satisfy 0 <= ofi <= ok <= 100 (got ofi={}, ok={})",
                ofi, ok
            )));
        }

        let footer = &self.footer;
        if footer.nonconformances.trim().is_empty() || footer.improvements.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "footer field names must not be empty".to_string(),
            ));
        }

        if footer.nonconformances == footer.improvements {
            return Err(ConfigError::ValidationError(format!(
                "footer fields must be distinct (both are '{}')",
                footer.nonconformances
            )));
        }

        Ok(())
    }
}
