//! Score-derived compliance classification.
//!
//! Scores arrive in whatever shape the extraction step found: a 0–10
//! rating, a 0–25 survey total, a percentage, or an `"X/Y"` fraction.
//! Each is normalized to a percentage and bucketed:
//!
//! | Percentage | Category |
//! |------------|----------|
//! | >= 80 | OK |
//! | 70 – <80 | OFI, with advisory |
//! | < 70 | NC, with advisory |
//!
//! Anything that cannot be read as a score classifies as OK with no
//! comment. Bare numbers use a sharp scale cut-off: `<= 10` is a ten-point
//! rating, `<= 25` a 25-point total, `<= 100` a percentage. An 11 is
//! therefore read as 44% on the 25-point scale.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::config::Thresholds;
use crate::types::{Category, Score};

lazy_static! {
    /// `**Score:** 18/25` as written by the vision extraction prompt
    static ref BOLD_SCORE_PATTERN: Regex = Regex::new(
        r"\*\*Score:\*\*\s*(\d+(?:\.\d+)?(?:\s*/\s*\d+(?:\.\d+)?)?)"
    ).unwrap();

    /// Looser `score: 18` / `Score - 7.5/10` phrasing
    static ref LOOSE_SCORE_PATTERN: Regex = Regex::new(
        r"(?i)\bscore\b[^0-9\n]{0,4}(\d+(?:\.\d+)?(?:\s*/\s*\d+(?:\.\d+)?)?)"
    ).unwrap();
}

/// Why a score could not be normalized.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("Score is empty")]
    Empty,

    #[error("Score is not a number: {0}")]
    NotANumber(String),

    #[error("Score has a zero denominator: {0}")]
    ZeroDenominator(String),

    #[error("Score is negative: {0}")]
    Negative(String),

    #[error("Score exceeds every known scale: {0}")]
    OutOfRange(String),
}

/// The scale a score was read on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// 0–10 rating
    TenPoint,
    /// 0–25 survey total
    TwentyFivePoint,
    /// Already a percentage
    Percent,
    /// Explicit `X/Y`
    Fraction,
}

/// A score converted to a percentage, with the text used to quote it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedScore {
    pub percentage: f64,
    pub scale: Scale,
    /// The score in the units it arrived in (e.g., "18/25")
    pub display: String,
}

/// Result of classifying one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    /// Advisory text; empty for OK
    pub comment: String,
}

impl Classification {
    fn conforming() -> Self {
        Self {
            category: Category::Ok,
            comment: String::new(),
        }
    }
}

/// Maps evidence scores to compliance categories.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryClassifier {
    thresholds: Thresholds,
}

impl CategoryClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Classify an artifact's score.
    ///
    /// A missing score (including spreadsheet evidence without one), a
    /// numeric zero, and an unreadable score all yield `(OK, "")`.
    pub fn classify(&self, score: Option<&Score>, is_spreadsheet: bool) -> Classification {
        let Some(score) = score.filter(|s| !s.is_zero()) else {
            if is_spreadsheet {
                tracing::debug!("Spreadsheet evidence without score, defaulting to OK");
            }
            return Classification::conforming();
        };

        match normalize(score) {
            Ok(normalized) => self.bucket(&normalized),
            Err(e) => {
                tracing::debug!(score = %score, error = %e, "Unreadable score, defaulting to OK");
                Classification::conforming()
            }
        }
    }

    fn bucket(&self, score: &NormalizedScore) -> Classification {
        if score.percentage >= self.thresholds.ok {
            Classification::conforming()
        } else if score.percentage >= self.thresholds.ofi {
            Classification {
                category: Category::Ofi,
                comment: format!(
                    "Score of {} indicates room for improvement in customer satisfaction. \
                     Consider implementing additional feedback mechanisms.",
                    score.display
                ),
            }
        } else {
            Classification {
                category: Category::Nc,
                comment: format!(
                    "Low score of {} represents a significant gap in customer satisfaction \
                     requiring immediate corrective action.",
                    score.display
                ),
            }
        }
    }
}

/// Normalize a score to a percentage.
pub fn normalize(score: &Score) -> Result<NormalizedScore, ScoreError> {
    match score {
        Score::Number(value) => normalize_number(*value, &format_number(*value)),
        Score::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(ScoreError::Empty);
            }
            match text.split_once('/') {
                Some((numerator, denominator)) => normalize_fraction(text, numerator, denominator),
                None => {
                    let value = parse_number(text, text)?;
                    normalize_number(value, text)
                }
            }
        }
    }
}

fn normalize_number(value: f64, raw: &str) -> Result<NormalizedScore, ScoreError> {
    if !value.is_finite() {
        return Err(ScoreError::NotANumber(raw.to_string()));
    }
    if value < 0.0 {
        return Err(ScoreError::Negative(raw.to_string()));
    }

    let shown = format_number(value);
    let (percentage, scale, display) = if value <= 10.0 {
        (value * 10.0, Scale::TenPoint, format!("{}/10", shown))
    } else if value <= 25.0 {
        (value * 100.0 / 25.0, Scale::TwentyFivePoint, format!("{}/25", shown))
    } else if value <= 100.0 {
        (value, Scale::Percent, raw.to_string())
    } else {
        return Err(ScoreError::OutOfRange(raw.to_string()));
    };

    Ok(NormalizedScore {
        percentage,
        scale,
        display,
    })
}

fn normalize_fraction(
    raw: &str,
    numerator: &str,
    denominator: &str,
) -> Result<NormalizedScore, ScoreError> {
    let numerator = parse_number(numerator, raw)?;
    let denominator = parse_number(denominator, raw)?;
    if denominator == 0.0 {
        return Err(ScoreError::ZeroDenominator(raw.to_string()));
    }
    if numerator < 0.0 || denominator < 0.0 {
        return Err(ScoreError::Negative(raw.to_string()));
    }

    Ok(NormalizedScore {
        // Multiply first so exact boundaries (e.g. 17.5/25) stay exact
        percentage: numerator * 100.0 / denominator,
        scale: Scale::Fraction,
        display: raw.split_whitespace().collect(),
    })
}

fn parse_number(part: &str, raw: &str) -> Result<f64, ScoreError> {
    let value: f64 = part
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse()
        .map_err(|_| ScoreError::NotANumber(raw.to_string()))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScoreError::NotANumber(raw.to_string()))
    }
}

/// Integral values print without a decimal point.
fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Recover a score from text produced by the extraction step.
///
/// Prefers the bold `**Score:**` field; falls back to any `score` phrase
/// followed by a number.
pub fn extract_score(text: &str) -> Option<Score> {
    BOLD_SCORE_PATTERN
        .captures(text)
        .or_else(|| LOOSE_SCORE_PATTERN.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| Score::Text(m.as_str().split_whitespace().collect()))
}
