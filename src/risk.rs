use regex::Regex;

use crate::error::EngineError;
use crate::model::RiskLevel;

pub const DEFAULT_RISK_THRESHOLD: f64 = 0.85;
pub const MEDIUM_BAND_RATIO: f64 = 0.7;

/// Splits after every sentence-final marker; the marker stays attached to
/// the fragment it closes, so `！！` yields two fragments.
const SENTENCE_PATTERN: &str = r"[^。！？!?]*[。！？!?]|[^。！？!?]+$";

pub fn classify(score: f64, threshold: f64) -> RiskLevel {
    if score >= threshold {
        RiskLevel::High
    } else if score >= threshold * MEDIUM_BAND_RATIO {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[derive(Debug, Clone)]
pub struct RiskClassifier {
    threshold: f64,
    sentence_pattern: Regex,
}

impl RiskClassifier {
    pub fn new(threshold: f64) -> Result<Self, EngineError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(EngineError::Config(format!(
                "risk threshold must be a positive finite number, got {threshold}"
            )));
        }

        let sentence_pattern = Regex::new(SENTENCE_PATTERN)
            .map_err(|err| EngineError::Config(format!("invalid sentence pattern: {err}")))?;

        Ok(Self {
            threshold,
            sentence_pattern,
        })
    }

    pub fn split_sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.sentence_pattern
            .find_iter(text)
            .map(|found| found.as_str().trim())
            .filter(|sentence| !sentence.is_empty())
            .collect()
    }

    pub fn level(&self, score: f64) -> RiskLevel {
        classify(score, self.threshold)
    }
}
