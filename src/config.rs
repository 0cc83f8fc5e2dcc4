use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::index::DEFAULT_BATCH_SIZE;
use crate::keywords::{DEFAULT_KEYWORDS, normalize_keywords};
use crate::report::DEFAULT_TOP_CATEGORIES;
use crate::risk::DEFAULT_RISK_THRESHOLD;
use crate::semantic::DEFAULT_MODEL_ID;

pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_SCAM_SIGNAL_THRESHOLD: f64 = 0.55;
pub const DEFAULT_MAX_INPUT_CHARS: usize = 1000;
pub const DEFAULT_SEARCH_TOP_K: usize = 10;
pub const DEFAULT_STORY_EXAMPLES: usize = 3;
pub const DEFAULT_RESOURCE_URL: &str = "https://165.npa.gov.tw";

/// Engine options. Every field may be omitted from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub model_id: String,
    pub risk_threshold: f64,
    pub keywords: Vec<String>,
    pub cache_dir: PathBuf,
    pub batch_size: usize,
    pub scam_signal_threshold: f64,
    pub max_input_chars: usize,
    pub search_top_k: usize,
    pub report_top_categories: usize,
    pub story_examples: usize,
    pub resource_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            keywords: DEFAULT_KEYWORDS.iter().map(|kw| kw.to_string()).collect(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            scam_signal_threshold: DEFAULT_SCAM_SIGNAL_THRESHOLD,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            search_top_k: DEFAULT_SEARCH_TOP_K,
            report_top_categories: DEFAULT_TOP_CATEGORIES,
            story_examples: DEFAULT_STORY_EXAMPLES,
            resource_url: DEFAULT_RESOURCE_URL.to_string(),
        }
    }
}

/// Command-line values layered over the file config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model_id: Option<String>,
    pub risk_threshold: Option<f64>,
    pub keywords: Vec<String>,
    pub cache_dir: Option<PathBuf>,
    pub batch_size: Option<usize>,
}

impl EngineConfig {
    pub fn from_json(raw: &[u8]) -> Result<Self, EngineError> {
        serde_json::from_slice(raw)
            .map_err(|err| EngineError::Config(format!("failed to parse config: {err}")))
    }

    /// Defaults, then `path` if given, then `overrides`.
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, EngineError> {
        let base = match path {
            Some(path) => {
                let raw = fs::read(path).map_err(|err| {
                    EngineError::Config(format!("failed to read {}: {err}", path.display()))
                })?;
                Self::from_json(&raw)?
            }
            None => Self::default(),
        };

        base.with_overrides(overrides).validated()
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(model_id) = overrides.model_id {
            self.model_id = model_id;
        }
        if let Some(risk_threshold) = overrides.risk_threshold {
            self.risk_threshold = risk_threshold;
        }
        if !overrides.keywords.is_empty() {
            self.keywords = overrides.keywords;
        }
        if let Some(cache_dir) = overrides.cache_dir {
            self.cache_dir = cache_dir;
        }
        if let Some(batch_size) = overrides.batch_size {
            self.batch_size = batch_size;
        }
        self
    }

    pub fn validated(mut self) -> Result<Self, EngineError> {
        if !self.risk_threshold.is_finite() || self.risk_threshold <= 0.0 {
            return Err(EngineError::Config(format!(
                "risk_threshold must be a positive finite number, got {}",
                self.risk_threshold
            )));
        }
        if !self.scam_signal_threshold.is_finite() {
            return Err(EngineError::Config(
                "scam_signal_threshold must be finite".to_string(),
            ));
        }

        self.batch_size = self.batch_size.max(1);
        self.keywords = normalize_keywords(&self.keywords);
        Ok(self)
    }

    pub fn model_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("models")
    }
}
