use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub content: String,
    #[serde(rename = "type")]
    pub scam_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl CorpusEntry {
    pub fn new(content: impl Into<String>, scam_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            scam_type: scam_type.into(),
            platform: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryEntry {
    pub content: String,
    #[serde(rename = "type")]
    pub scam_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub rank: usize,
    pub content: String,
    #[serde(rename = "type")]
    pub scam_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub score: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "green",
            Self::Medium => "yellow",
            Self::High => "red",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SentenceAssessment {
    pub sentence: String,
    pub score: f64,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    #[serde(rename = "type")]
    pub scam_type: String,
    pub best_score: f64,
    pub hits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightResult {
    pub hits: Vec<String>,
    pub annotated: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub query: String,
    pub truncated: bool,
    pub likely_scam: bool,
    pub scam_signal_threshold: f64,
    pub top_categories: Vec<CategoryScore>,
    pub matches: Vec<SearchResult>,
    pub keywords: HighlightResult,
    pub sentences: Vec<SentenceAssessment>,
    pub story_examples: Vec<String>,
    pub resource_url: String,
}

/// Sidecar describing a vector blob: which corpus and model produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingCacheManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub corpus_file: String,
    pub row_count: usize,
    pub content_fingerprint: String,
    pub model_id: String,
    pub dimensions: usize,
    pub blob_file: String,
    pub blob_sha256: String,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub corpus_file: String,
    pub model_id: String,
    pub model_name: String,
    pub embedding_dim: usize,
    pub normalization: String,
    pub backend: String,
    pub refresh_mode: String,
    pub row_count: usize,
    pub content_fingerprint: String,
    pub cache_outcome: String,
    pub batch_size: usize,
    pub duration_ms: u128,
    pub status: String,
    pub warnings: Vec<String>,
}
