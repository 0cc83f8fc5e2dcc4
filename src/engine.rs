use std::path::Path;

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::corpus::{Corpus, load_corpus};
use crate::error::EngineError;
use crate::index::{CacheOutcome, IndexBuild, RefreshMode, SimilarityIndex, build_index};
use crate::keywords::KeywordHighlighter;
use crate::model::{
    AnalysisReport, HighlightResult, SearchResult, SentenceAssessment, StoryEntry,
};
use crate::provider::{EmbeddingProvider, check_batch_shape, open_provider};
use crate::report::{is_likely_scam, story_examples, top_categories};
use crate::risk::RiskClassifier;
use crate::semantic::resolve_model_config;
use crate::util::truncate_chars;

/// Session context: owns the embedding model and the corpus index. Build it
/// once and pass it to every query.
pub struct ScamEngine {
    config: EngineConfig,
    provider: Box<dyn EmbeddingProvider>,
    index: SimilarityIndex,
    classifier: RiskClassifier,
    highlighter: KeywordHighlighter,
    stories: Vec<StoryEntry>,
    cache_outcome: CacheOutcome,
    build_warnings: Vec<String>,
}

impl ScamEngine {
    /// Loads the model and corpus, then builds the index through the cache.
    pub fn open(
        config: EngineConfig,
        corpus_path: &Path,
        refresh_mode: RefreshMode,
    ) -> Result<Self, EngineError> {
        let model = resolve_model_config(&config.model_id)?;
        let provider = open_provider(&model, &config.model_cache_dir())?;
        let corpus = load_corpus(corpus_path)?;

        info!(
            corpus = %corpus_path.display(),
            rows = corpus.len(),
            "loaded corpus"
        );

        Self::with_provider(config, provider, corpus, refresh_mode)
    }

    pub fn with_provider(
        config: EngineConfig,
        provider: Box<dyn EmbeddingProvider>,
        corpus: Corpus,
        refresh_mode: RefreshMode,
    ) -> Result<Self, EngineError> {
        let classifier = RiskClassifier::new(config.risk_threshold)?;
        let highlighter = KeywordHighlighter::new(&config.keywords);

        let IndexBuild {
            index,
            outcome,
            warnings,
        } = build_index(
            corpus,
            provider.as_ref(),
            &config.cache_dir,
            config.batch_size,
            refresh_mode,
        )?;

        Ok(Self {
            config,
            provider,
            index,
            classifier,
            highlighter,
            stories: Vec::new(),
            cache_outcome: outcome,
            build_warnings: warnings,
        })
    }

    pub fn with_stories(mut self, stories: Vec<StoryEntry>) -> Self {
        self.stories = stories;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub fn cache_outcome(&self) -> &CacheOutcome {
        &self.cache_outcome
    }

    pub fn build_warnings(&self) -> &[String] {
        &self.build_warnings
    }

    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, EngineError> {
        if top_k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.provider.embed(query)?;
        Ok(self.index.rank(&query_vector, top_k))
    }

    pub fn assess(&self, text: &str) -> Result<Vec<SentenceAssessment>, EngineError> {
        let sentences = self.classifier.split_sentences(text);
        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.provider.embed_batch(&sentences)?;
        check_batch_shape(self.provider.model(), sentences.len(), &vectors)?;

        Ok(sentences
            .into_iter()
            .zip(vectors.iter())
            .map(|(sentence, vector)| {
                let score = self.index.best_score(vector);
                SentenceAssessment {
                    sentence: sentence.to_string(),
                    score,
                    level: self.classifier.level(score),
                }
            })
            .collect())
    }

    pub fn highlight(&self, text: &str) -> HighlightResult {
        self.highlighter.highlight(text)
    }

    /// Search, category roll-up, keyword highlight and sentence assessment
    /// over one input.
    pub fn analyze(&self, text: &str) -> Result<AnalysisReport, EngineError> {
        let (query, truncated) = truncate_chars(text, self.config.max_input_chars);
        if truncated {
            warn!(
                max_input_chars = self.config.max_input_chars,
                "input truncated before analysis"
            );
        }

        let matches = self.search(query, self.config.search_top_k)?;
        let categories = top_categories(&matches, self.config.report_top_categories);
        let likely_scam = is_likely_scam(&categories, self.config.scam_signal_threshold);

        let stories = match categories.first() {
            Some(leading) if likely_scam => {
                story_examples(&self.stories, &leading.scam_type, self.config.story_examples)
            }
            _ => Vec::new(),
        };

        Ok(AnalysisReport {
            query: query.to_string(),
            truncated,
            likely_scam,
            scam_signal_threshold: self.config.scam_signal_threshold,
            top_categories: categories,
            matches,
            keywords: self.highlight(query),
            sentences: self.assess(query)?,
            story_examples: stories,
            resource_url: self.config.resource_url.clone(),
        })
    }
}
