use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::cache::{CacheKey, CacheLocation, load_cache, write_cache};
use crate::corpus::Corpus;
use crate::error::{CacheLoadFailure, EngineError};
use crate::model::{CorpusEntry, SearchResult};
use crate::provider::{EmbeddingProvider, check_batch_shape};
use crate::semantic::cosine_similarity;

pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Corpus rows paired positionally with their embeddings. Built once and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    corpus: Corpus,
    vectors: Vec<Vec<f32>>,
}

impl SimilarityIndex {
    pub fn new(corpus: Corpus, vectors: Vec<Vec<f32>>) -> Result<Self, EngineError> {
        if corpus.len() != vectors.len() {
            return Err(EngineError::Embedding {
                model_id: String::new(),
                reason: format!(
                    "corpus has {} entries but {} vectors were supplied",
                    corpus.len(),
                    vectors.len()
                ),
            });
        }

        Ok(Self { corpus, vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.corpus.entries
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Top `top_k` entries by descending cosine similarity. Equal scores keep
    /// corpus order.
    pub fn rank(&self, query: &[f32], top_k: usize) -> Vec<SearchResult> {
        if top_k == 0 || self.is_empty() {
            return Vec::new();
        }

        let mut scored = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, cosine_similarity(query, vector)))
            .collect::<Vec<(usize, f64)>>();
        scored.sort_by(|left, right| right.1.total_cmp(&left.1));
        scored.truncate(top_k);

        scored
            .into_iter()
            .enumerate()
            .map(|(rank, (position, score))| {
                let entry = &self.corpus.entries[position];
                SearchResult {
                    rank: rank + 1,
                    content: entry.content.clone(),
                    scam_type: entry.scam_type.clone(),
                    platform: entry.platform.clone(),
                    score,
                }
            })
            .collect()
    }

    /// Best similarity of `query` against any corpus vector; 0 for an empty
    /// corpus.
    pub fn best_score(&self, query: &[f32]) -> f64 {
        self.vectors
            .iter()
            .map(|vector| cosine_similarity(query, vector))
            .max_by(f64::total_cmp)
            .unwrap_or(0.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RefreshMode {
    Full,
    MissingOrStale,
}

impl RefreshMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::MissingOrStale => "missing-or-stale",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    Reused,
    Built,
    Rebuilt { reason: String },
    Forced,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reused => "reused",
            Self::Built => "built",
            Self::Rebuilt { .. } => "rebuilt",
            Self::Forced => "forced",
        }
    }
}

#[derive(Debug)]
pub struct IndexBuild {
    pub index: SimilarityIndex,
    pub outcome: CacheOutcome,
    pub warnings: Vec<String>,
}

/// Loads `corpus` vectors from the cache under `cache_dir`, or computes and
/// persists them when the cache is missing, stale or refresh is forced.
pub fn build_index(
    corpus: Corpus,
    provider: &dyn EmbeddingProvider,
    cache_dir: &Path,
    batch_size: usize,
    refresh_mode: RefreshMode,
) -> Result<IndexBuild, EngineError> {
    let model = provider.model();
    let location = CacheLocation::for_corpus(cache_dir, &corpus.source_name);
    let key = CacheKey {
        corpus_file: corpus.source_name.clone(),
        row_count: corpus.len(),
        content_fingerprint: corpus.fingerprint(),
        model_id: model.model_id.clone(),
        dimensions: model.dimensions,
    };

    let cached = match refresh_mode {
        RefreshMode::Full => Err(None),
        RefreshMode::MissingOrStale => load_cache(&location, &key).map_err(Some),
    };

    let outcome = match cached {
        Ok(vectors) => {
            info!(
                path = %location.blob_path.display(),
                rows = vectors.len(),
                model_id = %key.model_id,
                "loaded cached corpus embeddings"
            );
            let index = SimilarityIndex::new(corpus, vectors)?;
            return Ok(IndexBuild {
                index,
                outcome: CacheOutcome::Reused,
                warnings: Vec::new(),
            });
        }
        Err(None) => CacheOutcome::Forced,
        Err(Some(failure)) => recompute_outcome(&failure),
    };

    if let CacheOutcome::Rebuilt { reason } = &outcome {
        warn!(
            path = %location.manifest_path.display(),
            reason = %reason,
            "failed to load cached embeddings, recomputing"
        );
    }

    let vectors = compute_embeddings(&corpus, provider, batch_size)?;
    let mut warnings = Vec::new();
    match write_cache(&location, &key, &vectors) {
        Ok(manifest) => info!(
            path = %location.blob_path.display(),
            rows = manifest.row_count,
            fingerprint = %manifest.content_fingerprint,
            "wrote corpus embedding cache"
        ),
        Err(err) => {
            warn!(error = %err, "failed to persist embedding cache; continuing without it");
            warnings.push(err.to_string());
        }
    }

    Ok(IndexBuild {
        index: SimilarityIndex::new(corpus, vectors)?,
        outcome,
        warnings,
    })
}

fn recompute_outcome(failure: &CacheLoadFailure) -> CacheOutcome {
    if failure.is_missing() {
        CacheOutcome::Built
    } else {
        CacheOutcome::Rebuilt {
            reason: failure.to_string(),
        }
    }
}

pub fn compute_embeddings(
    corpus: &Corpus,
    provider: &dyn EmbeddingProvider,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, EngineError> {
    let batch_size = batch_size.max(1);
    let contents = corpus.contents();
    let started = Instant::now();
    let mut vectors = Vec::<Vec<f32>>::with_capacity(contents.len());

    for batch in contents.chunks(batch_size) {
        let embedded = provider.embed_batch(batch)?;
        check_batch_shape(provider.model(), batch.len(), &embedded)?;
        vectors.extend(embedded);

        info!(
            model_id = %provider.model().model_id,
            embedded = vectors.len(),
            total = contents.len(),
            "embed batch completed"
        );
    }

    info!(
        rows = vectors.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "corpus embedding completed"
    );

    Ok(vectors)
}

#[cfg(test)]
mod tests;
