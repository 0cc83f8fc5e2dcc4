use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cache::{CacheKey, CacheLocation, CacheState, inspect_cache};
use crate::cli::StatusArgs;
use crate::corpus::load_corpus;
use crate::semantic::resolve_model_config;

use super::shared::load_config;

pub fn run(args: StatusArgs) -> Result<()> {
    let config = load_config(&args.engine)?;
    let model = resolve_model_config(&config.model_id)?;

    info!(
        corpus = %args.engine.corpus.display(),
        cache_dir = %config.cache_dir.display(),
        model_id = %model.model_id,
        "status requested"
    );

    if !args.engine.corpus.exists() {
        warn!(path = %args.engine.corpus.display(), "corpus file missing");
        return Ok(());
    }

    let corpus = load_corpus(&args.engine.corpus)
        .with_context(|| format!("failed to read {}", args.engine.corpus.display()))?;
    let fingerprint = corpus.fingerprint();
    info!(
        rows = corpus.len(),
        fingerprint = %fingerprint,
        "loaded corpus"
    );

    let location = CacheLocation::for_corpus(&config.cache_dir, &corpus.source_name);
    let key = CacheKey {
        corpus_file: corpus.source_name.clone(),
        row_count: corpus.len(),
        content_fingerprint: fingerprint,
        model_id: model.model_id.clone(),
        dimensions: model.dimensions,
    };

    match inspect_cache(&location, &key) {
        CacheState::Fresh(manifest) => info!(
            path = %location.blob_path.display(),
            generated_at = %manifest.generated_at,
            rows = manifest.row_count,
            "embedding cache is fresh"
        ),
        CacheState::Stale(failure) => warn!(
            path = %location.manifest_path.display(),
            reason = %failure,
            "embedding cache is stale and will be rebuilt on next load"
        ),
        state @ CacheState::Missing => warn!(
            path = %location.manifest_path.display(),
            state = state.as_str(),
            "embedding cache missing"
        ),
    }

    Ok(())
}
