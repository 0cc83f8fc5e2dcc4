use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::cli::EmbedArgs;
use crate::index::{CacheOutcome, RefreshMode};
use crate::model::EmbeddingRunManifest;
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

use super::shared::open_engine;

pub fn run(args: EmbedArgs) -> Result<()> {
    let refresh_mode = RefreshMode::from(args.refresh_mode);
    let started_at = now_utc_string();
    let started = Instant::now();
    let run_id = format!("embed-{}", utc_compact_string(Utc::now()));

    let engine = open_engine(&args.engine, refresh_mode)?;
    let config = engine.config();
    let model = engine.provider().model();
    let corpus = engine.index().corpus();

    let mut warnings = engine.build_warnings().to_vec();
    if let CacheOutcome::Rebuilt { reason } = engine.cache_outcome() {
        warnings.push(format!("previous cache discarded: {reason}"));
    }
    if corpus.is_empty() {
        warnings.push("corpus has no rows".to_string());
    }

    let manifest = EmbeddingRunManifest {
        manifest_version: 1,
        run_id,
        generated_at: started_at,
        corpus_file: corpus.source_name.clone(),
        model_id: model.model_id.clone(),
        model_name: model.model_name.clone(),
        embedding_dim: model.dimensions,
        normalization: model.normalization.clone(),
        backend: model.backend.as_str().to_string(),
        refresh_mode: refresh_mode.as_str().to_string(),
        row_count: corpus.len(),
        content_fingerprint: corpus.fingerprint(),
        cache_outcome: engine.cache_outcome().as_str().to_string(),
        batch_size: config.batch_size,
        duration_ms: started.elapsed().as_millis(),
        status: if engine.build_warnings().is_empty() {
            "completed"
        } else {
            "completed-without-cache"
        }
        .to_string(),
        warnings,
    };

    let manifest_path = config.cache_dir.join("manifests").join(format!(
        "embedding_run_{}.json",
        utc_compact_string(Utc::now())
    ));
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        path = %manifest_path.display(),
        model_id = %manifest.model_id,
        rows = manifest.row_count,
        cache_outcome = %manifest.cache_outcome,
        "embedding refresh completed"
    );

    Ok(())
}
