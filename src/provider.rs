use std::path::Path;

use tracing::info;

use crate::error::EngineError;
use crate::semantic::{EmbeddingBackend, SemanticModelConfig, embed_text_local};

/// Turns text into fixed-length vectors. Output position `i` always
/// corresponds to input position `i`.
pub trait EmbeddingProvider {
    fn model(&self) -> &SemanticModelConfig;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EngineError>;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors.pop().ok_or_else(|| EngineError::Embedding {
            model_id: self.model().model_id.clone(),
            reason: "backend returned no vector for a single input".to_string(),
        })
    }
}

/// Loads the backend for `model`. Failing here is fatal to the engine.
pub fn open_provider(
    model: &SemanticModelConfig,
    model_cache_dir: &Path,
) -> Result<Box<dyn EmbeddingProvider>, EngineError> {
    info!(
        model_id = %model.model_id,
        backend = model.backend.as_str(),
        dimensions = model.dimensions,
        "loading embedding model"
    );

    match model.backend {
        EmbeddingBackend::LocalHash => Ok(Box::new(LocalHashEmbedder::new(model.clone()))),
        EmbeddingBackend::FastEmbed => open_fastembed(model, model_cache_dir),
    }
}

#[cfg(feature = "fastembed")]
fn open_fastembed(
    model: &SemanticModelConfig,
    model_cache_dir: &Path,
) -> Result<Box<dyn EmbeddingProvider>, EngineError> {
    Ok(Box::new(fastembed_backend::FastEmbedProvider::try_new(
        model.clone(),
        model_cache_dir,
    )?))
}

#[cfg(not(feature = "fastembed"))]
fn open_fastembed(
    model: &SemanticModelConfig,
    _model_cache_dir: &Path,
) -> Result<Box<dyn EmbeddingProvider>, EngineError> {
    Err(EngineError::ModelUnavailable {
        model_id: model.model_id.clone(),
        reason: "binary was built without the `fastembed` feature".to_string(),
    })
}

pub struct LocalHashEmbedder {
    model: SemanticModelConfig,
}

impl LocalHashEmbedder {
    pub fn new(model: SemanticModelConfig) -> Self {
        Self { model }
    }
}

impl EmbeddingProvider for LocalHashEmbedder {
    fn model(&self) -> &SemanticModelConfig {
        &self.model
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EngineError> {
        Ok(texts
            .iter()
            .map(|text| embed_text_local(text, self.model.dimensions))
            .collect())
    }
}

/// Rejects backend output that does not line up with the request.
pub(crate) fn check_batch_shape(
    model: &SemanticModelConfig,
    requested: usize,
    vectors: &[Vec<f32>],
) -> Result<(), EngineError> {
    if vectors.len() != requested {
        return Err(EngineError::Embedding {
            model_id: model.model_id.clone(),
            reason: format!("requested {requested} vectors, backend returned {}", vectors.len()),
        });
    }

    if let Some(bad) = vectors.iter().find(|vector| vector.len() != model.dimensions) {
        return Err(EngineError::Embedding {
            model_id: model.model_id.clone(),
            reason: format!(
                "expected {} dimensions, backend returned {}",
                model.dimensions,
                bad.len()
            ),
        });
    }

    Ok(())
}

#[cfg(feature = "fastembed")]
mod fastembed_backend {
    use std::path::Path;

    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

    use super::{EmbeddingProvider, check_batch_shape};
    use crate::error::EngineError;
    use crate::semantic::SemanticModelConfig;

    pub struct FastEmbedProvider {
        model: SemanticModelConfig,
        inner: TextEmbedding,
    }

    impl FastEmbedProvider {
        pub fn try_new(model: SemanticModelConfig, cache_dir: &Path) -> Result<Self, EngineError> {
            let options = InitOptions::new(EmbeddingModel::ParaphraseMLMiniLML12V2)
                .with_cache_dir(cache_dir.to_path_buf())
                .with_show_download_progress(false);

            let inner = TextEmbedding::try_new(options).map_err(|err| {
                EngineError::ModelUnavailable {
                    model_id: model.model_id.clone(),
                    reason: format!("{err:#}"),
                }
            })?;

            Ok(Self { model, inner })
        }
    }

    impl EmbeddingProvider for FastEmbedProvider {
        fn model(&self) -> &SemanticModelConfig {
            &self.model
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EngineError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let vectors = self
                .inner
                .embed(texts.to_vec(), Some(texts.len()))
                .map_err(|err| EngineError::Embedding {
                    model_id: self.model.model_id.clone(),
                    reason: format!("{err:#}"),
                })?;

            check_batch_shape(&self.model, texts.len(), &vectors)?;
            Ok(vectors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{LOCAL_HASH_MODEL_ID, resolve_model_config};

    fn local_provider() -> LocalHashEmbedder {
        LocalHashEmbedder::new(resolve_model_config(LOCAL_HASH_MODEL_ID).expect("local model"))
    }

    #[test]
    fn batch_output_preserves_input_order() {
        let provider = local_provider();
        let texts = ["今天天氣真好", "請立即匯款", ""];
        let batch = provider.embed_batch(&texts).expect("batch embed");
        assert_eq!(batch.len(), 3);
        for (text, vector) in texts.iter().zip(batch.iter()) {
            assert_eq!(&provider.embed(text).expect("single embed"), vector);
        }
    }

    #[test]
    fn check_batch_shape_flags_short_or_wrong_width_output() {
        let model = resolve_model_config(LOCAL_HASH_MODEL_ID).expect("local model");
        let good = vec![vec![0.0_f32; model.dimensions]; 2];
        assert!(check_batch_shape(&model, 2, &good).is_ok());
        assert!(check_batch_shape(&model, 3, &good).is_err());

        let narrow = vec![vec![0.0_f32; 3]];
        assert!(check_batch_shape(&model, 1, &narrow).is_err());
    }

    #[cfg(not(feature = "fastembed"))]
    #[test]
    fn pretrained_model_is_unavailable_without_feature() {
        let model = resolve_model_config(crate::semantic::MULTILINGUAL_MODEL_ID)
            .expect("multilingual config");
        let result = open_provider(&model, Path::new("unused"));
        assert!(matches!(result, Err(EngineError::ModelUnavailable { .. })));
    }
}
