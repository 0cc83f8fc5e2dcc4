use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::EngineError;

pub const MULTILINGUAL_MODEL_ID: &str = "paraphrase-multilingual-minilm-l12-v2";
pub const MULTILINGUAL_MODEL_NAME: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";
pub const LOCAL_HASH_MODEL_ID: &str = "local-hash-v1";
pub const DEFAULT_EMBEDDING_DIM: usize = 384;
pub const DEFAULT_NORMALIZATION: &str = "l2";

#[cfg(feature = "fastembed")]
pub const DEFAULT_MODEL_ID: &str = MULTILINGUAL_MODEL_ID;
#[cfg(not(feature = "fastembed"))]
pub const DEFAULT_MODEL_ID: &str = LOCAL_HASH_MODEL_ID;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingBackend {
    #[serde(rename = "fastembed")]
    FastEmbed,
    LocalHash,
}

impl EmbeddingBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FastEmbed => "fastembed",
            Self::LocalHash => "local-hash",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticModelConfig {
    pub model_id: String,
    pub model_name: String,
    pub dimensions: usize,
    pub normalization: String,
    pub backend: EmbeddingBackend,
}

pub fn resolve_model_config(model_id: &str) -> Result<SemanticModelConfig, EngineError> {
    let trimmed = model_id.trim().to_ascii_lowercase();
    let resolved_id = if trimmed.is_empty() {
        DEFAULT_MODEL_ID
    } else {
        trimmed.as_str()
    };

    match resolved_id {
        MULTILINGUAL_MODEL_ID => Ok(SemanticModelConfig {
            model_id: MULTILINGUAL_MODEL_ID.to_string(),
            model_name: MULTILINGUAL_MODEL_NAME.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIM,
            normalization: DEFAULT_NORMALIZATION.to_string(),
            backend: EmbeddingBackend::FastEmbed,
        }),
        LOCAL_HASH_MODEL_ID => Ok(SemanticModelConfig {
            model_id: LOCAL_HASH_MODEL_ID.to_string(),
            model_name: LOCAL_HASH_MODEL_ID.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIM,
            normalization: DEFAULT_NORMALIZATION.to_string(),
            backend: EmbeddingBackend::LocalHash,
        }),
        other => Err(EngineError::ModelUnavailable {
            model_id: other.to_string(),
            reason: format!(
                "unknown model id; expected '{MULTILINGUAL_MODEL_ID}' or '{LOCAL_HASH_MODEL_ID}'"
            ),
        }),
    }
}

pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Hex SHA-256 over length-prefixed parts, so `["ab", "c"]` and
/// `["a", "bc"]` hash differently.
pub fn fingerprint_parts<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

pub fn embed_text_local(payload: &str, dimensions: usize) -> Vec<f32> {
    let dims = dimensions.max(8);
    let mut vector = vec![0_f32; dims];
    let mut features = tokenize_payload(payload);

    if features.is_empty() {
        return vector;
    }

    for feature in features.drain(..) {
        let hash = stable_hash(&feature);
        let index = (hash % dims as u64) as usize;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
        vector[index] += sign * weight;
    }

    normalize_vector(&mut vector);
    vector
}

/// Cosine similarity clamped to [-1, 1]. Mismatched, empty or zero-norm
/// inputs score 0.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut left_norm = 0.0_f64;
    let mut right_norm = 0.0_f64;
    for (left_value, right_value) in left.iter().zip(right.iter()) {
        let l = f64::from(*left_value);
        let r = f64::from(*right_value);
        dot += l * r;
        left_norm += l * l;
        right_norm += r * r;
    }

    if left_norm <= 0.0 || right_norm <= 0.0 {
        return 0.0;
    }

    (dot / (left_norm.sqrt() * right_norm.sqrt())).clamp(-1.0, 1.0)
}

pub fn encode_embedding_blob<'a, I>(vectors: I, dimensions: usize) -> Vec<u8>
where
    I: IntoIterator<Item = &'a Vec<f32>>,
{
    let mut out = Vec::<u8>::new();
    for vector in vectors {
        out.reserve(dimensions * 4);
        for value in vector {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    out
}

pub fn decode_embedding_blob(blob: &[u8], rows: usize, dimensions: usize) -> Option<Vec<Vec<f32>>> {
    if dimensions == 0 || blob.len() != rows.saturating_mul(dimensions).saturating_mul(4) {
        return None;
    }

    let mut out = Vec::<Vec<f32>>::with_capacity(rows);
    for row in blob.chunks_exact(dimensions * 4) {
        let mut vector = Vec::<f32>::with_capacity(dimensions);
        for chunk in row.chunks_exact(4) {
            let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            if !value.is_finite() {
                return None;
            }
            vector.push(value);
        }
        out.push(vector);
    }

    if out.len() == rows { Some(out) } else { None }
}

fn stable_hash(value: &str) -> u64 {
    let digest = Sha256::digest(value.as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

fn tokenize_payload(payload: &str) -> Vec<String> {
    let normalized = normalize_whitespace(payload);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut tokens = Vec::<String>::new();
    let mut word = String::new();
    for character in normalized.chars() {
        if character.is_ascii_alphanumeric() {
            word.push(character.to_ascii_lowercase());
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        // Non-ASCII scripts (CJK in particular) have no word separators,
        // so each character is a token.
        if character.is_alphanumeric() {
            tokens.push(character.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }

    let mut features = Vec::<String>::with_capacity(tokens.len() * 2);
    for (index, token) in tokens.iter().enumerate() {
        features.push(format!("t:{token}"));
        if let Some(next) = tokens.get(index + 1) {
            features.push(format!("b:{token}_{next}"));
        }
    }
    features
}

fn normalize_vector(values: &mut [f32]) {
    let squared_norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>();

    if squared_norm <= 0.0 {
        return;
    }

    let norm = squared_norm.sqrt() as f32;
    if norm == 0.0 {
        return;
    }

    for value in values {
        *value /= norm;
    }
}
