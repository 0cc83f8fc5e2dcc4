use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CacheLoadFailure, EngineError};
use crate::model::EmbeddingCacheManifest;
use crate::semantic::{decode_embedding_blob, encode_embedding_blob};
use crate::util::{now_utc_string, sha256_bytes, write_atomic};

pub const CACHE_MANIFEST_VERSION: u32 = 1;

/// Files backing one corpus' embedding cache. Names derive from the corpus
/// filename stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    pub manifest_path: PathBuf,
    pub blob_path: PathBuf,
}

impl CacheLocation {
    pub fn for_corpus(cache_dir: &Path, corpus_file: &str) -> Self {
        let stem = Path::new(corpus_file)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("corpus");

        Self {
            manifest_path: cache_dir.join(format!("{stem}_embeddings.json")),
            blob_path: cache_dir.join(format!("{stem}_embeddings.bin")),
        }
    }
}

/// Identity a cache must match to be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub corpus_file: String,
    pub row_count: usize,
    pub content_fingerprint: String,
    pub model_id: String,
    pub dimensions: usize,
}

#[derive(Debug)]
pub enum CacheState {
    Fresh(EmbeddingCacheManifest),
    Stale(CacheLoadFailure),
    Missing,
}

impl CacheState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh(_) => "fresh",
            Self::Stale(_) => "stale",
            Self::Missing => "missing",
        }
    }
}

pub fn load_cache(
    location: &CacheLocation,
    key: &CacheKey,
) -> Result<Vec<Vec<f32>>, CacheLoadFailure> {
    let manifest = read_manifest(location)?;
    check_manifest(&manifest, key)?;

    let blob = fs::read(&location.blob_path).map_err(|err| CacheLoadFailure::Unreadable {
        path: location.blob_path.clone(),
        reason: err.to_string(),
    })?;

    let blob_sha256 = sha256_bytes(&blob);
    if blob_sha256 != manifest.blob_sha256 {
        return Err(CacheLoadFailure::Malformed(format!(
            "blob checksum {blob_sha256} does not match manifest {}",
            manifest.blob_sha256
        )));
    }

    decode_embedding_blob(&blob, key.row_count, key.dimensions).ok_or_else(|| {
        CacheLoadFailure::Malformed(format!(
            "expected {} rows of {} finite f32 values, found {} bytes",
            key.row_count,
            key.dimensions,
            blob.len()
        ))
    })
}

/// Classifies the on-disk cache against `key` without touching the model.
pub fn inspect_cache(location: &CacheLocation, key: &CacheKey) -> CacheState {
    match load_cache(location, key) {
        Ok(_) => match read_manifest(location) {
            Ok(manifest) => CacheState::Fresh(manifest),
            Err(failure) => CacheState::Stale(failure),
        },
        Err(failure) if failure.is_missing() => CacheState::Missing,
        Err(failure) => CacheState::Stale(failure),
    }
}

/// Persists `vectors` for `key`. The blob is written before the manifest,
/// and the manifest's checksum rejects any blob left over from a torn write.
pub fn write_cache(
    location: &CacheLocation,
    key: &CacheKey,
    vectors: &[Vec<f32>],
) -> Result<EmbeddingCacheManifest, EngineError> {
    let blob = encode_embedding_blob(vectors, key.dimensions);
    let manifest = EmbeddingCacheManifest {
        manifest_version: CACHE_MANIFEST_VERSION,
        generated_at: now_utc_string(),
        corpus_file: key.corpus_file.clone(),
        row_count: key.row_count,
        content_fingerprint: key.content_fingerprint.clone(),
        model_id: key.model_id.clone(),
        dimensions: key.dimensions,
        blob_file: location
            .blob_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string(),
        blob_sha256: sha256_bytes(&blob),
    };

    write_atomic(&location.blob_path, &blob).map_err(|source| EngineError::CacheIo {
        path: location.blob_path.clone(),
        source,
    })?;

    let mut manifest_bytes = serde_json::to_vec_pretty(&manifest).map_err(|err| {
        EngineError::CacheIo {
            path: location.manifest_path.clone(),
            source: io::Error::from(err),
        }
    })?;
    manifest_bytes.push(b'\n');

    write_atomic(&location.manifest_path, &manifest_bytes).map_err(|source| {
        EngineError::CacheIo {
            path: location.manifest_path.clone(),
            source,
        }
    })?;

    Ok(manifest)
}

fn read_manifest(location: &CacheLocation) -> Result<EmbeddingCacheManifest, CacheLoadFailure> {
    let path = &location.manifest_path;
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(CacheLoadFailure::Missing { path: path.clone() });
        }
        Err(err) => {
            return Err(CacheLoadFailure::Unreadable {
                path: path.clone(),
                reason: err.to_string(),
            });
        }
    };

    serde_json::from_slice(&raw).map_err(|err| CacheLoadFailure::Unreadable {
        path: path.clone(),
        reason: err.to_string(),
    })
}

fn check_manifest(manifest: &EmbeddingCacheManifest, key: &CacheKey) -> Result<(), CacheLoadFailure> {
    if manifest.manifest_version != CACHE_MANIFEST_VERSION {
        return Err(CacheLoadFailure::Mismatch(format!(
            "manifest version {} (expected {CACHE_MANIFEST_VERSION})",
            manifest.manifest_version
        )));
    }
    if manifest.model_id != key.model_id {
        return Err(CacheLoadFailure::Mismatch(format!(
            "model '{}' (expected '{}')",
            manifest.model_id, key.model_id
        )));
    }
    if manifest.dimensions != key.dimensions {
        return Err(CacheLoadFailure::Mismatch(format!(
            "{} dimensions (expected {})",
            manifest.dimensions, key.dimensions
        )));
    }
    if manifest.row_count != key.row_count {
        return Err(CacheLoadFailure::Mismatch(format!(
            "{} rows (corpus has {})",
            manifest.row_count, key.row_count
        )));
    }
    if manifest.content_fingerprint != key.content_fingerprint {
        return Err(CacheLoadFailure::Mismatch(format!(
            "content fingerprint of '{}' changed",
            manifest.corpus_file
        )));
    }
    Ok(())
}
