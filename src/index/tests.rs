use std::cell::Cell;
use std::fs;

use super::*;
use crate::provider::LocalHashEmbedder;
use crate::semantic::{LOCAL_HASH_MODEL_ID, SemanticModelConfig, resolve_model_config};

struct CountingProvider {
    inner: LocalHashEmbedder,
    batches: Cell<usize>,
}

impl CountingProvider {
    fn new() -> Self {
        Self {
            inner: LocalHashEmbedder::new(
                resolve_model_config(LOCAL_HASH_MODEL_ID).expect("local model"),
            ),
            batches: Cell::new(0),
        }
    }
}

impl EmbeddingProvider for CountingProvider {
    fn model(&self) -> &SemanticModelConfig {
        self.inner.model()
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EngineError> {
        self.batches.set(self.batches.get() + 1);
        self.inner.embed_batch(texts)
    }
}

fn scam_corpus() -> Corpus {
    Corpus::new(
        "scam_data_tw.csv",
        vec![
            CorpusEntry::new("轉帳到此帳戶即可領獎", "匯款詐騙"),
            CorpusEntry::new("今天天氣真好", "無"),
        ],
    )
}

fn larger_corpus() -> Corpus {
    Corpus::new(
        "scam_dataset_tw_10000.csv",
        vec![
            CorpusEntry::new("您的帳戶異常，請立即匯款至安全帳戶", "假冒官方"),
            CorpusEntry::new("限時優惠，點擊連結領取獎金", "購物詐騙"),
            CorpusEntry::new("我是165反詐騙專線，請提供驗證碼", "假冒官方"),
            CorpusEntry::new("投資穩賺不賠，每月保證獲利", "投資詐騙"),
            CorpusEntry::new("明天一起去吃午餐吧", "無"),
        ],
    )
}

#[test]
fn transfer_query_ranks_remittance_scam_first() {
    let provider = CountingProvider::new();
    let dir = tempfile::tempdir().expect("tempdir");
    let build = build_index(
        scam_corpus(),
        &provider,
        dir.path(),
        DEFAULT_BATCH_SIZE,
        RefreshMode::MissingOrStale,
    )
    .expect("index build");

    let query = provider.embed("請立即匯款解除限制").expect("query embed");
    let results = build.index.rank(&query, 2);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].scam_type, "匯款詐騙");
    assert_eq!(results[0].rank, 1);
    assert!(results[0].score > results[1].score);
}

#[test]
fn rank_returns_min_of_top_k_and_corpus_size_in_descending_order() {
    let provider = CountingProvider::new();
    let corpus = larger_corpus();
    let vectors = compute_embeddings(&corpus, &provider, 2).expect("embeddings");
    let index = SimilarityIndex::new(corpus, vectors).expect("index");
    let query = provider.embed("請立即匯款，限時處理").expect("query embed");

    for top_k in [0, 1, 3, 5, 10] {
        let results = index.rank(&query, top_k);
        assert_eq!(results.len(), top_k.min(index.len()));
        assert!(results.windows(2).all(|pair| pair[0].score >= pair[1].score));
        assert!(results.iter().all(|result| (-1.0..=1.0).contains(&result.score)));
    }
}

#[test]
fn equal_scores_keep_corpus_order() {
    let provider = CountingProvider::new();
    let corpus = Corpus::new(
        "dupes.csv",
        vec![
            CorpusEntry::new("限時優惠", "first"),
            CorpusEntry::new("限時優惠", "second"),
            CorpusEntry::new("限時優惠", "third"),
        ],
    );
    let vectors = compute_embeddings(&corpus, &provider, 64).expect("embeddings");
    let index = SimilarityIndex::new(corpus, vectors).expect("index");
    let query = provider.embed("限時優惠").expect("query embed");

    let labels = index
        .rank(&query, 3)
        .into_iter()
        .map(|result| result.scam_type)
        .collect::<Vec<String>>();
    assert_eq!(labels, vec!["first", "second", "third"]);
}

#[test]
fn empty_corpus_searches_to_nothing() {
    let provider = CountingProvider::new();
    let dir = tempfile::tempdir().expect("tempdir");
    let build = build_index(
        Corpus::new("empty.csv", Vec::new()),
        &provider,
        dir.path(),
        DEFAULT_BATCH_SIZE,
        RefreshMode::MissingOrStale,
    )
    .expect("empty corpus still builds");

    let query = provider.embed("請立即匯款").expect("query embed");
    assert!(build.index.rank(&query, 10).is_empty());
    assert_eq!(build.index.best_score(&query), 0.0);
    assert_eq!(provider.batches.get(), 1);
}

#[test]
fn second_build_reuses_cache_and_matches_fresh_recompute() {
    let dir = tempfile::tempdir().expect("tempdir");

    let first = CountingProvider::new();
    let built = build_index(larger_corpus(), &first, dir.path(), 2, RefreshMode::MissingOrStale)
        .expect("first build");
    assert_eq!(built.outcome, CacheOutcome::Built);
    assert_eq!(first.batches.get(), 3);

    let second = CountingProvider::new();
    let reused = build_index(larger_corpus(), &second, dir.path(), 2, RefreshMode::MissingOrStale)
        .expect("second build");
    assert_eq!(reused.outcome, CacheOutcome::Reused);
    assert_eq!(second.batches.get(), 0);

    let fresh = compute_embeddings(&larger_corpus(), &second, 64).expect("fresh embeddings");
    for (cached, recomputed) in reused.index.vectors().iter().zip(fresh.iter()) {
        assert_eq!(cached.len(), recomputed.len());
        assert!(
            cached
                .iter()
                .zip(recomputed.iter())
                .all(|(a, b)| (a - b).abs() < 1e-6)
        );
    }
}

#[test]
fn corrupted_cache_falls_back_to_recompute_and_is_overwritten() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = CountingProvider::new();
    build_index(scam_corpus(), &provider, dir.path(), 64, RefreshMode::MissingOrStale)
        .expect("first build");

    let location = CacheLocation::for_corpus(dir.path(), "scam_data_tw.csv");
    fs::write(&location.blob_path, b"garbage").expect("corrupt blob");

    let rebuilt = build_index(scam_corpus(), &provider, dir.path(), 64, RefreshMode::MissingOrStale)
        .expect("fallback build");
    assert!(matches!(rebuilt.outcome, CacheOutcome::Rebuilt { .. }));
    assert!(rebuilt.warnings.is_empty());
    assert_eq!(rebuilt.index.len(), 2);

    let reused = build_index(scam_corpus(), &provider, dir.path(), 64, RefreshMode::MissingOrStale)
        .expect("third build");
    assert_eq!(reused.outcome, CacheOutcome::Reused);
}

#[test]
fn same_filename_with_different_rows_is_not_reused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = CountingProvider::new();
    build_index(scam_corpus(), &provider, dir.path(), 64, RefreshMode::MissingOrStale)
        .expect("first build");

    let mut changed = scam_corpus();
    changed.entries[1].content = "今天天氣很差".to_string();
    let rebuilt = build_index(changed, &provider, dir.path(), 64, RefreshMode::MissingOrStale)
        .expect("rebuild");

    assert!(matches!(rebuilt.outcome, CacheOutcome::Rebuilt { .. }));
    assert_eq!(rebuilt.index.entries()[1].content, "今天天氣很差");
}

#[test]
fn full_refresh_ignores_valid_cache() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = CountingProvider::new();
    build_index(scam_corpus(), &provider, dir.path(), 64, RefreshMode::MissingOrStale)
        .expect("first build");
    let before = provider.batches.get();

    let forced = build_index(scam_corpus(), &provider, dir.path(), 64, RefreshMode::Full)
        .expect("forced build");
    assert_eq!(forced.outcome, CacheOutcome::Forced);
    assert_eq!(provider.batches.get(), before + 1);
}

#[test]
fn unwritable_cache_dir_still_returns_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, b"file in the way").expect("write blocker");

    let provider = CountingProvider::new();
    let build = build_index(scam_corpus(), &provider, &blocker, 64, RefreshMode::MissingOrStale)
        .expect("cache write failure is not fatal");
    assert_eq!(build.index.len(), 2);
    assert_eq!(build.warnings.len(), 1);
}

#[test]
fn index_rejects_misaligned_vectors() {
    let result = SimilarityIndex::new(scam_corpus(), vec![vec![0.0; 4]]);
    assert!(result.is_err());
}
