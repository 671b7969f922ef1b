//! Scenario tests S1-S6 from the testable-properties table, plus the
//! invariants not already covered by a unit test living next to its module.

use std::sync::Arc;

use async_trait::async_trait;
use glimpse_domain::traits::{ChunkStore, EmbedBatchResult, Embedder};
use glimpse_domain::{ContentClass, DeviceInfo, FingerprintMap, GlimpseConfig, PolicyConfig, ProgressSink, Result};
use glimpse_indexer::{DispatchChunker, IntegrityEngine, Pipeline, Policy, SourceFile};
use glimpse_services::{HashEmbedder, InMemoryChunkStore};
use tempfile::TempDir;
use tokio::sync::Mutex;

struct NoopEmbedder;

#[async_trait]
impl Embedder for NoopEmbedder {
    async fn initialize(&self, _progress: Option<&dyn ProgressSink>) -> Result<()> {
        Ok(())
    }
    async fn embed_batch(&self, texts: &[String], _progress: Option<&dyn ProgressSink>) -> Result<EmbedBatchResult> {
        Ok(EmbedBatchResult {
            vectors: texts.iter().map(|_| vec![0.2_f32; 384]).collect(),
            success_indices: (0..texts.len()).collect(),
            failed_count: 0,
        })
    }
    fn dimension(&self) -> usize {
        384
    }
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::cpu()
    }
}

/// Fails on a fixed set of indices; used for S5.
struct FlakyEmbedder {
    fail_indices: Vec<usize>,
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    async fn initialize(&self, _progress: Option<&dyn ProgressSink>) -> Result<()> {
        Ok(())
    }
    async fn embed_batch(&self, texts: &[String], _progress: Option<&dyn ProgressSink>) -> Result<EmbedBatchResult> {
        let mut vectors = Vec::new();
        let mut success_indices = Vec::new();
        for (i, _) in texts.iter().enumerate() {
            if !self.fail_indices.contains(&i) {
                vectors.push(vec![0.3_f32; 384]);
                success_indices.push(i);
            }
        }
        Ok(EmbedBatchResult { vectors, success_indices, failed_count: self.fail_indices.len() })
    }
    fn dimension(&self) -> usize {
        384
    }
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::cpu()
    }
}

fn pipeline_with(embedder: Arc<dyn Embedder>) -> Pipeline {
    Pipeline {
        chunker: Arc::new(DispatchChunker::new()),
        code_store: Arc::new(Mutex::new(InMemoryChunkStore::new(384))),
        code_embedder: embedder,
        docs_store: Arc::new(Mutex::new(InMemoryChunkStore::new(768))),
        docs_embedder: Arc::new(HashEmbedder::docs()),
        config: GlimpseConfig::default(),
    }
}

#[tokio::test]
async fn s1_scan_index_rejects_hard_denied_and_indexes_the_rest() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/a.ts"), "let x = 1;\n".repeat(20)).unwrap();
    std::fs::write(dir.path().join("README.md"), "# Title\n\nbody line\n".repeat(50)).unwrap();
    std::fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
    std::fs::create_dir(dir.path().join("node_modules")).unwrap();
    std::fs::write(dir.path().join("node_modules/x.js"), "module.exports = {}").unwrap();

    let policy = Policy::new(PolicyConfig::default(), false);
    let limits = glimpse_indexer::ScanLimits::default();
    let files = glimpse_indexer::scan_project(dir.path(), &policy, &limits).unwrap();
    let paths: Vec<_> = files.iter().map(|f| f.rel_path.clone()).collect();

    assert_eq!(files.len(), 2, "expected exactly src/a.ts and README.md, got {paths:?}");
    assert!(paths.contains(&"src/a.ts".to_string()));
    assert!(paths.contains(&"README.md".to_string()));

    let first_pass = glimpse_indexer::scan_project(dir.path(), &policy, &limits).unwrap();
    let mut first_hashes: Vec<_> = first_pass.iter().map(|f| f.content_hash.clone()).collect();
    let mut second_hashes: Vec<_> = files.iter().map(|f| f.content_hash.clone()).collect();
    first_hashes.sort();
    second_hashes.sort();
    assert_eq!(first_hashes, second_hashes, "repeated scans of unchanged content must hash identically");
}

#[tokio::test]
async fn s2_single_line_edit_reuses_almost_every_chunk() {
    let pipeline = pipeline_with(Arc::new(NoopEmbedder));
    pipeline.code_store.lock().await.open().await.unwrap();
    pipeline.docs_store.lock().await.open().await.unwrap();

    let lines: Vec<String> = (0..5000).map(|i| format!("fn f{i}() {{ let v = {i}; }}")).collect();
    let original = lines.join("\n");
    let mut fingerprints = FingerprintMap::new();
    let first = SourceFile { rel_path: "big.rs".into(), bytes: original.clone().into_bytes() };
    let first_stats = pipeline.index_file(&first, &mut fingerprints, None).await.unwrap();
    let before = pipeline.code_store.lock().await.list_chunks_by_path("big.rs").await.unwrap();
    assert_eq!(before.len(), first_stats.chunks_embedded);

    let mut edited_lines = lines.clone();
    edited_lines[2500] = "fn f2500() { let v = 999999; }".to_string();
    let edited = edited_lines.join("\n");
    let second = SourceFile { rel_path: "big.rs".into(), bytes: edited.into_bytes() };
    let stats = pipeline.index_file(&second, &mut fingerprints, None).await.unwrap();

    assert!(stats.chunks_embedded <= 3, "expected at most 3 newly embedded chunks, got {}", stats.chunks_embedded);
    assert!(stats.chunks_reused >= 1, "expected most chunks to be reused");

    let after = pipeline.code_store.lock().await.list_chunks_by_path("big.rs").await.unwrap();
    assert_eq!(after.len(), before.len(), "single-line edit must not drop unchanged chunks from the store");
}

#[tokio::test]
async fn s3_rename_with_identical_content_is_removed_plus_added() {
    let pipeline = pipeline_with(Arc::new(NoopEmbedder));
    pipeline.code_store.lock().await.open().await.unwrap();
    pipeline.docs_store.lock().await.open().await.unwrap();

    let mut fingerprints = FingerprintMap::new();
    let original = SourceFile { rel_path: "src/a.ts".into(), bytes: b"export const x = 1;\n".to_vec() };
    pipeline.index_file(&original, &mut fingerprints, None).await.unwrap();

    pipeline.remove_file("src/a.ts", &mut fingerprints).await.unwrap();
    let renamed = SourceFile { rel_path: "src/b.ts".into(), bytes: b"export const x = 1;\n".to_vec() };
    pipeline.index_file(&renamed, &mut fingerprints, None).await.unwrap();

    assert!(!fingerprints.contains_key("src/a.ts"));
    assert!(fingerprints.contains_key("src/b.ts"));
    let remaining = pipeline.code_store.lock().await.list_chunks_by_path("src/a.ts").await.unwrap();
    assert!(remaining.is_empty());
    let moved_in = pipeline.code_store.lock().await.list_chunks_by_path("src/b.ts").await.unwrap();
    assert!(!moved_in.is_empty());
}

#[tokio::test]
async fn s5_embedder_partial_failure_persists_only_successes_and_no_zero_vectors() {
    let pipeline = pipeline_with(Arc::new(FlakyEmbedder { fail_indices: vec![3, 7] }));
    pipeline.code_store.lock().await.open().await.unwrap();
    pipeline.docs_store.lock().await.open().await.unwrap();

    let body: String = (0..10).map(|i| format!("fn g{i}() {{ let v = {i}; }}\n")).collect();
    let mut fingerprints = FingerprintMap::new();
    let file = SourceFile { rel_path: "many.rs".into(), bytes: body.into_bytes() };
    let stats = pipeline.index_file(&file, &mut fingerprints, None).await.unwrap();

    assert_eq!(stats.embedding_failures, 2);
    let stored = pipeline.code_store.lock().await.list_chunks_by_path("many.rs").await.unwrap();
    assert_eq!(stored.len(), stats.chunks_embedded);
    assert!(stored.iter().all(|c| c.vector.iter().any(|&v| v != 0.0)));
}

#[tokio::test]
async fn s6_drift_after_missed_events_reports_exact_counts_then_clears() {
    let dir = TempDir::new().unwrap();
    let pipeline = Arc::new(pipeline_with(Arc::new(NoopEmbedder)));
    pipeline.code_store.lock().await.open().await.unwrap();
    pipeline.docs_store.lock().await.open().await.unwrap();

    let mut fingerprints = FingerprintMap::new();
    let mut kept = Vec::new();
    for i in 0..5 {
        let name = format!("mod{i}.rs");
        std::fs::write(dir.path().join(&name), format!("fn m{i}() {{}}")).unwrap();
        let bytes = std::fs::read(dir.path().join(&name)).unwrap();
        pipeline.index_file(&SourceFile { rel_path: name.clone(), bytes }, &mut fingerprints, None).await.unwrap();
        kept.push(name);
    }
    for i in 5..7 {
        let name = format!("gone{i}.rs");
        std::fs::write(dir.path().join(&name), format!("fn g{i}() {{}}")).unwrap();
        let bytes = std::fs::read(dir.path().join(&name)).unwrap();
        pipeline.index_file(&SourceFile { rel_path: name.clone(), bytes }, &mut fingerprints, None).await.unwrap();
    }

    // Modify the 5 kept files and delete the other 2, simulating missed watcher events.
    for name in &kept {
        std::fs::write(dir.path().join(name), "fn changed() {}").unwrap();
    }
    std::fs::remove_file(dir.path().join("gone5.rs")).unwrap();
    std::fs::remove_file(dir.path().join("gone6.rs")).unwrap();

    let policy = Policy::new(PolicyConfig::default(), false);
    let shared_fingerprints = Arc::new(Mutex::new(fingerprints));
    let engine = IntegrityEngine::new(dir.path().to_path_buf(), policy, pipeline, shared_fingerprints.clone());

    let drift = engine.check_drift().await.unwrap();
    assert_eq!(drift.modified.len(), 5);
    assert_eq!(drift.removed.len(), 2);
    assert_eq!(drift.added.len(), 0);

    let reconciled = engine.reconcile(None).await.unwrap();
    assert_eq!(reconciled.modified.len(), 5);
    assert_eq!(reconciled.removed.len(), 2);

    let final_drift = engine.check_drift().await.unwrap();
    assert!(final_drift.is_empty());
}

#[tokio::test]
async fn invariant_embedded_chunks_never_have_dimension_mismatch_or_zero_vectors() {
    let pipeline = pipeline_with(Arc::new(NoopEmbedder));
    pipeline.code_store.lock().await.open().await.unwrap();
    pipeline.docs_store.lock().await.open().await.unwrap();

    let mut fingerprints = FingerprintMap::new();
    let file = SourceFile { rel_path: "a.rs".into(), bytes: b"fn a() {}\n".to_vec() };
    pipeline.index_file(&file, &mut fingerprints, None).await.unwrap();

    let stored = pipeline.code_store.lock().await.list_chunks_by_path("a.rs").await.unwrap();
    for chunk in stored {
        assert_eq!(chunk.vector.len(), ContentClass::Code.embedding_dimension());
        assert!(chunk.vector.iter().any(|&v| v != 0.0));
    }
}
