//! Integrity Engine & Scheduler (§4.10): periodically checks the indexed
//! fingerprint map against the filesystem and reconciles drift through the
//! pipeline's incremental path.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{self, StreamExt};
use glimpse_domain::{DriftReport, FingerprintMap, GlimpseError, ProgressSink, Result, diff_fingerprints};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::pipeline::{Pipeline, SourceFile};
use crate::policy::Policy;
use crate::scan::{ScanLimits, scan_project};

/// Guards against overlapping reconciliation runs (§4.10 "never run two
/// reconciliations concurrently").
pub struct IntegrityEngine {
    root: PathBuf,
    policy: Policy,
    pipeline: Arc<Pipeline>,
    fingerprints: Arc<Mutex<FingerprintMap>>,
    running: AtomicBool,
}

impl IntegrityEngine {
    pub fn new(root: PathBuf, policy: Policy, pipeline: Arc<Pipeline>, fingerprints: Arc<Mutex<FingerprintMap>>) -> Self {
        Self { root, policy, pipeline, fingerprints, running: AtomicBool::new(false) }
    }

    /// Scans the project and compares against the recorded fingerprint map
    /// without mutating anything.
    pub async fn check_drift(&self) -> Result<DriftReport> {
        let scanned = scan_project(&self.root, &self.policy, &ScanLimits::default())?;
        let recorded = self.fingerprints.lock().await;
        let pairs: Vec<(&str, &str)> =
            scanned.iter().map(|f| (f.rel_path.as_str(), f.content_hash.as_str())).collect();
        Ok(diff_fingerprints(&recorded, pairs.into_iter()))
    }

    /// Routes drift's added/modified/removed paths through the pipeline,
    /// refusing to run while another reconciliation is already active
    /// (§4.10 "Busy" error).
    pub async fn reconcile(&self, progress: Option<&dyn ProgressSink>) -> Result<DriftReport> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(GlimpseError::busy("reconcile"));
        }
        let result = self.reconcile_inner(progress).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn reconcile_inner(&self, progress: Option<&dyn ProgressSink>) -> Result<DriftReport> {
        let drift = self.check_drift().await?;
        if drift.is_empty() {
            return Ok(drift);
        }
        info!("reconciling drift: {} added, {} modified, {} removed", drift.added.len(), drift.modified.len(), drift.removed.len());

        let batch_size = self.pipeline.config.processing.code_batch_size.max(1);
        let max_concurrent = self.pipeline.config.processing.max_concurrent_files.max(1);
        let changed: Vec<&String> = drift.added.iter().chain(drift.modified.iter()).collect();

        for batch in changed.chunks(batch_size) {
            stream::iter(batch.iter())
                .map(|rel_path| {
                    let full_path = self.root.join(rel_path);
                    let rel_path = (*rel_path).clone();
                    let fingerprints = &self.fingerprints;
                    let pipeline = &self.pipeline;
                    async move {
                        match tokio::fs::read(&full_path).await {
                            Ok(bytes) => {
                                let file = SourceFile { rel_path: rel_path.clone(), bytes };
                                let mut fingerprints = fingerprints.lock().await;
                                pipeline.index_file(&file, &mut fingerprints, progress).await?;
                            }
                            Err(err) => warn!("skipping {rel_path} during reconcile: {err}"),
                        }
                        Ok::<(), GlimpseError>(())
                    }
                })
                .buffer_unordered(max_concurrent)
                .collect::<Vec<Result<()>>>()
                .await
                .into_iter()
                .collect::<Result<Vec<()>>>()?;
        }

        let mut fingerprints = self.fingerprints.lock().await;
        for rel_path in &drift.removed {
            self.pipeline.remove_file(rel_path, &mut fingerprints).await?;
        }

        Ok(drift)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Runs `IntegrityEngine::reconcile` on a fixed interval until dropped.
/// `run_now` lets a caller (e.g. a CLI `drift` subcommand) trigger an
/// out-of-band pass without waiting for the next tick.
pub struct Scheduler {
    engine: Arc<IntegrityEngine>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(engine: Arc<IntegrityEngine>) -> Self {
        Self { engine, handle: None }
    }

    pub fn start(&mut self, interval: std::time::Duration) {
        if self.handle.is_some() {
            return;
        }
        let engine = self.engine.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(err) = engine.reconcile(None).await {
                    warn!("scheduled reconcile failed: {err}");
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub async fn run_now(&self) -> Result<DriftReport> {
        self.engine.reconcile(None).await
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use glimpse_domain::traits::{ChunkStore, EmbedBatchResult, Embedder};
    use glimpse_domain::{Device, DeviceInfo, PolicyConfig};
    use glimpse_services::{HashEmbedder, InMemoryChunkStore};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tokio::sync::Mutex as TokioMutex;

    use super::*;
    use crate::chunking::DispatchChunker;

    struct NoopEmbedder;

    #[async_trait]
    impl Embedder for NoopEmbedder {
        async fn initialize(&self, _progress: Option<&dyn ProgressSink>) -> Result<()> {
            Ok(())
        }
        async fn embed_batch(&self, texts: &[String], _progress: Option<&dyn ProgressSink>) -> Result<EmbedBatchResult> {
            Ok(EmbedBatchResult {
                vectors: texts.iter().map(|_| vec![0.1; 384]).collect(),
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

    fn pipeline() -> Arc<Pipeline> {
        Arc::new(Pipeline {
            chunker: Arc::new(DispatchChunker::new()),
            code_store: Arc::new(TokioMutex::new(InMemoryChunkStore::new(384))),
            code_embedder: Arc::new(NoopEmbedder),
            docs_store: Arc::new(TokioMutex::new(InMemoryChunkStore::new(768))),
            docs_embedder: Arc::new(HashEmbedder::docs()),
            config: glimpse_domain::GlimpseConfig::default(),
        })
    }

    #[tokio::test]
    async fn reconcile_indexes_new_files_and_updates_fingerprints() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), b"fn a() {}").unwrap();

        let pipeline = pipeline();
        pipeline.code_store.lock().await.open().await.unwrap();
        pipeline.docs_store.lock().await.open().await.unwrap();

        let policy = Policy::new(PolicyConfig::default(), false);
        let fingerprints = Arc::new(TokioMutex::new(FingerprintMap::new()));
        let engine = IntegrityEngine::new(dir.path().to_path_buf(), policy, pipeline, fingerprints.clone());

        let drift = engine.reconcile(None).await.unwrap();
        assert_eq!(drift.added, vec!["a.rs".to_string()]);
        assert!(fingerprints.lock().await.contains_key("a.rs"));

        let second = engine.check_drift().await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn concurrent_reconcile_is_rejected_as_busy() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline();
        pipeline.code_store.lock().await.open().await.unwrap();
        pipeline.docs_store.lock().await.open().await.unwrap();
        let policy = Policy::new(PolicyConfig::default(), false);
        let fingerprints = Arc::new(TokioMutex::new(FingerprintMap::new()));
        let engine = IntegrityEngine::new(dir.path().to_path_buf(), policy, pipeline, fingerprints);

        engine.running.store(true, Ordering::SeqCst);
        let err = engine.reconcile(None).await.unwrap_err();
        assert_eq!(err.error_code(), "BUSY");
    }
}
