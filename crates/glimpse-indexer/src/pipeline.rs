//! Indexing Pipeline (§4.8): chunk -> embed -> store, per file, batched.
//!
//! Only indices reported as successful by the embedder ever reach the
//! store; a batch with partial embedding failures still persists whatever
//! succeeded rather than discarding the whole file.

use std::sync::Arc;

use glimpse_domain::traits::{ChunkRecord, ChunkStore, Chunker, Embedder};
use glimpse_domain::{Chunk, ContentClass, FingerprintMap, GlimpseConfig, ProgressEvent, ProgressSink, Result, content_hash};

use uuid::Uuid;

use crate::incremental::{self, ReindexPlan};

const COMMENT_CHUNK_MARKER: &str = "[code-comment]";

/// One file queued for indexing.
pub struct SourceFile {
    pub rel_path: String,
    pub bytes: Vec<u8>,
}

/// Collaborators the pipeline drives. Both stores/embedders are behind
/// `Arc` so the pipeline can be cloned cheaply across concurrent file tasks.
pub struct Pipeline {
    pub chunker: Arc<dyn Chunker>,
    pub code_store: Arc<tokio::sync::Mutex<dyn ChunkStore>>,
    pub code_embedder: Arc<dyn Embedder>,
    pub docs_store: Arc<tokio::sync::Mutex<dyn ChunkStore>>,
    pub docs_embedder: Arc<dyn Embedder>,
    pub config: GlimpseConfig,
}

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub files_processed: usize,
    pub chunks_embedded: usize,
    pub chunks_reused: usize,
    pub embedding_failures: usize,
}

impl Pipeline {
    /// Processes one file end to end: chunk, diff against existing chunks
    /// (if any), embed only what's new or moved, then commit to storage. The
    /// fingerprint map is updated in place so the caller can persist it.
    pub async fn index_file(
        &self,
        file: &SourceFile,
        fingerprints: &mut FingerprintMap,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<IndexStats> {
        let text = String::from_utf8_lossy(&file.bytes).into_owned();
        let hash = content_hash(&file.bytes);
        let class = crate::chunking::DispatchChunker::classify(&file.rel_path);

        let new_chunks = self.chunker.chunk(&file.rel_path, &text, &hash).await?;
        if let Some(sink) = progress {
            sink.on_progress(ProgressEvent::Chunking { current: new_chunks.len(), total: new_chunks.len() });
        }

        let stats = match class {
            ContentClass::Code => {
                self.commit(&self.code_store, self.code_embedder.as_ref(), &file.rel_path, new_chunks, progress)
                    .await?
            }
            ContentClass::Docs => {
                self.commit(&self.docs_store, self.docs_embedder.as_ref(), &file.rel_path, new_chunks, progress)
                    .await?
            }
        };

        if self.config.extract_comments && class == ContentClass::Code {
            self.index_comment_chunks(file, &text, &hash, progress).await?;
        }

        fingerprints.insert(file.rel_path.clone(), hash);
        Ok(stats)
    }

    /// Removes a deleted file's chunks from whichever store holds them and
    /// drops its fingerprint entry.
    pub async fn remove_file(&self, rel_path: &str, fingerprints: &mut FingerprintMap) -> Result<()> {
        self.code_store.lock().await.delete_by_path(rel_path).await?;
        self.docs_store.lock().await.delete_by_path(rel_path).await?;
        fingerprints.remove(rel_path);
        Ok(())
    }

    async fn commit(
        &self,
        store: &Arc<tokio::sync::Mutex<dyn ChunkStore>>,
        embedder: &dyn Embedder,
        rel_path: &str,
        new_chunks: Vec<Chunk>,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<IndexStats> {
        let mut stats = IndexStats { files_processed: 1, ..Default::default() };

        let existing = store.lock().await.list_chunks_by_path(rel_path).await?;
        let use_incremental =
            !existing.is_empty() && incremental::should_use_incremental(existing.len(), &incremental::plan(&existing, &new_chunks), &self.config);

        let plan: ReindexPlan = if use_incremental || existing.is_empty() {
            incremental::plan(&existing, &new_chunks)
        } else {
            // Below the heuristic threshold: treat every chunk as new so the
            // whole file gets a clean, freshly embedded replacement.
            ReindexPlan { added: new_chunks.clone(), removed: existing.iter().map(|s| s.id).collect(), ..Default::default() }
        };

        stats.chunks_reused = plan.unchanged.len() + plan.moved.len();

        let mut records: Vec<ChunkRecord> = plan
            .moved
            .iter()
            .map(|(_, vector, chunk)| ChunkRecord { chunk: chunk.clone(), vector: vector.clone() })
            .collect();

        if !plan.added.is_empty() {
            let texts: Vec<String> = plan.added.iter().map(|c| c.text.clone()).collect();
            let result = embedder.embed_batch(&texts, progress).await?;
            stats.chunks_embedded = result.success_indices.len();
            stats.embedding_failures = result.failed_count;
            for (vector, &index) in result.vectors.iter().zip(result.success_indices.iter()) {
                records.push(ChunkRecord { chunk: plan.added[index].clone(), vector: vector.clone() });
            }
        }

        let mut store = store.lock().await;
        // Delete ids being replaced in place (moved, re-embedded under the same
        // id) or gone for good (removed) before inserting, so a moved chunk's
        // reinsertion never sits alongside its own stale copy. `plan.unchanged`
        // is never touched: its chunks are already correct in the store.
        let mut stale_ids: Vec<Uuid> = plan.moved.iter().map(|(id, _, _)| *id).collect();
        stale_ids.extend(plan.removed.iter().copied());
        if !stale_ids.is_empty() {
            store.delete_by_ids(&stale_ids).await?;
        }
        if !records.is_empty() {
            if let Some(sink) = progress {
                sink.on_progress(ProgressEvent::Storing { current: records.len(), total: records.len() });
            }
            store.insert_chunks(records).await?;
        }

        Ok(stats)
    }

    /// Emits marker-prefixed doc-like chunks for a code file's leading
    /// comments into the docs store, when `extract_comments` is enabled
    /// (§4.8 "comment extraction mode").
    async fn index_comment_chunks(
        &self,
        file: &SourceFile,
        text: &str,
        hash: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<()> {
        let Some(summary) = crate::extraction::summarize(text, &file.rel_path) else { return Ok(()) };
        let comment_chunks: Vec<Chunk> = summary
            .functions
            .iter()
            .filter_map(|f| f.docstring.as_ref().map(|doc| (f, doc)))
            .map(|(f, doc)| {
                let marker_text = format!("{COMMENT_CHUNK_MARKER} {}\n\n{}: {}", file.rel_path, f.name, doc);
                Chunk::new(&file.rel_path, marker_text, f.start_line, f.end_line, hash, ContentClass::Docs)
                    .with_symbol(f.name.clone())
            })
            .collect();

        if comment_chunks.is_empty() {
            return Ok(());
        }

        self.commit(&self.docs_store, self.docs_embedder.as_ref(), &file.rel_path, comment_chunks, progress).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use glimpse_domain::{Device, DeviceInfo, EmbedBatchResult};
    use glimpse_services::{HashEmbedder, InMemoryChunkStore};
    use pretty_assertions::assert_eq;
    use tokio::sync::Mutex;

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
            DeviceInfo { device: Device::Cpu, fallback_reason: None }
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline {
            chunker: Arc::new(DispatchChunker::new()),
            code_store: Arc::new(Mutex::new(InMemoryChunkStore::new(384))),
            code_embedder: Arc::new(NoopEmbedder),
            docs_store: Arc::new(Mutex::new(InMemoryChunkStore::new(768))),
            docs_embedder: Arc::new(HashEmbedder::docs()),
            config: GlimpseConfig::default(),
        }
    }

    #[tokio::test]
    async fn indexing_a_file_populates_store_and_fingerprint() {
        let pipeline = pipeline();
        pipeline.code_store.lock().await.open().await.unwrap();
        pipeline.docs_store.lock().await.open().await.unwrap();

        let file = SourceFile { rel_path: "a.rs".into(), bytes: b"fn a() {}\nfn b() {}\n".to_vec() };
        let mut fingerprints = FingerprintMap::new();
        let stats = pipeline.index_file(&file, &mut fingerprints, None).await.unwrap();

        assert_eq!(stats.files_processed, 1);
        assert!(stats.chunks_embedded > 0);
        assert!(fingerprints.contains_key("a.rs"));
        assert!(pipeline.code_store.lock().await.has_data().await.unwrap());
    }

    #[tokio::test]
    async fn removing_a_file_clears_its_chunks_and_fingerprint() {
        let pipeline = pipeline();
        pipeline.code_store.lock().await.open().await.unwrap();
        pipeline.docs_store.lock().await.open().await.unwrap();

        let file = SourceFile { rel_path: "a.rs".into(), bytes: b"fn a() {}\n".to_vec() };
        let mut fingerprints = FingerprintMap::new();
        pipeline.index_file(&file, &mut fingerprints, None).await.unwrap();

        pipeline.remove_file("a.rs", &mut fingerprints).await.unwrap();
        assert!(!fingerprints.contains_key("a.rs"));
        let remaining = pipeline.code_store.lock().await.list_chunks_by_path("a.rs").await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn reindexing_unchanged_file_reuses_every_chunk() {
        let pipeline = pipeline();
        pipeline.code_store.lock().await.open().await.unwrap();
        pipeline.docs_store.lock().await.open().await.unwrap();

        let file = SourceFile {
            rel_path: "a.rs".into(),
            bytes: b"fn one() {}\nfn two() {}\nfn three() {}\nfn four() {}\n".to_vec(),
        };
        let mut fingerprints = FingerprintMap::new();
        let first = pipeline.index_file(&file, &mut fingerprints, None).await.unwrap();
        let second = pipeline.index_file(&file, &mut fingerprints, None).await.unwrap();

        assert_eq!(second.chunks_embedded, 0);
        assert!(second.chunks_reused > 0);

        let stored = pipeline.code_store.lock().await.list_chunks_by_path("a.rs").await.unwrap();
        assert_eq!(stored.len(), first.chunks_embedded);
    }
}
