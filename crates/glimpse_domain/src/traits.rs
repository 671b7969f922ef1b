//! External collaborator contracts (§6): `ChunkStore` and `Embedder` are
//! consumed abstractly; their concrete backends live outside this crate
//! (`glimpse_services` ships development-grade implementations).

use async_trait::async_trait;
use uuid::Uuid;

use crate::chunk::Chunk;
use crate::device::DeviceInfo;
use crate::error::Result;
use crate::progress::ProgressSink;

/// A stored chunk record, as returned by `list_chunks_by_path` for
/// incremental reindex (§4.7).
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub id: Uuid,
    pub text: String,
    pub vector: Vec<f32>,
    pub start_line: usize,
    pub end_line: usize,
    pub content_hash: String,
    pub chunk_hash: String,
}

/// A chunk paired with the vector to store alongside it.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Abstract vector store. Vector dimension is fixed at store creation and
/// must match the embedder backing it.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn open(&mut self) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
    /// Tear down all persisted state (used by `rebuild`).
    async fn delete(&mut self) -> Result<()>;
    async fn insert_chunks(&mut self, records: Vec<ChunkRecord>) -> Result<()>;
    async fn delete_by_path(&mut self, rel_path: &str) -> Result<()>;
    async fn delete_by_ids(&mut self, ids: &[Uuid]) -> Result<()>;
    async fn count_files(&self) -> Result<usize>;
    async fn count_chunks(&self) -> Result<usize>;
    async fn storage_size_bytes(&self) -> Result<u64>;
    async fn has_data(&self) -> Result<bool>;
    async fn list_chunks_by_path(&self, rel_path: &str) -> Result<Vec<StoredChunk>>;
}

/// Outcome of an `embed_batch` call: stable-order vectors for successful
/// inputs plus their original indices, and how many failed. Never contains
/// a zero vector for a successful entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedBatchResult {
    pub vectors: Vec<Vec<f32>>,
    pub success_indices: Vec<usize>,
    pub failed_count: usize,
}

/// Abstract embedding model. Two named singletons exist in the engine (code
/// 384-dim, docs 768-dim) with otherwise identical behavior (§4.4).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Memoized: concurrent callers share one in-flight initialization;
    /// on failure the handle clears so the next call retries.
    async fn initialize(&self, progress: Option<&dyn ProgressSink>) -> Result<()>;
    async fn embed_batch(
        &self,
        texts: &[String],
        progress: Option<&dyn ProgressSink>,
    ) -> Result<EmbedBatchResult>;
    fn dimension(&self) -> usize;
    fn device_info(&self) -> DeviceInfo;
}

/// Abstract chunker dispatched by extension/content-class (§4.2).
#[async_trait]
pub trait Chunker: Send + Sync {
    async fn chunk(&self, path: &str, content: &str, content_hash: &str) -> Result<Vec<Chunk>>;
}
