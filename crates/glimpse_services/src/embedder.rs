//! Development-grade `Embedder` backend: deterministic hash-based vectors.
//! Grounded on the teacher's mock embedder, generalized to the two fixed
//! content-class dimensions and the progress/initialize contract (§4.4).

use async_trait::async_trait;
use glimpse_domain::traits::{EmbedBatchResult, Embedder};
use glimpse_domain::{DeviceInfo, GlimpseError, ProgressEvent, ProgressSink, Result};
use glimpse_domain::{generate_hash_embedding, is_valid_vector};
use tokio::sync::RwLock;

/// Always reports `Device::Cpu`; real accelerator detection belongs to a
/// production embedder backend, not this deterministic placeholder.
pub struct HashEmbedder {
    dimension: usize,
    initialized: RwLock<bool>,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension, initialized: RwLock::new(false) }
    }

    /// The 384-dim embedder backing the code content class.
    pub fn code() -> Self {
        Self::new(384)
    }

    /// The 768-dim embedder backing the docs content class.
    pub fn docs() -> Self {
        Self::new(768)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn initialize(&self, progress: Option<&dyn ProgressSink>) -> Result<()> {
        if *self.initialized.read().await {
            return Ok(());
        }
        let mut guard = self.initialized.write().await;
        if *guard {
            return Ok(());
        }
        if let Some(sink) = progress {
            sink.on_progress(ProgressEvent::Embedding { current: 0, total: 1 });
        }
        *guard = true;
        Ok(())
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        progress: Option<&dyn ProgressSink>,
    ) -> Result<EmbedBatchResult> {
        let mut vectors = Vec::with_capacity(texts.len());
        let mut success_indices = Vec::with_capacity(texts.len());
        let mut failed_count = 0;

        for (index, text) in texts.iter().enumerate() {
            let vector = generate_hash_embedding(text, self.dimension, None);
            if is_valid_vector(&vector) {
                vectors.push(vector);
                success_indices.push(index);
            } else {
                failed_count += 1;
            }
            if let Some(sink) = progress {
                sink.on_progress(ProgressEvent::Embedding { current: index + 1, total: texts.len() });
            }
        }

        if vectors.is_empty() && !texts.is_empty() {
            return Err(GlimpseError::model_init_failed("every input produced an invalid vector"));
        }

        Ok(EmbedBatchResult { vectors, success_indices, failed_count })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::cpu()
    }
}
