//! Development-grade `ChunkStore` backend: an in-memory map keyed by path
//! and by chunk id. No persistence; meant for tests and for running the
//! engine without a real vector database configured.

use std::collections::HashMap;

use async_trait::async_trait;
use glimpse_domain::traits::{ChunkRecord, ChunkStore, StoredChunk};
use glimpse_domain::{GlimpseError, Result};
use uuid::Uuid;

struct Entry {
    record: ChunkRecord,
}

/// In-memory `ChunkStore`. Vector dimension is fixed at construction and
/// every inserted vector must match it (§6 "ChunkStore").
pub struct InMemoryChunkStore {
    dimension: usize,
    opened: bool,
    by_path: HashMap<String, Vec<Uuid>>,
    chunks: HashMap<Uuid, Entry>,
}

impl InMemoryChunkStore {
    pub fn new(dimension: usize) -> Self {
        Self { dimension, opened: false, by_path: HashMap::new(), chunks: HashMap::new() }
    }

    fn require_open(&self) -> Result<()> {
        if self.opened {
            Ok(())
        } else {
            Err(GlimpseError::internal("chunk store used before open()"))
        }
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn open(&mut self) -> Result<()> {
        self.opened = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.opened = false;
        Ok(())
    }

    async fn delete(&mut self) -> Result<()> {
        self.by_path.clear();
        self.chunks.clear();
        Ok(())
    }

    async fn insert_chunks(&mut self, records: Vec<ChunkRecord>) -> Result<()> {
        self.require_open()?;
        for record in records {
            if record.vector.len() != self.dimension {
                return Err(GlimpseError::dimension_mismatch(self.dimension, record.vector.len()));
            }
            // The caller's id is authoritative: it must survive round-trips
            // unchanged so incremental reindex can diff against it.
            let id = record.chunk.id;
            let path = record.chunk.path.clone();
            let siblings = self.by_path.entry(path).or_default();
            if !siblings.contains(&id) {
                siblings.push(id);
            }
            self.chunks.insert(id, Entry { record });
        }
        Ok(())
    }

    async fn delete_by_path(&mut self, rel_path: &str) -> Result<()> {
        self.require_open()?;
        if let Some(ids) = self.by_path.remove(rel_path) {
            for id in ids {
                self.chunks.remove(&id);
            }
        }
        Ok(())
    }

    async fn delete_by_ids(&mut self, ids: &[Uuid]) -> Result<()> {
        self.require_open()?;
        for id in ids {
            if let Some(entry) = self.chunks.remove(id) {
                if let Some(siblings) = self.by_path.get_mut(&entry.record.chunk.path) {
                    siblings.retain(|sibling| sibling != id);
                }
            }
        }
        Ok(())
    }

    async fn count_files(&self) -> Result<usize> {
        Ok(self.by_path.iter().filter(|(_, ids)| !ids.is_empty()).count())
    }

    async fn count_chunks(&self) -> Result<usize> {
        Ok(self.chunks.len())
    }

    async fn storage_size_bytes(&self) -> Result<u64> {
        let bytes: usize = self
            .chunks
            .values()
            .map(|entry| entry.record.chunk.text.len() + entry.record.vector.len() * 4)
            .sum();
        Ok(bytes as u64)
    }

    async fn has_data(&self) -> Result<bool> {
        Ok(!self.chunks.is_empty())
    }

    async fn list_chunks_by_path(&self, rel_path: &str) -> Result<Vec<StoredChunk>> {
        let Some(ids) = self.by_path.get(rel_path) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| self.chunks.get(id))
            .map(|entry| StoredChunk {
                id: entry.record.chunk.id,
                text: entry.record.chunk.text.clone(),
                vector: entry.record.vector.clone(),
                start_line: entry.record.chunk.start_line,
                end_line: entry.record.chunk.end_line,
                content_hash: entry.record.chunk.content_hash.clone(),
                chunk_hash: entry.record.chunk.chunk_hash.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use glimpse_domain::{Chunk, ContentClass};
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(path: &str, text: &str) -> ChunkRecord {
        let chunk = Chunk::new(path, text, 1, 1, "hash", ContentClass::Code);
        ChunkRecord { chunk, vector: vec![0.0; 384] }
    }

    #[tokio::test]
    async fn rejects_use_before_open() {
        let mut store = InMemoryChunkStore::new(384);
        let err = store.insert_chunks(vec![record("a.rs", "x")]).await.unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL");
    }

    #[tokio::test]
    async fn insert_preserves_caller_assigned_id() {
        let mut store = InMemoryChunkStore::new(384);
        store.open().await.unwrap();
        let rec = record("a.rs", "fn a() {}");
        let id = rec.chunk.id;
        store.insert_chunks(vec![rec]).await.unwrap();

        let stored = store.list_chunks_by_path("a.rs").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
    }

    #[tokio::test]
    async fn reinserting_same_id_does_not_duplicate_in_path_index() {
        let mut store = InMemoryChunkStore::new(384);
        store.open().await.unwrap();
        let rec = record("a.rs", "fn a() {}");
        let id = rec.chunk.id;
        store.insert_chunks(vec![rec.clone()]).await.unwrap();
        store.insert_chunks(vec![rec]).await.unwrap();

        let stored = store.list_chunks_by_path("a.rs").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let mut store = InMemoryChunkStore::new(384);
        store.open().await.unwrap();
        let mut rec = record("a.rs", "x");
        rec.vector = vec![0.0; 10];
        let err = store.insert_chunks(vec![rec]).await.unwrap_err();
        assert_eq!(err.error_code(), "DIMENSION_MISMATCH");
    }

    #[tokio::test]
    async fn delete_by_path_removes_all_its_chunks() {
        let mut store = InMemoryChunkStore::new(384);
        store.open().await.unwrap();
        store
            .insert_chunks(vec![record("a.rs", "one"), record("a.rs", "two"), record("b.rs", "three")])
            .await
            .unwrap();
        assert_eq!(store.count_chunks().await.unwrap(), 3);

        store.delete_by_path("a.rs").await.unwrap();
        assert_eq!(store.count_chunks().await.unwrap(), 1);
        assert_eq!(store.count_files().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_clears_everything() {
        let mut store = InMemoryChunkStore::new(384);
        store.open().await.unwrap();
        store.insert_chunks(vec![record("a.rs", "one")]).await.unwrap();
        store.delete().await.unwrap();
        assert!(!store.has_data().await.unwrap());
    }
}
