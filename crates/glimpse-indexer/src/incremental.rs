//! Incremental Reindex (§4.7): reuses vectors for unchanged or merely-moved
//! chunks instead of re-embedding a whole file on every edit.

use std::collections::HashMap;

use glimpse_domain::traits::StoredChunk;
use glimpse_domain::{Chunk, GlimpseConfig};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum ChunkPlan {
    /// Existing chunk unchanged: same hash, same span. Nothing to do.
    Unchanged { id: Uuid },
    /// Existing chunk moved: same hash, different span. Vector is reused;
    /// only position/content-hash are updated.
    Moved { id: Uuid, vector: Vec<f32>, new_chunk: Chunk },
    /// No matching existing chunk: needs a fresh embedding.
    Added { new_chunk: Chunk },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReindexPlan {
    pub unchanged: Vec<Uuid>,
    pub moved: Vec<(Uuid, Vec<f32>, Chunk)>,
    pub added: Vec<Chunk>,
    pub removed: Vec<Uuid>,
}

impl ReindexPlan {
    pub fn saved_embedding_ratio(&self, new_chunk_count: usize) -> f32 {
        if new_chunk_count == 0 {
            return 0.0;
        }
        let reused = self.unchanged.len() + self.moved.len();
        reused as f32 / new_chunk_count as f32
    }
}

/// Builds a `ReindexPlan` for one file's newly chunked content against its
/// previously stored chunks (§4.7 steps 1-3).
pub fn plan(existing: &[StoredChunk], new_chunks: &[Chunk]) -> ReindexPlan {
    let mut by_hash: HashMap<&str, Vec<&StoredChunk>> = HashMap::new();
    for stored in existing {
        by_hash.entry(stored.chunk_hash.as_str()).or_default().push(stored);
    }

    let mut plan = ReindexPlan::default();
    let mut matched: std::collections::HashSet<Uuid> = std::collections::HashSet::new();

    for new_chunk in new_chunks {
        let candidates = by_hash.get_mut(new_chunk.chunk_hash.as_str());
        let matched_existing = candidates.and_then(|list| {
            let index = list.iter().position(|stored| !matched.contains(&stored.id));
            index.map(|i| list.remove(i))
        });

        match matched_existing {
            Some(stored) => {
                matched.insert(stored.id);
                if stored.start_line == new_chunk.start_line && stored.end_line == new_chunk.end_line {
                    plan.unchanged.push(stored.id);
                } else {
                    let mut moved_chunk = new_chunk.clone();
                    moved_chunk.id = stored.id;
                    plan.moved.push((stored.id, stored.vector.clone(), moved_chunk));
                }
            }
            None => plan.added.push(new_chunk.clone()),
        }
    }

    plan.removed = existing.iter().filter(|stored| !matched.contains(&stored.id)).map(|s| s.id).collect();
    plan
}

/// Heuristic gate (§4.7): use incremental reindex only when the old chunk
/// count clears a minimum and the saved-embedding ratio clears a minimum;
/// otherwise a full replace is cheaper to reason about.
pub fn should_use_incremental(existing_count: usize, plan: &ReindexPlan, config: &GlimpseConfig) -> bool {
    if existing_count < config.processing.incremental_min_chunk_count {
        return false;
    }
    let new_count = plan.unchanged.len() + plan.moved.len() + plan.added.len();
    plan.saved_embedding_ratio(new_count) >= config.processing.incremental_min_saved_ratio
}
