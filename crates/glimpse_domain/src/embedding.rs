//! Deterministic hash-based embedding primitives, shared by every
//! `Embedder` backend so placeholder vectors are produced identically
//! regardless of which crate constructs them (§4.4).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Generate a deterministic embedding from `text`'s hash. Not a real
/// embedding model; used by development/test backends and as the basis for
/// any backend that needs a stable placeholder vector.
pub fn generate_hash_embedding(text: &str, dimension: usize, seed: Option<u64>) -> Vec<f32> {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    if let Some(seed_val) = seed {
        seed_val.hash(&mut hasher);
    }
    let hash = hasher.finish();

    let mut embedding = Vec::with_capacity(dimension);
    let mut current_seed = hash;
    for _ in 0..dimension {
        current_seed = current_seed.wrapping_mul(1103515245).wrapping_add(12345);
        let value = ((current_seed >> 16) as f32) / 65536.0 - 0.5;
        embedding.push(value);
    }
    normalize_vector(&mut embedding);
    embedding
}

pub fn normalize_vector(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

pub fn is_valid_vector(vector: &[f32]) -> bool {
    !vector.is_empty() && vector.iter().all(|x| x.is_finite())
}
