//! The `Chunk` data model: a contiguous, searchable span of a file.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Distinguishes the code pipeline from the docs pipeline.
///
/// Fixes embedding dimension and chunk-size profile; a chunk never changes
/// class without being destroyed and recreated (see lifecycle notes on
/// `Chunk`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentClass {
    Code,
    Docs,
}

impl ContentClass {
    pub fn embedding_dimension(self) -> usize {
        match self {
            Self::Code => 384,
            Self::Docs => 768,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Docs => "docs",
        }
    }
}

/// A contiguous span of a file, the smallest unit the engine indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable, globally unique, immutable across moves within a file.
    pub id: Uuid,
    /// Repo-relative, forward-slash path.
    pub path: String,
    pub text: String,
    /// 1-based inclusive.
    pub start_line: usize,
    /// 1-based inclusive.
    pub end_line: usize,
    /// File-level hash, identical for every chunk of the same file revision.
    pub content_hash: String,
    /// Position-independent hash of `text` after whitespace normalization.
    pub chunk_hash: String,
    pub symbol: Option<String>,
    pub class: ContentClass,
}

impl Chunk {
    pub fn new(
        path: impl Into<String>,
        text: impl Into<String>,
        start_line: usize,
        end_line: usize,
        content_hash: impl Into<String>,
        class: ContentClass,
    ) -> Self {
        let text = text.into();
        let chunk_hash = chunk_hash(&text);
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            text,
            start_line,
            end_line,
            content_hash: content_hash.into(),
            chunk_hash,
            symbol: None,
            class,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn line_range(&self) -> (usize, usize) {
        (self.start_line, self.end_line)
    }
}

/// Digest of a file's raw bytes. Shared by every chunk of that file.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Digest of a chunk's *normalized* text: whitespace runs collapsed to a
/// single space and surrounding whitespace trimmed, so that the same logical
/// span hashes identically regardless of where it sits in the file. This is
/// what makes `chunkHash` position-independent, which incremental reindex
/// (moved-chunk detection) depends on.
pub fn chunk_hash(text: &str) -> String {
    let normalized: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn chunk_hash_is_position_independent() {
        let a = chunk_hash("fn main() {\n    println!(\"hi\");\n}");
        let b = chunk_hash("fn main() {\n\n    println!(\"hi\");\n\n}");
        assert_eq!(a, b);
    }

    #[test]
    fn chunk_hash_distinguishes_different_text() {
        assert_ne!(chunk_hash("a"), chunk_hash("b"));
    }

    #[test]
    fn content_hash_is_deterministic_and_sha256_length() {
        let h1 = content_hash(b"hello world");
        let h2 = content_hash(b"hello world");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn new_chunk_assigns_a_fresh_uuid_and_class_dimension() {
        let chunk = Chunk::new("src/a.rs", "fn a() {}", 1, 1, "deadbeef", ContentClass::Code);
        assert_eq!(chunk.class.embedding_dimension(), 384);
        assert_ne!(chunk.id, Uuid::nil());
    }
}
