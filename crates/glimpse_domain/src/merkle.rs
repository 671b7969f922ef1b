//! Merkle DAG data model (§4.5) and its on-disk snapshot shape (§6).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One indexed chunk's entry in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkNode {
    pub id: Uuid,
    pub file_path: String,
    pub chunk_hash: String,
    pub content_hash: String,
    pub start_line: usize,
    pub end_line: usize,
    pub symbol_kind: Option<String>,
    pub symbol_name: Option<String>,
}

/// One indexed file's entry in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub size: u64,
    pub mtime: DateTime<Utc>,
    pub content_hash: String,
    pub chunk_order: Vec<Uuid>,
    /// `H(chunkHash_1 || ... || chunkHash_n)` in `chunk_order`.
    pub file_hash: String,
}

impl FileNode {
    /// Recompute `file_hash` from a list of chunk hashes in `chunk_order`,
    /// for invariant-checking and snapshot construction.
    pub fn compute_file_hash(chunk_hashes: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for hash in chunk_hashes {
            hasher.update(hash.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Invariant from §3: recomputing `fileHash` from the current chunks
    /// must yield the stored value.
    pub fn verify(&self, chunk_hashes_in_order: &[&str]) -> bool {
        Self::compute_file_hash(chunk_hashes_in_order) == self.file_hash
    }
}

/// `H(sorted(path:fileHash)*)` — unchanged root implies every file
/// unchanged (the Merkle DAG's "fast path" invariant).
pub fn project_root_hash<'a>(files: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut sorted: BTreeMap<&str, &str> = BTreeMap::new();
    for (path, file_hash) in files {
        sorted.insert(path, file_hash);
    }
    let mut hasher = Sha256::new();
    for (path, file_hash) in sorted {
        hasher.update(path.as_bytes());
        hasher.update(b":");
        hasher.update(file_hash.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// The result of comparing two project snapshots (§4.5 "Diff algorithm").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
    /// Files whose content hash is unchanged but whose file hash differs —
    /// these need a chunk-level diff, not a full-file replace.
    pub chunk_level: Vec<String>,
}

impl ProjectDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.chunk_level.is_empty()
    }
}

/// Per-file chunk diff (§4.5 step 5).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDiff {
    pub added: Vec<Uuid>,
    pub modified: Vec<Uuid>,
    pub removed: Vec<Uuid>,
    /// Same hash, different position index: vector is reused.
    pub moved: Vec<Uuid>,
}

/// The persisted `merkle-tree.json` shape from §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleSnapshot {
    pub version: String,
    pub root_hash: String,
    pub last_updated: DateTime<Utc>,
    pub files: BTreeMap<String, FileNode>,
    pub chunks: BTreeMap<Uuid, ChunkNode>,
}

impl MerkleSnapshot {
    pub const CURRENT_VERSION: &'static str = "1.0.0";

    pub fn empty() -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
            root_hash: project_root_hash(std::iter::empty()),
            last_updated: Utc::now(),
            files: BTreeMap::new(),
            chunks: BTreeMap::new(),
        }
    }

    pub fn recompute_root_hash(&mut self) {
        let pairs: Vec<(&str, &str)> =
            self.files.iter().map(|(p, f)| (p.as_str(), f.file_hash.as_str())).collect();
        self.root_hash = project_root_hash(pairs.into_iter());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn unchanged_root_hash_implies_no_diff_needed() {
        let files = [("a.rs", "h1"), ("b.rs", "h2")];
        let h1 = project_root_hash(files.iter().copied());
        let h2 = project_root_hash(files.iter().rev().copied());
        assert_eq!(h1, h2, "root hash must be order-independent (sorted before hashing)");
    }

    #[test]
    fn file_node_verify_detects_tampering() {
        let hashes = ["a", "b", "c"];
        let file_hash = FileNode::compute_file_hash(&hashes);
        let node = FileNode {
            path: "x.rs".into(),
            size: 10,
            mtime: Utc::now(),
            content_hash: "deadbeef".into(),
            chunk_order: vec![],
            file_hash,
        };
        assert!(node.verify(&hashes));
        assert!(!node.verify(&["a", "b", "different"]));
    }

    #[test]
    fn empty_snapshot_round_trips_through_json() {
        let snapshot = MerkleSnapshot::empty();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MerkleSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot.root_hash, back.root_hash);
        assert_eq!(snapshot.version, MerkleSnapshot::CURRENT_VERSION);
    }
}
