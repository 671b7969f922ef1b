//! Builds and diffs `MerkleSnapshot`s from indexed files and chunks (§4.5).

use glimpse_domain::merkle::{ChunkDiff, ChunkNode, FileNode, MerkleSnapshot, ProjectDiff};
use glimpse_domain::{Chunk, project_root_hash};
use uuid::Uuid;

/// One file's worth of freshly produced chunks, ready to fold into a
/// snapshot.
pub struct FileEntry {
    pub path: String,
    pub size: u64,
    pub mtime: chrono::DateTime<chrono::Utc>,
    pub content_hash: String,
    pub chunks: Vec<Chunk>,
}

/// Rebuilds the `FileNode`/`ChunkNode` entries for one file and returns them
/// without mutating `snapshot` (the caller commits via `apply`).
pub fn build_file_node(entry: &FileEntry) -> (FileNode, Vec<ChunkNode>) {
    let chunk_hashes: Vec<&str> = entry.chunks.iter().map(|c| c.chunk_hash.as_str()).collect();
    let file_hash = FileNode::compute_file_hash(&chunk_hashes);
    let chunk_order: Vec<Uuid> = entry.chunks.iter().map(|c| c.id).collect();

    let file_node = FileNode {
        path: entry.path.clone(),
        size: entry.size,
        mtime: entry.mtime,
        content_hash: entry.content_hash.clone(),
        chunk_order,
        file_hash,
    };

    let chunk_nodes = entry
        .chunks
        .iter()
        .map(|chunk| ChunkNode {
            id: chunk.id,
            file_path: entry.path.clone(),
            chunk_hash: chunk.chunk_hash.clone(),
            content_hash: chunk.content_hash.clone(),
            start_line: chunk.start_line,
            end_line: chunk.end_line,
            symbol_kind: None,
            symbol_name: chunk.symbol.clone(),
        })
        .collect();

    (file_node, chunk_nodes)
}

/// Replaces one file's entry (and its chunk nodes) in `snapshot` and
/// recomputes the root hash.
pub fn apply(snapshot: &mut MerkleSnapshot, entry: &FileEntry) {
    let (file_node, chunk_nodes) = build_file_node(entry);
    if let Some(old) = snapshot.files.get(&entry.path) {
        for id in &old.chunk_order {
            snapshot.chunks.remove(id);
        }
    }
    for node in chunk_nodes {
        snapshot.chunks.insert(node.id, node);
    }
    snapshot.files.insert(entry.path.clone(), file_node);
    snapshot.recompute_root_hash();
}

/// Removes a file's entry (and its chunk nodes) from `snapshot`.
pub fn remove(snapshot: &mut MerkleSnapshot, path: &str) {
    if let Some(old) = snapshot.files.remove(path) {
        for id in &old.chunk_order {
            snapshot.chunks.remove(id);
        }
    }
    snapshot.recompute_root_hash();
}

/// Full project diff between two snapshots (§4.5 diff algorithm). Fast path:
/// equal root hashes mean zero diff without inspecting a single file.
pub fn diff(old: &MerkleSnapshot, new: &MerkleSnapshot) -> ProjectDiff {
    if old.root_hash == new.root_hash {
        return ProjectDiff::default();
    }

    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut modified = Vec::new();
    let mut chunk_level = Vec::new();

    for (path, new_file) in &new.files {
        match old.files.get(path) {
            None => added.push(path.clone()),
            Some(old_file) if old_file.content_hash != new_file.content_hash => modified.push(path.clone()),
            Some(old_file) if old_file.file_hash != new_file.file_hash => chunk_level.push(path.clone()),
            _ => {}
        }
    }
    for path in old.files.keys() {
        if !new.files.contains_key(path) {
            removed.push(path.clone());
        }
    }

    added.sort();
    removed.sort();
    modified.sort();
    chunk_level.sort();
    ProjectDiff { added, removed, modified, chunk_level }
}

/// Chunk-level diff for one file flagged in `ProjectDiff::chunk_level`
/// (same content hash, different file hash — §4.5 step 4).
pub fn diff_chunks_for_path(old: &MerkleSnapshot, new: &MerkleSnapshot, path: &str) -> Option<ChunkDiff> {
    let old_file = old.files.get(path)?;
    let new_file = new.files.get(path)?;
    Some(diff_chunks(old, old_file, new, new_file))
}

fn diff_chunks(
    old: &MerkleSnapshot,
    old_file: &FileNode,
    new: &MerkleSnapshot,
    new_file: &FileNode,
) -> ChunkDiff {
    let old_ids: std::collections::HashSet<Uuid> = old_file.chunk_order.iter().copied().collect();
    let new_ids: std::collections::HashSet<Uuid> = new_file.chunk_order.iter().copied().collect();

    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut moved = Vec::new();

    for (index, id) in new_file.chunk_order.iter().enumerate() {
        if !old_ids.contains(id) {
            added.push(*id);
            continue;
        }
        let old_node = &old.chunks[id];
        let new_node = &new.chunks[id];
        if old_node.chunk_hash != new_node.chunk_hash {
            modified.push(*id);
        } else if old_file.chunk_order.iter().position(|i| i == id) != Some(index) {
            moved.push(*id);
        }
    }

    let removed: Vec<Uuid> = old_file.chunk_order.iter().filter(|id| !new_ids.contains(id)).copied().collect();

    ChunkDiff { added, modified, removed, moved }
}

/// Recomputes the aggregate root hash from a snapshot's files (exposed for
/// callers that build a snapshot incrementally outside `apply`).
pub fn root_hash_of(snapshot: &MerkleSnapshot) -> String {
    project_root_hash(snapshot.files.iter().map(|(path, node)| (path.as_str(), node.file_hash.as_str())))
}
