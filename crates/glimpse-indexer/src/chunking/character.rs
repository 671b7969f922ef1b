//! Character-based recursive splitter (§4.2): greedy split on the earliest
//! separator that yields parts within `chunk_size`, with runt pieces merged
//! into neighbors so consecutive chunks share `chunk_overlap` characters.

use glimpse_domain::{Chunk, ChunkingProfile, ContentClass};

/// Splits `text` into line-numbered spans honoring `profile`. `start_line`
/// lets callers offset line numbers when splitting a sub-region (used by
/// the markdown chunker for oversized sections).
pub fn split(
    path: &str,
    text: &str,
    content_hash: &str,
    class: ContentClass,
    profile: &ChunkingProfile,
    start_line: usize,
) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let pieces = recursive_split(text, &profile.separators, profile.chunk_size);
    let merged = merge_with_overlap(pieces, profile.chunk_overlap);

    let mut chunks = Vec::with_capacity(merged.len());
    let mut line_cursor = start_line;
    for piece in merged {
        if piece.trim().is_empty() {
            line_cursor += piece.matches('\n').count();
            continue;
        }
        let line_count = piece.matches('\n').count();
        let begin = line_cursor;
        let end = line_cursor + line_count;
        chunks.push(Chunk::new(path, piece, begin, end.max(begin), content_hash, class));
        line_cursor = end.max(begin);
    }
    chunks
}

/// Recursively splits `text` on the first separator (in order) that brings
/// every resulting part within `chunk_size`. An empty separator means
/// "split on raw character boundaries" — the last-resort fallback.
fn recursive_split(text: &str, separators: &[String], chunk_size: usize) -> Vec<String> {
    if text.chars().count() <= chunk_size {
        return vec![text.to_string()];
    }

    for (index, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return hard_split(text, chunk_size);
        }
        if !text.contains(separator.as_str()) {
            continue;
        }
        let parts: Vec<&str> = text.split(separator.as_str()).collect();
        if parts.len() < 2 {
            continue;
        }

        let mut out = Vec::new();
        let mut buffer = String::new();
        for part in parts {
            let candidate =
                if buffer.is_empty() { part.to_string() } else { format!("{buffer}{separator}{part}") };
            if candidate.chars().count() <= chunk_size {
                buffer = candidate;
            } else {
                if !buffer.is_empty() {
                    out.push(buffer);
                }
                if part.chars().count() > chunk_size {
                    out.extend(recursive_split(part, &separators[index + 1..], chunk_size));
                    buffer = String::new();
                } else {
                    buffer = part.to_string();
                }
            }
        }
        if !buffer.is_empty() {
            out.push(buffer);
        }
        return out;
    }

    hard_split(text, chunk_size)
}

fn hard_split(text: &str, chunk_size: usize) -> Vec<String> {
    text.chars()
        .collect::<Vec<_>>()
        .chunks(chunk_size.max(1))
        .map(|chars| chars.iter().collect())
        .collect()
}

/// Merges adjacent pieces so each chunk after the first is prefixed with up
/// to `overlap` trailing characters of its predecessor.
fn merge_with_overlap(pieces: Vec<String>, overlap: usize) -> Vec<String> {
    if overlap == 0 || pieces.len() < 2 {
        return pieces;
    }
    let mut out = Vec::with_capacity(pieces.len());
    let mut previous: Option<String> = None;
    for piece in pieces {
        let merged = match previous {
            Some(ref prev) => {
                let tail: String = prev.chars().rev().take(overlap).collect::<Vec<_>>().into_iter().rev().collect();
                format!("{tail}{piece}")
            }
            None => piece.clone(),
        };
        out.push(merged);
        previous = Some(piece);
    }
    out
}
