//! Markdown header-aware chunker (§4.2): one chunk per heading section,
//! subdivided with the character splitter when a section is oversized, with
//! sub-chunks tagged by their header ancestry.

use glimpse_domain::{Chunk, ChunkingProfile, ContentClass};

use super::character;

struct Section {
    ancestry: Vec<String>,
    start_line: usize,
    body: String,
}

/// Splits `text` into heading-delimited sections and chunks each one.
pub fn split(path: &str, text: &str, content_hash: &str, profile: &ChunkingProfile) -> Vec<Chunk> {
    let sections = split_into_sections(text);
    let mut chunks = Vec::new();

    for section in sections {
        if section.body.trim().is_empty() {
            continue;
        }
        if section.body.chars().count() <= profile.chunk_size {
            let line_count = section.body.matches('\n').count();
            let mut chunk = Chunk::new(
                path,
                section.body.clone(),
                section.start_line,
                section.start_line + line_count,
                content_hash,
                ContentClass::Docs,
            );
            if let Some(heading) = section.ancestry.last() {
                chunk = chunk.with_symbol(heading.clone());
            }
            chunks.push(chunk);
        } else {
            let mut sub_chunks = character::split(
                path,
                &section.body,
                content_hash,
                ContentClass::Docs,
                profile,
                section.start_line,
            );
            if let Some(heading) = section.ancestry.last() {
                for chunk in &mut sub_chunks {
                    chunk.symbol = Some(heading.clone());
                }
            }
            chunks.extend(sub_chunks);
        }
    }

    chunks
}

/// Walks the document tracking the ancestry stack implied by heading depth
/// (h1..h6), emitting one `Section` per heading (plus a leading section for
/// any content before the first heading).
fn split_into_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut ancestry: Vec<(usize, String)> = Vec::new();
    let mut current_body = String::new();
    let mut current_ancestry: Vec<String> = Vec::new();
    let mut current_start = 1usize;

    for (line_index, line) in text.lines().enumerate() {
        let line_no = line_index + 1;
        if let Some((level, heading)) = parse_heading(line) {
            if !current_body.trim().is_empty() {
                sections.push(Section {
                    ancestry: current_ancestry.clone(),
                    start_line: current_start,
                    body: current_body.clone(),
                });
            }
            ancestry.retain(|(lvl, _)| *lvl < level);
            ancestry.push((level, heading.clone()));
            current_ancestry = ancestry.iter().map(|(_, name)| name.clone()).collect();
            current_body = format!("{line}\n");
            current_start = line_no;
        } else {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }
    if !current_body.trim().is_empty() {
        sections.push(Section { ancestry: current_ancestry, start_line: current_start, body: current_body });
    }
    sections
}

fn parse_heading(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = trimmed[level..].trim();
    if rest.is_empty() && trimmed.len() == level {
        return None;
    }
    Some((level, rest.to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn one_chunk_per_heading_section() {
        let text = "# Title\nintro text\n\n## Sub\nsub body\n";
        let profile = ChunkingProfile::docs();
        let chunks = split("README.md", text, "h", &profile);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].symbol.as_deref(), Some("Title"));
        assert_eq!(chunks[1].symbol.as_deref(), Some("Sub"));
    }

    #[test]
    fn oversized_section_is_subdivided_and_keeps_heading_tag() {
        let mut profile = ChunkingProfile::docs();
        profile.chunk_size = 20;
        let body = "word ".repeat(20);
        let text = format!("# Big\n{body}");
        let chunks = split("README.md", &text, "h", &profile);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.symbol.as_deref(), Some("Big"));
        }
    }
}
