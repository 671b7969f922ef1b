//! AST-based code chunker (§4.2): prefers symbol-aligned boundaries
//! (function, method, class, type, impl-block), falling back to the
//! character splitter when the parse fails or the language is unsupported.

use glimpse_domain::{Chunk, ChunkingProfile, ContentClass};
use tree_sitter::{Node, Parser};

use super::character;
use super::languages::Lang;

/// Chunks `content` for `path`, dispatching on file extension. Returns
/// `None` when the language isn't one of the supported AST grammars, so the
/// caller can fall back to the character splitter (§9 "exceptions for flow
/// control" → explicit fallback with recorded reason).
pub fn split(
    path: &str,
    content: &str,
    content_hash: &str,
    profile: &ChunkingProfile,
) -> Option<Vec<Chunk>> {
    let ext = std::path::Path::new(path).extension()?.to_str()?;
    let lang = Lang::from_extension(ext)?;

    let mut parser = Parser::new();
    parser.set_language(&lang.grammar()).ok()?;
    let tree = parser.parse(content, None)?;
    if tree.root_node().has_error() {
        return None;
    }

    let mut spans = Vec::new();
    collect_symbol_spans(tree.root_node(), lang, content.as_bytes(), &mut spans);
    if spans.is_empty() {
        return None;
    }
    spans.sort_by_key(|span| span.start_byte);

    let mut chunks = Vec::new();
    let mut cursor = 0usize;
    for span in spans {
        if span.start_byte < cursor {
            continue;
        }
        // Untouched gap between symbols (imports, module-level statements)
        // falls to the character splitter so nothing is dropped.
        if span.start_byte > cursor {
            let gap = &content[cursor..span.start_byte];
            chunks.extend(character::split(
                path,
                gap,
                content_hash,
                ContentClass::Code,
                profile,
                line_of(content, cursor),
            ));
        }

        let text = &content[span.start_byte..span.end_byte];
        let start_line = line_of(content, span.start_byte);
        let end_line = line_of(content, span.end_byte);

        if text.chars().count() <= profile.chunk_size {
            let mut chunk = Chunk::new(path, text, start_line, end_line, content_hash, ContentClass::Code);
            if let Some(name) = span.name {
                chunk = chunk.with_symbol(name);
            }
            chunks.push(chunk);
        } else {
            let mut sub_chunks =
                character::split(path, text, content_hash, ContentClass::Code, profile, start_line);
            if let Some(name) = span.name {
                for chunk in &mut sub_chunks {
                    chunk.symbol = Some(name.clone());
                }
            }
            chunks.extend(sub_chunks);
        }
        cursor = span.end_byte;
    }

    if cursor < content.len() {
        let gap = &content[cursor..];
        chunks.extend(character::split(
            path,
            gap,
            content_hash,
            ContentClass::Code,
            profile,
            line_of(content, cursor),
        ));
    }

    Some(chunks)
}

struct SymbolSpan {
    start_byte: usize,
    end_byte: usize,
    name: Option<String>,
}

/// Collects top-level (non-nested) symbol nodes: once a symbol node is
/// found, its children are not descended into, so nested functions inside a
/// class body don't produce duplicate overlapping chunks.
fn collect_symbol_spans(node: Node, lang: Lang, source: &[u8], out: &mut Vec<SymbolSpan>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if lang.symbol_node_kinds().contains(&child.kind()) {
            out.push(SymbolSpan {
                start_byte: child.start_byte(),
                end_byte: child.end_byte(),
                name: extract_name(child, source),
            });
        } else {
            collect_symbol_spans(child, lang, source, out);
        }
    }
}

fn extract_name(node: Node, source: &[u8]) -> Option<String> {
    let name_node = node.child_by_field_name("name")?;
    name_node.utf8_text(source).ok().map(str::to_string)
}

fn line_of(content: &str, byte_offset: usize) -> usize {
    content[..byte_offset.min(content.len())].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn splits_rust_functions_into_symbol_chunks() {
        let content = "fn a() {\n    1\n}\n\nfn b() {\n    2\n}\n";
        let profile = ChunkingProfile::code();
        let chunks = split("a.rs", content, "h", &profile).expect("rust should parse");
        let symbols: Vec<_> = chunks.iter().filter_map(|c| c.symbol.clone()).collect();
        assert!(symbols.contains(&"a".to_string()));
        assert!(symbols.contains(&"b".to_string()));
    }

    #[test]
    fn unsupported_extension_returns_none() {
        let profile = ChunkingProfile::code();
        assert!(split("a.xyz", "whatever", "h", &profile).is_none());
    }

    #[test]
    fn malformed_source_returns_none_so_caller_falls_back() {
        let profile = ChunkingProfile::code();
        assert!(split("a.rs", "fn a( {{{ not valid rust at all", "h", &profile).is_none());
    }
}
