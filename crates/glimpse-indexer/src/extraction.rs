//! Symbol & Complexity Extraction (§4.3): walks the AST to build a
//! `FileSummary`. Falls back to a minimal line-count-only summary on parse
//! failure so the pipeline continues.

use glimpse_domain::summary::{
    ComplexitySummary, ExportInfo, FileSummary, FunctionInfo, ImportInfo, LineCounts, TypeInfo, TypeKind,
    Visibility,
};
use tree_sitter::{Node, Parser};

use crate::chunking::languages::Lang;

const MAX_FILE_SIZE_BYTES: usize = 4 * 1024 * 1024;

/// Builds a `FileSummary` for `content`. Returns `None` only when `content`
/// exceeds the configured max size (§4.3 "exceeds configured max file size
/// => return null"); any other failure degrades to `FileSummary::minimal`.
pub fn summarize(content: &str, path: &str) -> Option<FileSummary> {
    if content.len() > MAX_FILE_SIZE_BYTES {
        return None;
    }

    let lines = line_counts(content, path);
    let ext = std::path::Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or("");
    let Some(lang) = Lang::from_extension(ext) else {
        return Some(FileSummary::minimal(ext, lines));
    };

    let mut parser = Parser::new();
    if parser.set_language(&lang.grammar()).is_err() {
        return Some(FileSummary::minimal(lang.name(), lines));
    }
    let Some(tree) = parser.parse(content, None) else {
        return Some(FileSummary::minimal(lang.name(), lines));
    };
    if tree.root_node().has_error() {
        return Some(FileSummary::minimal(lang.name(), lines));
    }

    let source = content.as_bytes();
    let mut functions = Vec::new();
    let mut types = Vec::new();
    let mut imports = Vec::new();
    let mut exports = Vec::new();
    walk(tree.root_node(), lang, source, &mut functions, &mut types, &mut imports, &mut exports);

    let complexity = ComplexitySummary::from_functions(&functions);
    Some(FileSummary { language: lang.name().to_string(), lines, functions, types, imports, exports, complexity })
}

fn line_counts(content: &str, path: &str) -> LineCounts {
    let comment_prefix = comment_prefix_for(path);
    let mut counts = LineCounts::default();
    for line in content.lines() {
        counts.total += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            counts.blank += 1;
        } else if comment_prefix.map(|p| trimmed.starts_with(p)).unwrap_or(false) {
            counts.comment += 1;
        } else {
            counts.code += 1;
        }
    }
    counts
}

fn comment_prefix_for(path: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(path).extension().and_then(|e| e.to_str())?;
    match ext {
        "py" => Some("#"),
        "rs" | "js" | "ts" | "tsx" | "jsx" | "go" | "java" | "c" | "h" | "cpp" | "cs" => Some("//"),
        _ => None,
    }
}

#[allow(clippy::too_many_arguments)]
fn walk(
    node: Node,
    lang: Lang,
    source: &[u8],
    functions: &mut Vec<FunctionInfo>,
    types: &mut Vec<TypeInfo>,
    imports: &mut Vec<ImportInfo>,
    exports: &mut Vec<ExportInfo>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let kind = child.kind();

        if lang.function_node_kinds().contains(&kind) {
            functions.push(build_function_info(child, lang, source));
        } else if is_type_node(kind, lang) {
            types.push(build_type_info(child, lang, source));
        } else if is_import_node(kind) {
            if let Some(import) = build_import_info(child, source) {
                imports.push(import);
            }
        } else if is_export_node(kind) {
            exports.push(build_export_info(child, source));
        }

        walk(child, lang, source, functions, types, imports, exports);
    }
}

fn is_type_node(kind: &str, _lang: Lang) -> bool {
    matches!(
        kind,
        "struct_item"
            | "enum_item"
            | "trait_item"
            | "class_definition"
            | "class_declaration"
            | "interface_declaration"
            | "type_alias_declaration"
            | "struct_specifier"
            | "struct_declaration"
    )
}

fn is_import_node(kind: &str) -> bool {
    matches!(kind, "use_declaration" | "import_statement" | "import_declaration" | "import_spec")
}

fn is_export_node(kind: &str) -> bool {
    matches!(kind, "export_statement")
}

fn build_function_info(node: Node, lang: Lang, source: &[u8]) -> FunctionInfo {
    let name = text_of(node.child_by_field_name("name"), source).unwrap_or_else(|| "<anonymous>".to_string());
    let start_line = node.start_position().row + 1;
    let end_line = node.end_position().row + 1;
    let signature = text_of(Some(node), source).map(|s| first_line(&s)).unwrap_or_default();
    let is_async = signature.contains("async ");
    let is_static = signature.contains("static ");
    let parameter_count = node
        .child_by_field_name("parameters")
        .map(|params| {
            let mut cursor = params.walk();
            params.children(&mut cursor).filter(|c| c.is_named()).count()
        })
        .unwrap_or(0);
    let return_type = node.child_by_field_name("return_type").and_then(|n| text_of(Some(n), source));
    let docstring = leading_docstring(node, lang, source);

    let mut decision_points = 0u32;
    let mut max_nesting = 0u32;
    count_complexity(node, lang, 0, &mut decision_points, &mut max_nesting);

    FunctionInfo {
        name,
        signature,
        is_async,
        is_static,
        parameter_count,
        return_type,
        parent_class: None,
        decorators: Vec::new(),
        cyclomatic_complexity: 1 + decision_points,
        max_nesting_depth: max_nesting,
        docstring,
        start_line,
        end_line,
    }
}

fn build_type_info(node: Node, _lang: Lang, source: &[u8]) -> TypeInfo {
    let name = text_of(node.child_by_field_name("name"), source).unwrap_or_default();
    let kind = match node.kind() {
        "struct_item" | "struct_specifier" | "struct_declaration" => TypeKind::Struct,
        "enum_item" => TypeKind::Enum,
        "trait_item" => TypeKind::Trait,
        "interface_declaration" => TypeKind::Interface,
        "type_alias_declaration" => TypeKind::TypeAlias,
        _ => TypeKind::Class,
    };
    TypeInfo {
        name,
        kind,
        exported: false,
        visibility: Visibility::Public,
        docstring: None,
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
    }
}

fn build_import_info(node: Node, source: &[u8]) -> Option<ImportInfo> {
    let module = text_of(Some(node), source)?;
    Some(ImportInfo { module: first_line(&module), named: Vec::new(), default_import: None, is_namespace: false })
}

fn build_export_info(node: Node, source: &[u8]) -> ExportInfo {
    let name = text_of(Some(node), source).map(|s| first_line(&s)).unwrap_or_default();
    ExportInfo { name, is_default: name.contains("default"), is_reexport: false, is_namespace: false }
}

fn leading_docstring(node: Node, lang: Lang, source: &[u8]) -> Option<String> {
    // Rust-style `///`/`//!` comments directly preceding the node.
    if lang == Lang::Rust {
        let mut lines = Vec::new();
        let mut sibling = node.prev_sibling();
        while let Some(s) = sibling {
            if s.kind() != "line_comment" {
                break;
            }
            let text = text_of(Some(s), source).unwrap_or_default();
            if !(text.starts_with("///") || text.starts_with("//!")) {
                break;
            }
            lines.push(text.trim_start_matches('/').trim_start_matches('!').trim().to_string());
            sibling = s.prev_sibling();
        }
        if !lines.is_empty() {
            lines.reverse();
            return Some(lines.join("\n"));
        }
    }
    None
}

fn count_complexity(node: Node, lang: Lang, depth: u32, decisions: &mut u32, max_depth: &mut u32) {
    if lang.block_node_kinds().contains(&node.kind()) {
        *max_depth = (*max_depth).max(depth);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if lang.decision_point_kinds().contains(&child.kind()) {
            *decisions += 1;
        }
        let next_depth = if lang.block_node_kinds().contains(&child.kind()) { depth + 1 } else { depth };
        count_complexity(child, lang, next_depth, decisions, max_depth);
    }
}

fn text_of(node: Option<Node>, source: &[u8]) -> Option<String> {
    node?.utf8_text(source).ok().map(str::to_string)
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn oversized_file_returns_none() {
        let huge = "a".repeat(MAX_FILE_SIZE_BYTES + 1);
        assert!(summarize(&huge, "a.rs").is_none());
    }

    #[test]
    fn unsupported_language_returns_minimal_summary() {
        let summary = summarize("hello\nworld\n", "a.txt").unwrap();
        assert!(summary.functions.is_empty());
        assert_eq!(summary.lines.total, 2);
    }

    #[test]
    fn parse_failure_degrades_to_minimal_summary() {
        let summary = summarize("fn a( {{{ garbage", "a.rs").unwrap();
        assert!(summary.functions.is_empty());
    }

    #[test]
    fn extracts_rust_function_with_doc_comment() {
        let source = "/// does a thing\nfn a() {\n    if true {\n        1\n    } else {\n        2\n    }\n}\n";
        let summary = summarize(source, "a.rs").unwrap();
        assert_eq!(summary.functions.len(), 1);
        assert_eq!(summary.functions[0].name, "a");
        assert_eq!(summary.functions[0].docstring.as_deref(), Some("does a thing"));
        assert!(summary.functions[0].cyclomatic_complexity >= 2);
    }
}
