//! Per-language tree-sitter metadata shared by the AST chunker (§4.2) and
//! the symbol/complexity extractor (§4.3): which grammar to load, which
//! node kinds count as a top-level symbol, and which count as a decision
//! point for cyclomatic complexity.

use tree_sitter::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    /// `.tsx`/`.jsx`: same surface language as JS/TS but parsed under the
    /// TSX grammar, which understands JSX element syntax the plain
    /// TypeScript grammar rejects (`root_node().has_error()`).
    Tsx,
    Go,
    Java,
    Cpp,
    CSharp,
}

impl Lang {
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext {
            "rs" => Self::Rust,
            "py" => Self::Python,
            "js" | "mjs" | "cjs" => Self::JavaScript,
            "ts" => Self::TypeScript,
            "jsx" | "tsx" => Self::Tsx,
            "go" => Self::Go,
            "java" => Self::Java,
            "c" | "h" | "cpp" | "hpp" | "cc" | "cxx" => Self::Cpp,
            "cs" => Self::CSharp,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Go => "go",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
        }
    }

    pub fn grammar(self) -> Language {
        match self {
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::JavaScript | Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Go => tree_sitter_go::LANGUAGE.into(),
            Self::Java => tree_sitter_java::LANGUAGE.into(),
            Self::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            Self::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
        }
    }

    /// Node kinds treated as a chunkable top-level symbol: function, method,
    /// class, type, impl-block.
    pub fn symbol_node_kinds(self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["function_item", "struct_item", "enum_item", "trait_item", "impl_item", "mod_item"],
            Self::Python => &["function_definition", "class_definition"],
            Self::JavaScript | Self::TypeScript | Self::Tsx => &[
                "function_declaration",
                "method_definition",
                "class_declaration",
                "interface_declaration",
                "type_alias_declaration",
            ],
            Self::Go => &["function_declaration", "method_declaration", "type_declaration"],
            Self::Java => &["method_declaration", "class_declaration", "interface_declaration", "enum_declaration"],
            Self::Cpp => &["function_definition", "class_specifier", "struct_specifier"],
            Self::CSharp => &["method_declaration", "class_declaration", "interface_declaration", "struct_declaration"],
        }
    }

    /// Node kinds that each add one decision point (§4.3: conditionals,
    /// loops, switches, catch, ternary, logical `&&`/`||`/`and`/`or`).
    pub fn decision_point_kinds(self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["if_expression", "while_expression", "for_expression", "match_arm", "&&", "||"],
            Self::Python => &["if_statement", "while_statement", "for_statement", "except_clause", "boolean_operator", "conditional_expression"],
            Self::JavaScript | Self::TypeScript | Self::Tsx => &[
                "if_statement",
                "while_statement",
                "for_statement",
                "for_in_statement",
                "switch_case",
                "catch_clause",
                "ternary_expression",
                "&&",
                "||",
            ],
            Self::Go => &["if_statement", "for_statement", "expression_case", "type_case"],
            Self::Java | Self::CSharp => &[
                "if_statement",
                "while_statement",
                "for_statement",
                "switch_label",
                "catch_clause",
                "ternary_expression",
                "&&",
                "||",
            ],
            Self::Cpp => &["if_statement", "while_statement", "for_statement", "case_statement", "catch_clause", "&&", "||"],
        }
    }

    /// Node kinds that introduce a new nested block for nesting-depth
    /// measurement.
    pub fn block_node_kinds(self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["block"],
            Self::Python => &["block"],
            Self::JavaScript | Self::TypeScript | Self::Tsx => &["statement_block"],
            Self::Go => &["block"],
            Self::Java | Self::CSharp => &["block"],
            Self::Cpp => &["compound_statement"],
        }
    }

    pub fn function_node_kinds(self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["function_item"],
            Self::Python => &["function_definition"],
            Self::JavaScript | Self::TypeScript | Self::Tsx => &["function_declaration", "method_definition", "arrow_function"],
            Self::Go => &["function_declaration", "method_declaration"],
            Self::Java | Self::CSharp => &["method_declaration"],
            Self::Cpp => &["function_definition"],
        }
    }
}
