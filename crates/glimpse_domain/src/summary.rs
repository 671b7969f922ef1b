//! `FileSummary`: the output of symbol & complexity extraction (§4.3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineCounts {
    pub total: usize,
    pub code: usize,
    pub blank: usize,
    pub comment: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub signature: String,
    pub is_async: bool,
    pub is_static: bool,
    pub parameter_count: usize,
    pub return_type: Option<String>,
    pub parent_class: Option<String>,
    pub decorators: Vec<String>,
    pub cyclomatic_complexity: u32,
    pub max_nesting_depth: u32,
    pub docstring: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    pub kind: TypeKind,
    pub exported: bool,
    pub visibility: Visibility,
    pub docstring: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Enum,
    Trait,
    TypeAlias,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Crate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportInfo {
    pub module: String,
    pub named: Vec<String>,
    pub default_import: Option<String>,
    pub is_namespace: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportInfo {
    pub name: String,
    pub is_default: bool,
    pub is_reexport: bool,
    pub is_namespace: bool,
}

/// Aggregate complexity over every function in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexitySummary {
    pub sum_cyclomatic: u32,
    pub avg_cyclomatic: f32,
    pub max_nesting: u32,
    pub decision_point_count: u32,
    /// 0-100, derived from fixed thresholds over the above.
    pub overall_score: u8,
}

impl ComplexitySummary {
    pub fn from_functions(functions: &[FunctionInfo]) -> Self {
        if functions.is_empty() {
            return Self::default();
        }
        let sum_cyclomatic: u32 = functions.iter().map(|f| f.cyclomatic_complexity).sum();
        let max_nesting = functions.iter().map(|f| f.max_nesting_depth).max().unwrap_or(0);
        // decision points = cyclomatic complexity - 1 per function (§4.3).
        let decision_point_count: u32 =
            functions.iter().map(|f| f.cyclomatic_complexity.saturating_sub(1)).sum();
        let avg_cyclomatic = sum_cyclomatic as f32 / functions.len() as f32;

        // Threshold-derived 0-100 score: penalize both average and the
        // single worst function, capped at 100.
        let avg_component = (avg_cyclomatic * 6.0).min(60.0);
        let max_component =
            (functions.iter().map(|f| f.cyclomatic_complexity).max().unwrap_or(0) as f32 * 2.0)
                .min(40.0);
        let overall_score = (avg_component + max_component).round().min(100.0) as u8;

        Self { sum_cyclomatic, avg_cyclomatic, max_nesting, decision_point_count, overall_score }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub language: String,
    pub lines: LineCounts,
    pub functions: Vec<FunctionInfo>,
    pub types: Vec<TypeInfo>,
    pub imports: Vec<ImportInfo>,
    pub exports: Vec<ExportInfo>,
    pub complexity: ComplexitySummary,
}

impl FileSummary {
    /// A minimal summary with only line counts — returned when the parser
    /// fails so the pipeline can continue (§4.3 "Parse failure").
    pub fn minimal(language: impl Into<String>, lines: LineCounts) -> Self {
        Self {
            language: language.into(),
            lines,
            functions: Vec::new(),
            types: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            complexity: ComplexitySummary::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn function(cyclomatic: u32, nesting: u32) -> FunctionInfo {
        FunctionInfo {
            name: "f".into(),
            signature: "fn f()".into(),
            is_async: false,
            is_static: false,
            parameter_count: 0,
            return_type: None,
            parent_class: None,
            decorators: vec![],
            cyclomatic_complexity: cyclomatic,
            max_nesting_depth: nesting,
            docstring: None,
            start_line: 1,
            end_line: 2,
        }
    }

    #[test]
    fn empty_functions_yield_zeroed_complexity() {
        let summary = ComplexitySummary::from_functions(&[]);
        assert_eq!(summary, ComplexitySummary::default());
    }

    #[test]
    fn aggregate_picks_up_max_nesting_and_decision_points() {
        let functions = vec![function(3, 2), function(5, 4)];
        let summary = ComplexitySummary::from_functions(&functions);
        assert_eq!(summary.sum_cyclomatic, 8);
        assert_eq!(summary.max_nesting, 4);
        assert_eq!(summary.decision_point_count, 2 + 4);
    }

    #[test]
    fn minimal_summary_has_no_functions() {
        let summary =
            FileSummary::minimal("rust", LineCounts { total: 10, code: 8, blank: 2, comment: 0 });
        assert!(summary.functions.is_empty());
        assert_eq!(summary.lines.total, 10);
    }
}
