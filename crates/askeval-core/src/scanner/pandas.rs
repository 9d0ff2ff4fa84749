//! Signal table for pandas snippets written in Python
//!
//! Syntax is checked with the tree-sitter Python grammar; every other signal
//! is a textual pattern.

use std::sync::OnceLock;

use tracing::warn;
use tree_sitter::{Node, Parser};

use super::{CodeScanner, PatternSet, SignalTable};
use crate::complexity::ComplexityClass;
use crate::inspect::{SafetyCategory, SyntaxIssue, SyntaxReport};
use crate::intent::{IntentCategory, StatOperation};

static SIGNALS: OnceLock<SignalTable> = OnceLock::new();

/// Data-frame methods that bracket patterns may pick up as column names
const PANDAS_METHODS: &[&str] = &[
    "head",
    "tail",
    "mean",
    "sum",
    "max",
    "min",
    "count",
    "size",
    "shape",
    "dtypes",
    "columns",
    "index",
    "values",
    "copy",
    "drop",
    "fillna",
    "dropna",
    "groupby",
    "sort_values",
    "sort_index",
    "nlargest",
    "nsmallest",
    "query",
    "loc",
    "iloc",
    "apply",
    "agg",
    "merge",
    "join",
    "concat",
    "pivot",
    "pivot_table",
    "describe",
    "info",
    "isnull",
    "notnull",
    "unique",
    "value_counts",
    "sample",
];

/// Scanner for Python code using pandas, matplotlib and seaborn
#[derive(Debug, Clone, Copy, Default)]
pub struct PandasScanner;

impl CodeScanner for PandasScanner {
    fn language(&self) -> &'static str {
        "python"
    }

    fn check_syntax(&self, code: &str) -> SyntaxReport {
        check_python_syntax(code)
    }

    fn signals(&self) -> &SignalTable {
        SIGNALS.get_or_init(build_signals)
    }
}

fn build_signals() -> SignalTable {
    SignalTable {
        imports: PatternSet::compile(&[r"(?m)^import\s+", r"(?m)^from\s+.*\s+import"]),
        comments: PatternSet::compile(&[r"#.*"]),
        control_flow: PatternSet::compile(&[
            r"\b(?:if|elif|else|for|while|try|except|with)\b",
        ]),
        safety: safety_signals(),
        loops: PatternSet::compile_ci(&[
            r"\bfor\s+\w+\s+in\s+",
            r"\bwhile\s+",
            r"\.apply\(",
            r"\.iterrows\(",
            r"\.itertuples\(",
        ]),
        time_ops: time_signals(),
        space_ops: space_signals(),
        column_refs: PatternSet::compile_ci(&[r#"\[\s*['"]([^'"]+)['"]\s*\]"#]),
        column_lists: PatternSet::compile_ci(&[r"\[\[([^\]]+)\]\]"]),
        quoted_literal: PatternSet::compile(&[r#"['"]([^'"]+)['"]"#]),
        method_names: PANDAS_METHODS,
        intents: intent_signals(),
        statistics: statistic_signals(),
        filters: PatternSet::compile(&[
            r"df\[.*\]|\.query\(|\.loc\[.*\]|\.iloc\[.*\]",
        ]),
        groupby_call: PatternSet::compile_ci(&[r"\.groupby\(\[?([^\]]+)\]?\)"]),
        sorting: PatternSet::compile_ci(&[
            r"\.sort_values\(",
            r"\.sort_index\(",
            r"\.nlargest\(",
            r"\.nsmallest\(",
        ]),
        joins: PatternSet::compile_ci(&[r"\.merge\(", r"\.join\(", r"\.concat\("]),
    }
}

fn safety_signals() -> Vec<(SafetyCategory, PatternSet)> {
    vec![
        (
            SafetyCategory::FileWrite,
            PatternSet::compile_ci(&[
                r"\.to_csv\(",
                r"\.to_excel\(",
                r#"open\(.*['"]w"#,
                r"\.write\(",
            ]),
        ),
        (
            SafetyCategory::FileRead,
            PatternSet::compile_ci(&[r#"open\(.*['"]r"#, r"pd\.read_"]),
        ),
        (
            SafetyCategory::Network,
            PatternSet::compile_ci(&[r"requests\.", r"urllib\.", r"http\."]),
        ),
        (
            SafetyCategory::System,
            PatternSet::compile_ci(&[r"os\.system", r"subprocess\.", r"exec\(", r"eval\("]),
        ),
        (
            SafetyCategory::DangerousImports,
            PatternSet::compile_ci(&[r"import\s+os", r"import\s+subprocess", r"import\s+sys"]),
        ),
    ]
}

fn time_signals() -> Vec<(ComplexityClass, PatternSet)> {
    vec![
        (
            ComplexityClass::Constant,
            PatternSet::compile_ci(&[
                r"\.head\(",
                r"\.tail\(",
                r"\.iloc\[",
                r"\.loc\[",
                r"\.shape",
                r"\.dtypes",
            ]),
        ),
        (
            ComplexityClass::Linear,
            PatternSet::compile_ci(&[
                r"\.mean\(",
                r"\.sum\(",
                r"\.count\(",
                r"\.unique\(",
                r"\.value_counts\(",
                r"\.groupby\(",
                r"\.dropna\(",
                r"\.fillna\(",
            ]),
        ),
        (
            ComplexityClass::Linearithmic,
            PatternSet::compile_ci(&[r"\.sort_values\(", r"\.sort_index\("]),
        ),
        (
            ComplexityClass::Quadratic,
            PatternSet::compile_ci(&[r"\.merge\(", r"\.join\(", r"\.concat\(.*axis=1"]),
        ),
    ]
}

fn space_signals() -> Vec<(ComplexityClass, PatternSet)> {
    vec![
        (
            ComplexityClass::Constant,
            PatternSet::compile_ci(&[
                r"\.head\(",
                r"\.tail\(",
                r"\.iloc\[",
                r"\.loc\[",
                r"\.shape",
                r"\.dtypes",
            ]),
        ),
        (
            ComplexityClass::Linear,
            PatternSet::compile_ci(&[
                r"\.copy\(",
                r"\.drop\(",
                r"\.dropna\(",
                r"\.fillna\(",
                r"\.assign\(",
                r"result\s*=",
                r"df_new\s*=",
                r"df_filtered\s*=",
            ]),
        ),
        (
            ComplexityClass::Quadratic,
            PatternSet::compile_ci(&[
                r"\.merge\(",
                r"\.join\(",
                r"\.concat\(",
                r"\.pivot\(",
                r"\.pivot_table\(",
            ]),
        ),
    ]
}

fn intent_signals() -> Vec<(IntentCategory, PatternSet)> {
    vec![
        (
            IntentCategory::TopN,
            PatternSet::compile_ci(&[
                r"\.nlargest\(",
                r"\.head\(",
                r"\.sort_values\(.*ascending\s*=\s*False",
            ]),
        ),
        (
            IntentCategory::FirstNRows,
            PatternSet::compile_ci(&[r"\.head\(", r"\.iloc\[.*:\s*\d+", r"\.loc\[.*:\s*\d+"]),
        ),
        (
            IntentCategory::BottomN,
            PatternSet::compile_ci(&[
                r"\.nsmallest\(",
                r"\.tail\(",
                r"\.sort_values\(.*ascending\s*=\s*True",
            ]),
        ),
        (
            IntentCategory::Filtering,
            PatternSet::compile_ci(&[r"df\[.*\]", r"\.query\(", r"\.loc\[", r"\.iloc\["]),
        ),
        (
            IntentCategory::Visualization,
            PatternSet::compile_ci(&[
                r"plt\.",
                r"matplotlib",
                r"seaborn",
                r"sns\.",
                r"\.plot\(",
                r"fig\s*=",
                r"ax\.",
            ]),
        ),
    ]
}

fn statistic_signals() -> Vec<(StatOperation, PatternSet)> {
    vec![
        (
            StatOperation::Mean,
            PatternSet::compile_ci(&[r"\.mean\(", r"\.average\("]),
        ),
        (
            StatOperation::Sum,
            PatternSet::compile_ci(&[r"\.sum\(", r"\.agg\(.*sum"]),
        ),
        (
            StatOperation::Max,
            PatternSet::compile_ci(&[r"\.max\(", r"\.agg\(.*max", r"\.nlargest\("]),
        ),
        (
            StatOperation::Min,
            PatternSet::compile_ci(&[r"\.min\(", r"\.agg\(.*min", r"\.nsmallest\("]),
        ),
        (
            StatOperation::Count,
            PatternSet::compile_ci(&[r"\.count\(", r"\.size\(", r"len\(", r"\.shape\[0\]"]),
        ),
        (
            StatOperation::Groupby,
            PatternSet::compile_ci(&[r"\.groupby\(", r"\.pivot_table\("]),
        ),
    ]
}

/// Python 2 statements the grammar still accepts
const PYTHON2_STATEMENTS: &[(&str, &str)] = &[
    ("print_statement", "print"),
    ("exec_statement", "exec"),
];

/// Parse with tree-sitter and report the first ERROR or MISSING node, or
/// the first Python 2 only statement
fn check_python_syntax(code: &str) -> SyntaxReport {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    if let Err(e) = parser.set_language(&language) {
        warn!(error = %e, "python grammar unavailable");
        return SyntaxReport::invalid(SyntaxIssue::message(format!(
            "python grammar unavailable: {}",
            e
        )));
    }

    let tree = match parser.parse(code, None) {
        Some(tree) => tree,
        None => {
            return SyntaxReport::invalid(SyntaxIssue::message("parser produced no syntax tree"))
        }
    };

    let root = tree.root_node();
    if !root.has_error() {
        return match first_python2_statement(root) {
            Some((node, keyword)) => {
                let row = node.start_position().row;
                SyntaxReport::invalid(SyntaxIssue {
                    line: Some(row + 1),
                    message: format!(
                        "invalid syntax: Python 2 '{}' statement, call {}() instead",
                        keyword, keyword
                    ),
                    text: code.lines().nth(row).map(str::to_string),
                })
            }
            None => SyntaxReport::valid(),
        };
    }

    let node = first_error_node(root).unwrap_or(root);
    let row = node.start_position().row;
    let message = if node.is_missing() {
        format!("invalid syntax: missing '{}'", node.kind())
    } else {
        match node.utf8_text(code.as_bytes()) {
            Ok(text) if !text.trim().is_empty() => {
                let first_line = text.lines().next().unwrap_or_default().trim();
                format!("invalid syntax near '{}'", truncate(first_line, 40))
            }
            _ => "invalid syntax".to_string(),
        }
    };

    SyntaxReport::invalid(SyntaxIssue {
        line: Some(row + 1),
        message,
        text: code.lines().nth(row).map(str::to_string),
    })
}

fn first_error_node<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if let Some(found) = first_error_node(child) {
                return Some(found);
            }
        }
    }
    None
}

fn first_python2_statement(node: Node<'_>) -> Option<(Node<'_>, &'static str)> {
    if let Some((_, keyword)) = PYTHON2_STATEMENTS
        .iter()
        .find(|(kind, _)| *kind == node.kind())
    {
        return Some((node, *keyword));
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(found) = first_python2_statement(child) {
            return Some(found);
        }
    }
    None
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_snippet_parses() {
        let report = PandasScanner.check_syntax(
            "result = df.groupby('Region')['Sales'].mean().sort_values(ascending=False)",
        );
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_empty_snippet_is_valid() {
        assert!(PandasScanner.check_syntax("").valid);
    }

    #[test]
    fn test_unclosed_call_reports_line() {
        let code = "import pandas as pd\nresult = df.groupby('Region'\n";
        let report = PandasScanner.check_syntax(code);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        let issue = &report.errors[0];
        assert!(issue.line.is_some());
        assert!(issue.message.starts_with("invalid syntax"));
    }

    #[test]
    fn test_missing_colon_is_invalid() {
        let report = PandasScanner.check_syntax("for x in range(3)\n    print(x)\n");
        assert!(!report.valid);
        let issue = &report.errors[0];
        let line = issue.line.unwrap();
        assert!(line == 1 || line == 2, "unexpected line {}", line);
        assert!(issue.text.is_some());
    }

    #[test]
    fn test_python2_print_is_invalid() {
        for code in ["print \"hello\"", "import pandas as pd\nprint df.head()\n"] {
            let report = PandasScanner.check_syntax(code);
            assert!(!report.valid, "accepted {:?}", code);
            assert_eq!(report.errors.len(), 1);
            assert!(report.errors[0].message.contains("'print' statement"));
        }

        let report = PandasScanner.check_syntax("import pandas as pd\nprint df.head()\n");
        assert_eq!(report.errors[0].line, Some(2));
        assert_eq!(report.errors[0].text.as_deref(), Some("print df.head()"));
    }

    #[test]
    fn test_python2_exec_is_invalid() {
        let report = PandasScanner.check_syntax("exec \"x=1\"");
        assert!(!report.valid);
        assert!(report.errors[0].message.contains("'exec' statement"));
        assert_eq!(report.errors[0].line, Some(1));
    }

    #[test]
    fn test_print_call_is_valid() {
        assert!(PandasScanner.check_syntax("print(df.head())").valid);
        assert!(PandasScanner.check_syntax("for x in range(3):\n    print(x)\n").valid);
    }

    #[test]
    fn test_signal_tables_compile_completely() {
        let signals = PandasScanner.signals();
        assert_eq!(signals.safety.len(), 5);
        assert_eq!(signals.time_ops.len(), 4);
        assert_eq!(signals.space_ops.len(), 3);
        assert_eq!(signals.intents.len(), 5);
        assert_eq!(signals.statistics.len(), 6);
        assert_eq!(signals.loops.len(), 5);
        assert!(!signals.groupby_call.is_empty());
    }

    #[test]
    fn test_method_names_are_case_insensitive() {
        let signals = PandasScanner.signals();
        assert!(signals.is_method_name("Head"));
        assert!(!signals.is_method_name("Sales"));
    }
}
