//! Code-signal scanning
//!
//! Every analyzer looks at generated code through a [`CodeScanner`]: a syntax
//! checker plus a [`SignalTable`] of textual patterns for the target language.
//! Scoring logic only asks "does this signal fire / how often", so swapping the
//! generation language means providing another table, not touching the scorers.

mod pandas;

pub use pandas::PandasScanner;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::complexity::ComplexityClass;
use crate::inspect::{SafetyCategory, SyntaxReport};
use crate::intent::{IntentCategory, StatOperation};

/// Narrow interface between scoring and a target code language
pub trait CodeScanner: Send + Sync {
    /// Language name, e.g. "python"
    fn language(&self) -> &'static str;

    /// Parse the snippet and report the first syntax problem, if any
    fn check_syntax(&self, code: &str) -> SyntaxReport;

    /// Pattern tables used by the analyzers
    fn signals(&self) -> &SignalTable;
}

/// A compiled pattern that remembers its source text
#[derive(Debug, Clone)]
struct Pattern {
    source: &'static str,
    regex: Regex,
}

/// An ordered group of patterns treated as one signal
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compile case-sensitive patterns
    pub fn compile(sources: &[&'static str]) -> Self {
        Self::build(sources, false)
    }

    /// Compile case-insensitive patterns
    pub fn compile_ci(sources: &[&'static str]) -> Self {
        Self::build(sources, true)
    }

    fn build(sources: &[&'static str], case_insensitive: bool) -> Self {
        let patterns = sources
            .iter()
            .copied()
            .filter_map(|source| {
                match RegexBuilder::new(source)
                    .case_insensitive(case_insensitive)
                    .build()
                {
                    Ok(regex) => Some(Pattern { source, regex }),
                    Err(e) => {
                        warn!(pattern = source, error = %e, "skipping invalid signal pattern");
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if any pattern matches
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(text))
    }

    /// Total number of non-overlapping matches across all patterns
    pub fn count(&self, text: &str) -> usize {
        self.patterns
            .iter()
            .map(|p| p.regex.find_iter(text).count())
            .sum()
    }

    /// Sources of the patterns that match, in table order
    pub fn matching_sources<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'static str> + 'a {
        self.patterns
            .iter()
            .filter(move |p| p.regex.is_match(text))
            .map(|p| p.source)
    }

    /// First capture group of every match, pattern by pattern
    pub fn captures<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut out = Vec::new();
        for pattern in &self.patterns {
            for caps in pattern.regex.captures_iter(text) {
                if let Some(m) = caps.get(1) {
                    out.push(m.as_str());
                }
            }
        }
        out
    }

    /// First capture group of the first match of any pattern
    pub fn first_capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns.iter().find_map(|p| {
            p.regex
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
        })
    }
}

/// Every pattern the analyzers consult, for one code language
#[derive(Debug, Clone, Default)]
pub struct SignalTable {
    /// Import statements
    pub imports: PatternSet,
    /// Comment markers
    pub comments: PatternSet,
    /// Control-flow keywords, counted per occurrence
    pub control_flow: PatternSet,
    /// Dangerous operations by category
    pub safety: Vec<(SafetyCategory, PatternSet)>,
    /// Loop and row-iteration constructs, one unit of loop weight per match
    pub loops: PatternSet,
    /// Data operations by the time-complexity class they imply
    pub time_ops: Vec<(ComplexityClass, PatternSet)>,
    /// Data operations by the space-complexity class they imply
    pub space_ops: Vec<(ComplexityClass, PatternSet)>,
    /// Single-column bracket indexing; group 1 is the column name
    pub column_refs: PatternSet,
    /// Column-list bracket indexing; group 1 is the list body
    pub column_lists: PatternSet,
    /// Quoted literal; group 1 is the literal text
    pub quoted_literal: PatternSet,
    /// Method names that look like column references but are not
    pub method_names: &'static [&'static str],
    /// Code constructs expected for each phrase category
    pub intents: Vec<(IntentCategory, PatternSet)>,
    /// Code constructs expected for each statistical operation
    pub statistics: Vec<(StatOperation, PatternSet)>,
    /// Row-filtering constructs
    pub filters: PatternSet,
    /// Grouping call; group 1 is the argument list
    pub groupby_call: PatternSet,
    /// Sorting and n-largest/smallest constructs
    pub sorting: PatternSet,
    /// Merge, join and concatenation constructs
    pub joins: PatternSet,
}

impl SignalTable {
    pub fn intent(&self, category: IntentCategory) -> Option<&PatternSet> {
        self.intents
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, set)| set)
    }

    pub fn statistic(&self, operation: StatOperation) -> Option<&PatternSet> {
        self.statistics
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, set)| set)
    }

    /// True if `name` is a known method rather than a column
    pub fn is_method_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.method_names.iter().any(|m| *m == lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_patterns_are_skipped() {
        let set = PatternSet::compile(&[r"\.head\(", r"(unclosed", r"\.tail\("]);
        assert_eq!(set.len(), 2);
        assert!(set.is_match("df.tail(3)"));
    }

    #[test]
    fn test_count_sums_all_patterns() {
        let set = PatternSet::compile(&[r"\bif\b", r"\bfor\b"]);
        assert_eq!(set.count("if a:\n    for x in y:\n        if x: pass"), 3);
    }

    #[test]
    fn test_case_insensitive_compile() {
        let set = PatternSet::compile_ci(&[r"\.groupby\("]);
        assert!(set.is_match("df.GroupBy('a')"));
        assert!(!PatternSet::compile(&[r"\.groupby\("]).is_match("df.GroupBy('a')"));
    }

    #[test]
    fn test_captures_and_first_capture() {
        let set = PatternSet::compile(&[r"\[['\x22]([^'\x22]+)['\x22]\]"]);
        assert_eq!(set.captures("df['a'] + df['b']"), vec!["a", "b"]);
        assert_eq!(set.first_capture("x = df['b']"), Some("b"));
        assert_eq!(set.first_capture("x = 1"), None);
    }

    #[test]
    fn test_matching_sources_in_table_order() {
        let set = PatternSet::compile(&[r"os\.system", r"eval\(", r"exec\("]);
        let hits: Vec<_> = set.matching_sources("exec(x); os.system('ls')").collect();
        assert_eq!(hits, vec![r"os\.system", r"exec\("]);
    }
}
