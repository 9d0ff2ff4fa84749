//! Requirement coverage: are all parts of a multi-part question reflected in the code?
//!
//! A requirement the question never mentions earns full credit.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scanner::{CodeScanner, PatternSet};

const FILTER_WEIGHT: f64 = 0.3;
const GROUPBY_WEIGHT: f64 = 0.3;
const SORT_WEIGHT: f64 = 0.2;
const JOIN_WEIGHT: f64 = 0.2;

/// Filter checks start once the question mentions more than this many keywords
const FILTER_KEYWORD_THRESHOLD: usize = 1;

pub const FILTER_KEYWORDS: &[&str] = &[
    "and",
    "or",
    "where",
    "filter",
    "greater than",
    "less than",
    "equal to",
    "not equal",
    "contains",
    "in",
    "between",
];

pub const SORT_KEYWORDS: &[&str] = &[
    "sort",
    "order",
    "ascending",
    "descending",
    "top",
    "bottom",
    "largest",
    "smallest",
];

pub const JOIN_KEYWORDS: &[&str] = &["join", "merge", "combine", "match"];

static GROUPBY_PHRASES: OnceLock<PatternSet> = OnceLock::new();

fn groupby_phrases() -> &'static PatternSet {
    GROUPBY_PHRASES.get_or_init(|| {
        PatternSet::compile(&[
            r"group\s+by\s+([^,]+(?:,\s*[^,]+)+)",
            r"by\s+([^,]+(?:,\s*[^,]+)+)",
        ])
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageDetails {
    pub filter_conditions_coverage: f64,
    pub groupby_columns_coverage: f64,
    pub sorting_coverage: f64,
    pub join_conditions_coverage: f64,
    pub missing_requirements: Vec<String>,
}

impl Default for CoverageDetails {
    fn default() -> Self {
        Self {
            filter_conditions_coverage: 1.0,
            groupby_columns_coverage: 1.0,
            sorting_coverage: 1.0,
            join_conditions_coverage: 1.0,
            missing_requirements: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementCoverage {
    pub coverage_score: f64,
    pub details: CoverageDetails,
}

/// Check filters, grouping columns, sorting and joins requested by the question
pub fn analyze_coverage(scanner: &dyn CodeScanner, question: &str, code: &str) -> RequirementCoverage {
    let question = question.to_lowercase();
    let signals = scanner.signals();
    let mut details = CoverageDetails::default();

    let filter_count = FILTER_KEYWORDS
        .iter()
        .filter(|k| question.contains(*k))
        .count();
    if filter_count > FILTER_KEYWORD_THRESHOLD {
        let filter_ops = signals.filters.count(code);
        if filter_ops < filter_count {
            details.filter_conditions_coverage = filter_ops as f64 / filter_count as f64;
            details.missing_requirements.push(format!(
                "Missing {} filter condition(s)",
                filter_count - filter_ops
            ));
        }
    }

    let mentioned = groupby_columns_mentioned(&question);
    if !mentioned.is_empty() {
        match signals.groupby_call.first_capture(code) {
            Some(args) => {
                let in_code = split_groupby_args(args);
                let matched = mentioned
                    .iter()
                    .filter(|m| in_code.iter().any(|c| c.contains(m.as_str())))
                    .count();
                details.groupby_columns_coverage = matched as f64 / mentioned.len() as f64;
                if matched < mentioned.len() {
                    details.missing_requirements.push(format!(
                        "Missing {} groupby column(s)",
                        mentioned.len() - matched
                    ));
                }
            }
            None => {
                details.groupby_columns_coverage = 0.0;
                details
                    .missing_requirements
                    .push("Groupby operation missing".to_string());
            }
        }
    }

    if mentions_any(&question, SORT_KEYWORDS) && !signals.sorting.is_match(code) {
        details.sorting_coverage = 0.0;
        details
            .missing_requirements
            .push("Sorting operation missing".to_string());
    }

    if mentions_any(&question, JOIN_KEYWORDS) && !signals.joins.is_match(code) {
        details.join_conditions_coverage = 0.0;
        details
            .missing_requirements
            .push("Join/merge operation missing".to_string());
    }

    let coverage_score = details.filter_conditions_coverage * FILTER_WEIGHT
        + details.groupby_columns_coverage * GROUPBY_WEIGHT
        + details.sorting_coverage * SORT_WEIGHT
        + details.join_conditions_coverage * JOIN_WEIGHT;

    debug!(coverage_score, missing = ?details.missing_requirements, "requirement coverage");

    RequirementCoverage {
        coverage_score: coverage_score.clamp(0.0, 1.0),
        details,
    }
}

fn mentions_any(question_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| question_lower.contains(k))
}

/// Columns listed after "group by" / "by", deduplicated in order of appearance
fn groupby_columns_mentioned(question_lower: &str) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for list in groupby_phrases().captures(question_lower) {
        for column in list.split(',').map(str::trim) {
            if !column.is_empty() && !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
    }
    columns
}

/// Lower-cased column names inside a grouping call's argument list
fn split_groupby_args(args: &str) -> Vec<String> {
    args.split(',')
        .map(|c| c.trim().trim_matches(|ch| ch == '\'' || ch == '"').to_lowercase())
        .collect()
}
