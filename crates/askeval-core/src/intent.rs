//! Prompt understanding: does the code do what the question asks?
//!
//! Three parts contribute to a score out of 1.0:
//! - column extraction (0.4): columns named in the question vs columns indexed in the code
//! - phrase categories (0.3): "top 5", "first 10 rows", "only", "chart", ...
//! - statistical operations (0.3): average, total, count, group by, ...
//!
//! Each statistic is worth 0.1, so a question asking for many of them can
//! earn more than its 0.3 share; the final score is capped at 1.0.
//!
//! Question-side phrases live here; code-side constructs come from the
//! scanner's [`SignalTable`](crate::scanner::SignalTable).

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scanner::{CodeScanner, PatternSet};

const COLUMN_WEIGHT: f64 = 0.4;
const COLUMN_CREDIT_UNMENTIONED_USED: f64 = 0.2;
const COLUMN_CREDIT_UNMENTIONED_UNUSED: f64 = 0.1;
const PHRASE_TOTAL: f64 = 0.3;
const STAT_TOTAL: f64 = 0.3;
const PHRASE_UNIMPLEMENTED_FACTOR: f64 = 0.3;
const STAT_UNIMPLEMENTED_FACTOR: f64 = 0.2;
const TOTAL_POSSIBLE: f64 = COLUMN_WEIGHT + PHRASE_TOTAL + STAT_TOTAL;

/// Natural-language phrase category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    TopN,
    FirstNRows,
    BottomN,
    Filtering,
    Visualization,
}

/// Statistical operation a question can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatOperation {
    Mean,
    Sum,
    Max,
    Min,
    Count,
    Groupby,
}

impl fmt::Display for StatOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatOperation::Mean => "mean",
            StatOperation::Sum => "sum",
            StatOperation::Max => "max",
            StatOperation::Min => "min",
            StatOperation::Count => "count",
            StatOperation::Groupby => "groupby",
        };
        write!(f, "{}", name)
    }
}

/// One row of a question-side lookup table
#[derive(Debug, Clone, Copy)]
pub struct PhraseRule<C> {
    pub category: C,
    pub phrases: &'static [&'static str],
    pub weight: f64,
}

pub const INTENT_RULES: &[PhraseRule<IntentCategory>] = &[
    PhraseRule {
        category: IntentCategory::TopN,
        phrases: &[r"top\s+(\d+)", r"largest\s+(\d+)", r"biggest\s+(\d+)", r"highest\s+(\d+)"],
        weight: 0.06,
    },
    PhraseRule {
        category: IntentCategory::FirstNRows,
        phrases: &[r"first\s+(\d+)\s+rows?", r"first\s+(\d+)", r"extract.*first\s+(\d+)"],
        weight: 0.06,
    },
    PhraseRule {
        category: IntentCategory::BottomN,
        phrases: &[r"bottom\s+(\d+)", r"smallest\s+(\d+)", r"lowest\s+(\d+)"],
        weight: 0.06,
    },
    PhraseRule {
        category: IntentCategory::Filtering,
        phrases: &["where", "filter", "only", "greater than", "less than", "equal to"],
        weight: 0.06,
    },
    PhraseRule {
        category: IntentCategory::Visualization,
        phrases: &["chart", "graph", "plot", "visualize", "bar chart", "histogram", "pie chart"],
        weight: 0.06,
    },
];

pub const STAT_RULES: &[PhraseRule<StatOperation>] = &[
    PhraseRule {
        category: StatOperation::Mean,
        phrases: &["average", "mean", "avg"],
        weight: 0.1,
    },
    PhraseRule {
        category: StatOperation::Sum,
        phrases: &["sum", "total", "add"],
        weight: 0.1,
    },
    PhraseRule {
        category: StatOperation::Max,
        phrases: &["maximum", "max", "highest", "largest"],
        weight: 0.1,
    },
    PhraseRule {
        category: StatOperation::Min,
        phrases: &["minimum", "min", "lowest", "smallest"],
        weight: 0.1,
    },
    PhraseRule {
        category: StatOperation::Count,
        phrases: &["count", "number of", "how many"],
        weight: 0.1,
    },
    PhraseRule {
        category: StatOperation::Groupby,
        phrases: &["group by", "by", "per", "for each"],
        weight: 0.1,
    },
];

static INTENT_PHRASES: OnceLock<Vec<PatternSet>> = OnceLock::new();
static STAT_PHRASES: OnceLock<Vec<PatternSet>> = OnceLock::new();

fn compile_rules<C>(rules: &[PhraseRule<C>]) -> Vec<PatternSet> {
    rules.iter().map(|r| PatternSet::compile(r.phrases)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderstandingDetails {
    pub column_extraction_score: f64,
    pub nl_parsing_score: f64,
    pub statistical_understanding_score: f64,
    /// Lower-cased columns indexed in the code, sorted
    pub extracted_columns: Vec<String>,
    /// Lower-cased dataset columns named in the question, in dataset order
    pub mentioned_columns: Vec<String>,
    /// Operations the question asks for
    pub statistical_operations: Vec<StatOperation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptUnderstanding {
    pub understanding_score: f64,
    pub details: UnderstandingDetails,
}

/// Score how well `code` reflects `question`.
///
/// `columns` are the dataset's column names; pass an empty slice when the
/// dataset could not be read.
pub fn analyze_understanding(
    scanner: &dyn CodeScanner,
    question: &str,
    code: &str,
    columns: &[String],
) -> PromptUnderstanding {
    let question = question.to_lowercase();

    let mentioned_columns = mentioned_columns(&question, columns);
    let extracted_columns = extract_columns(scanner, code);
    let column_extraction_score = column_score(&mentioned_columns, &extracted_columns);

    let nl_parsing_score = phrase_score(scanner, &question, code);
    let (statistical_understanding_score, statistical_operations) =
        statistic_score(scanner, &question, code);

    debug!(
        extracted = ?extracted_columns,
        mentioned = ?mentioned_columns,
        column_extraction_score,
        nl_parsing_score,
        statistical_understanding_score,
        "prompt understanding"
    );

    let earned = column_extraction_score + nl_parsing_score + statistical_understanding_score;
    PromptUnderstanding {
        understanding_score: (earned / TOTAL_POSSIBLE).clamp(0.0, 1.0),
        details: UnderstandingDetails {
            column_extraction_score,
            nl_parsing_score,
            statistical_understanding_score,
            extracted_columns: extracted_columns.into_iter().collect(),
            mentioned_columns,
            statistical_operations,
        },
    }
}

/// Dataset columns whose name, or its underscore-to-space variant, appears in the question
fn mentioned_columns(question_lower: &str, columns: &[String]) -> Vec<String> {
    let mut mentioned = Vec::new();
    for column in columns {
        let column = column.to_lowercase();
        if column.is_empty() || mentioned.contains(&column) {
            continue;
        }
        if question_lower.contains(&column) || question_lower.contains(&column.replace('_', " ")) {
            mentioned.push(column);
        }
    }
    mentioned
}

/// Columns referenced through bracket indexing, minus known method names
pub fn extract_columns(scanner: &dyn CodeScanner, code: &str) -> BTreeSet<String> {
    let signals = scanner.signals();
    let mut names: Vec<&str> = signals.column_refs.captures(code);
    for list in signals.column_lists.captures(code) {
        names.extend(signals.quoted_literal.captures(list));
    }

    names
        .into_iter()
        .filter(|name| !signals.is_method_name(name))
        .map(str::to_lowercase)
        .collect()
}

fn column_score(mentioned: &[String], extracted: &BTreeSet<String>) -> f64 {
    if mentioned.is_empty() {
        return if extracted.is_empty() {
            COLUMN_CREDIT_UNMENTIONED_UNUSED
        } else {
            COLUMN_CREDIT_UNMENTIONED_USED
        };
    }
    let matched = mentioned.iter().filter(|c| extracted.contains(*c)).count();
    matched as f64 / mentioned.len() as f64 * COLUMN_WEIGHT
}

fn phrase_score(scanner: &dyn CodeScanner, question_lower: &str, code: &str) -> f64 {
    let phrases = INTENT_PHRASES.get_or_init(|| compile_rules(INTENT_RULES));
    let signals = scanner.signals();

    INTENT_RULES
        .iter()
        .zip(phrases)
        .filter(|(_, asked)| asked.is_match(question_lower))
        .map(|(rule, _)| {
            let implemented = signals
                .intent(rule.category)
                .is_some_and(|set| set.is_match(code));
            if implemented {
                rule.weight
            } else {
                rule.weight * PHRASE_UNIMPLEMENTED_FACTOR
            }
        })
        .sum()
}

fn statistic_score(
    scanner: &dyn CodeScanner,
    question_lower: &str,
    code: &str,
) -> (f64, Vec<StatOperation>) {
    let phrases = STAT_PHRASES.get_or_init(|| compile_rules(STAT_RULES));
    let signals = scanner.signals();

    let mut score = 0.0;
    let mut detected = Vec::new();
    for (rule, asked) in STAT_RULES.iter().zip(phrases) {
        if !asked.is_match(question_lower) {
            continue;
        }
        detected.push(rule.category);
        let implemented = signals
            .statistic(rule.category)
            .is_some_and(|set| set.is_match(code));
        score += if implemented {
            rule.weight
        } else {
            rule.weight * STAT_UNIMPLEMENTED_FACTOR
        };
    }
    (score, detected)
}
