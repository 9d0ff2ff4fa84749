//! Metrics aggregation: one [`MetricsRecord`] per question/answer turn
//!
//! The engine runs every analyzer over a turn and blends their scores into
//! correctness, quality, performance and an overall weighted score.

use std::time::Instant;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::complexity::{
    estimate_space_complexity, estimate_time_complexity, SpaceComplexity, TimeComplexity,
};
use crate::config::{PerformanceConfig, ScoringConfig};
use crate::coverage::{analyze_coverage, RequirementCoverage};
use crate::dataset::DatasetInfo;
use crate::inspect::{
    check_quality, check_safety, check_syntax, QualityReport, SafetyReport, SyntaxIssue,
};
use crate::intent::{analyze_understanding, PromptUnderstanding};
use crate::outcome::{ExecutionOutcome, RecoveryAttempt};
use crate::recovery::{analyze_recovery, ErrorRecovery};
use crate::scanner::{CodeScanner, PandasScanner};

const SYNTAX_SHARE: f64 = 0.5;
const EXECUTION_SHARE: f64 = 0.5;

const QUALITY_SYNTAX_WEIGHT: f64 = 0.3;
const QUALITY_SAFETY_WEIGHT: f64 = 0.3;
const QUALITY_READABILITY_WEIGHT: f64 = 0.2;
const QUALITY_STRUCTURE_WEIGHT: f64 = 0.2;

const PERF_TIME_COMPLEXITY_WEIGHT: f64 = 0.3;
const PERF_SPACE_COMPLEXITY_WEIGHT: f64 = 0.2;
const PERF_SUCCESS_BONUS: f64 = 0.1;
/// Length proxy used in place of the timing bucket when no timing exists
const LENGTH_PROXY: [f64; 3] = [0.2, 0.15, 0.1];
const LENGTH_BONUS: [f64; 3] = [0.1, 0.05, 0.0];

/// One generated snippet and everything known about running it.
///
/// This is also the shape of a turn file read by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub code: String,
    pub outcome: ExecutionOutcome,
    #[serde(default = "default_model")]
    pub model: String,
    /// Dataset path, probed for columns and size
    #[serde(default, alias = "csv_file")]
    pub dataset: Option<String>,
    #[serde(default, alias = "execution_time")]
    pub elapsed_secs: Option<f64>,
    #[serde(default)]
    pub recovery_attempts: Vec<RecoveryAttempt>,
}

fn default_model() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeCorrectness {
    pub syntax_valid: bool,
    pub syntax_errors: Vec<SyntaxIssue>,
    pub execution_success: bool,
    pub execution_error: Option<String>,
    pub correctness_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeQuality {
    #[serde(flatten)]
    pub report: QualityReport,
    pub safety: SafetyReport,
    pub quality_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Characters in the snippet
    pub code_length: usize,
    /// Control-flow keyword occurrences
    pub estimated_complexity: usize,
    pub line_count: usize,
    pub execution_time_seconds: Option<f64>,
    pub execution_time_ms: Option<f64>,
    pub time_complexity: TimeComplexity,
    pub space_complexity: SpaceComplexity,
    pub performance_score: f64,
}

/// Scores for one turn; appended to a session log and never modified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub question: String,
    #[serde(rename = "csv_file")]
    pub dataset: Option<String>,
    pub code_correctness: CodeCorrectness,
    pub code_quality: CodeQuality,
    pub performance: Performance,
    pub prompt_understanding: PromptUnderstanding,
    pub requirement_coverage: RequirementCoverage,
    pub error_recovery: ErrorRecovery,
    pub overall_score: f64,
}

/// Parse an RFC 3339 timestamp, or a naive ISO 8601 one taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
}

impl MetricsRecord {
    /// The six component scores that feed the overall score
    pub fn component_scores(&self) -> [f64; 6] {
        [
            self.code_correctness.correctness_score,
            self.code_quality.quality_score,
            self.performance.performance_score,
            self.prompt_understanding.understanding_score,
            self.requirement_coverage.coverage_score,
            self.error_recovery.recovery_score,
        ]
    }
}

/// Scores turns with a fixed configuration and code scanner
pub struct MetricsEngine {
    config: ScoringConfig,
    scanner: Box<dyn CodeScanner>,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl MetricsEngine {
    /// Engine for pandas snippets
    pub fn new(config: ScoringConfig) -> Self {
        Self::with_scanner(config, Box::new(PandasScanner))
    }

    pub fn with_scanner(config: ScoringConfig, scanner: Box<dyn CodeScanner>) -> Self {
        Self { config, scanner }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn scanner(&self) -> &dyn CodeScanner {
        self.scanner.as_ref()
    }

    /// Score one turn. Never fails; bad input only lowers scores.
    pub fn compute(&self, turn: &Turn, dataset: &DatasetInfo) -> MetricsRecord {
        let start = Instant::now();
        let scanner = self.scanner();
        let code = turn.code.as_str();

        let syntax = check_syntax(scanner, code);
        let execution_success = !turn.outcome.is_error();
        let code_correctness = CodeCorrectness {
            syntax_valid: syntax.valid,
            correctness_score: bool_score(syntax.valid) * SYNTAX_SHARE
                + bool_score(execution_success) * EXECUTION_SHARE,
            syntax_errors: syntax.errors,
            execution_success,
            execution_error: turn.outcome.error_message().map(str::to_string),
        };

        let code_quality = self.code_quality(code, code_correctness.syntax_valid);
        let performance = self.performance(turn, dataset, &code_quality.report, execution_success);
        let prompt_understanding =
            analyze_understanding(scanner, &turn.question, code, &dataset.columns);
        let requirement_coverage = analyze_coverage(scanner, &turn.question, code);
        let error_recovery =
            analyze_recovery(&turn.outcome, &turn.recovery_attempts, &self.config.recovery);

        let mut record = MetricsRecord {
            timestamp: Utc::now(),
            model: turn.model.clone(),
            question: turn.question.clone(),
            dataset: dataset.reference.clone().or_else(|| turn.dataset.clone()),
            code_correctness,
            code_quality,
            performance,
            prompt_understanding,
            requirement_coverage,
            error_recovery,
            overall_score: 0.0,
        };
        record.overall_score = self.overall(&record);

        debug!(
            model = %record.model,
            outcome = turn.outcome.kind(),
            overall = record.overall_score,
            scores = ?record.component_scores(),
            "computed metrics"
        );
        crate::trace_time!(start, "compute_metrics");

        record
    }

    fn code_quality(&self, code: &str, syntax_valid: bool) -> CodeQuality {
        let scanner = self.scanner();
        let report = check_quality(scanner, code, &self.config.quality);
        let safety = check_safety(scanner, code, &self.config.safety);

        let readability = if self.config.quality.readability_max == 0 {
            0.0
        } else {
            f64::from(report.readability_score) / f64::from(self.config.quality.readability_max)
        };
        let structured = report.has_imports && report.line_count > 0;

        let quality_score = bool_score(syntax_valid) * QUALITY_SYNTAX_WEIGHT
            + safety.safety_score * QUALITY_SAFETY_WEIGHT
            + readability * QUALITY_READABILITY_WEIGHT
            + bool_score(structured) * QUALITY_STRUCTURE_WEIGHT;

        CodeQuality {
            report,
            safety,
            quality_score: quality_score.clamp(0.0, 1.0),
        }
    }

    fn performance(
        &self,
        turn: &Turn,
        dataset: &DatasetInfo,
        quality: &QualityReport,
        execution_success: bool,
    ) -> Performance {
        let scanner = self.scanner();
        let perf = &self.config.performance;
        let code_length = turn.code.chars().count();
        let elapsed = turn.elapsed_secs.filter(|t| t.is_finite() && *t >= 0.0);

        let time_complexity = estimate_time_complexity(scanner, &turn.code);
        let space_complexity = estimate_space_complexity(scanner, &turn.code, dataset.size_bytes);

        let length_tier = length_tier(perf, code_length);
        let timing = match elapsed {
            Some(secs) => time_bucket_score(perf, secs),
            None => LENGTH_PROXY[length_tier],
        };
        let score = timing
            + time_complexity.score * PERF_TIME_COMPLEXITY_WEIGHT
            + space_complexity.score * PERF_SPACE_COMPLEXITY_WEIGHT
            + LENGTH_BONUS[length_tier]
            + bool_score(execution_success) * PERF_SUCCESS_BONUS;

        Performance {
            code_length,
            estimated_complexity: quality.complexity_score,
            line_count: quality.line_count,
            execution_time_seconds: elapsed,
            execution_time_ms: elapsed.map(|s| s * 1000.0),
            time_complexity,
            space_complexity,
            performance_score: score.clamp(0.0, 1.0),
        }
    }

    fn overall(&self, record: &MetricsRecord) -> f64 {
        let w = &self.config.weights;
        let weights = [
            w.correctness,
            w.quality,
            w.performance,
            w.understanding,
            w.coverage,
            w.recovery,
        ];
        let total: f64 = weights
            .iter()
            .zip(record.component_scores())
            .map(|(weight, score)| weight * score)
            .sum();
        total.clamp(0.0, 1.0)
    }
}

fn bool_score(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// 0 for short snippets, 1 for medium, 2 for long
fn length_tier(perf: &PerformanceConfig, code_length: usize) -> usize {
    if code_length < perf.short_code_chars {
        0
    } else if code_length < perf.medium_code_chars {
        1
    } else {
        2
    }
}

fn time_bucket_score(perf: &PerformanceConfig, secs: f64) -> f64 {
    perf.time_buckets
        .iter()
        .find(|bucket| secs < bucket.below_secs)
        .map(|bucket| bucket.score)
        .unwrap_or(perf.slow_score)
}

/// Score one turn with the default configuration and the pandas scanner
pub fn compute_metrics(
    question: &str,
    code: &str,
    outcome: ExecutionOutcome,
    dataset: &DatasetInfo,
    model: &str,
    elapsed_secs: Option<f64>,
    recovery_attempts: Vec<RecoveryAttempt>,
) -> MetricsRecord {
    let turn = Turn {
        question: question.to_string(),
        code: code.to_string(),
        outcome,
        model: model.to_string(),
        dataset: dataset.reference.clone(),
        elapsed_secs,
        recovery_attempts,
    };
    MetricsEngine::default().compute(&turn, dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complexity::ComplexityClass;
    use crate::intent::StatOperation;

    const QUESTION: &str =
        "What is the average of column Sales grouped by Region, sorted descending?";
    const CODE: &str =
        "result = df.groupby('Region')['Sales'].mean().sort_values(ascending=False)";

    fn table() -> ExecutionOutcome {
        ExecutionOutcome::Table(serde_json::json!([{"Region": "West", "Sales": 12.5}]))
    }

    fn sales_dataset() -> DatasetInfo {
        DatasetInfo::from_columns("sales.csv", vec!["Region".into(), "Sales".into()])
    }

    fn assert_bounded(record: &MetricsRecord) {
        for score in record.component_scores() {
            assert!((0.0..=1.0).contains(&score), "score out of range: {}", score);
        }
        assert!((0.0..=1.0).contains(&record.overall_score));
    }

    #[test]
    fn test_end_to_end_scenario() {
        let record = compute_metrics(
            QUESTION,
            CODE,
            table(),
            &sales_dataset(),
            "gpt-4o",
            Some(0.05),
            Vec::new(),
        );

        assert_eq!(record.code_correctness.correctness_score, 1.0);
        assert!(record.code_correctness.syntax_errors.is_empty());
        let stats = &record.prompt_understanding.details.statistical_operations;
        assert!(stats.contains(&StatOperation::Mean));
        assert!(stats.contains(&StatOperation::Groupby));
        assert_eq!(record.requirement_coverage.details.sorting_coverage, 1.0);
        assert_eq!(record.error_recovery.recovery_score, 1.0);
        assert_eq!(record.dataset.as_deref(), Some("sales.csv"));
        assert_eq!(
            record.performance.time_complexity.notation,
            ComplexityClass::Linearithmic
        );
        assert_bounded(&record);
    }

    #[test]
    fn test_overall_is_weighted_sum() {
        let record = compute_metrics(QUESTION, CODE, table(), &sales_dataset(), "m", None, vec![]);
        let weights = [0.25, 0.20, 0.15, 0.15, 0.15, 0.10];
        let expected: f64 = weights
            .iter()
            .zip(record.component_scores())
            .map(|(w, s)| w * s)
            .sum();
        assert!((record.overall_score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_syntax_caps_correctness() {
        let record = compute_metrics(
            "Average sales",
            "result = df.groupby('Region'",
            ExecutionOutcome::Error("SyntaxError: unexpected EOF".into()),
            &DatasetInfo::none(),
            "m",
            None,
            vec![],
        );
        assert!(record.code_correctness.correctness_score <= 0.5);
        assert!(!record.code_correctness.syntax_valid);
        assert!(!record.code_correctness.syntax_errors.is_empty());
        assert_eq!(
            record.code_correctness.execution_error.as_deref(),
            Some("SyntaxError: unexpected EOF")
        );
        assert_bounded(&record);
    }

    #[test]
    fn test_idempotent_scores() {
        let engine = MetricsEngine::default();
        let turn = Turn {
            question: QUESTION.into(),
            code: CODE.into(),
            outcome: table(),
            model: "m".into(),
            dataset: None,
            elapsed_secs: Some(0.4),
            recovery_attempts: vec![],
        };
        let mut first = engine.compute(&turn, &sales_dataset());
        let second = engine.compute(&turn, &sales_dataset());
        first.timestamp = second.timestamp;
        assert_eq!(first, second);
    }

    #[test]
    fn test_scores_bounded_for_hostile_inputs() {
        let long = "x = 1\n".repeat(400);
        let cases = [
            ("", "", ExecutionOutcome::Text(String::new())),
            (
                "top 5 largest 3 where and or in between chart",
                "import os\nos.system('x')\neval('1')\nfor a in b:\n    for c in d:\n        a.merge(c)",
                ExecutionOutcome::Error("boom".into()),
            ),
            ("sum", long.as_str(), ExecutionOutcome::Number(1.0)),
        ];
        for (question, code, outcome) in cases {
            let record = compute_metrics(
                question,
                code,
                outcome,
                &DatasetInfo::none(),
                "m",
                Some(12.0),
                vec![RecoveryAttempt::failure(1, "y", "boom")],
            );
            assert_bounded(&record);
        }
    }

    #[test]
    fn test_performance_without_timing_uses_length_proxy() {
        let engine = MetricsEngine::default();
        let turn = Turn {
            question: "q".into(),
            code: "x = 1".into(),
            outcome: ExecutionOutcome::Number(1.0),
            model: "m".into(),
            dataset: None,
            elapsed_secs: None,
            recovery_attempts: vec![],
        };
        let record = engine.compute(&turn, &DatasetInfo::none());
        // proxy 0.2 + O(1) 0.3 + O(1) space 0.2 + short bonus 0.1 + success 0.1
        assert!((record.performance.performance_score - 0.9).abs() < 1e-9);
        assert_eq!(record.performance.execution_time_ms, None);
    }

    #[test]
    fn test_performance_time_buckets() {
        let engine = MetricsEngine::default();
        let mut turn = Turn {
            question: "q".into(),
            code: "x = 1".into(),
            outcome: ExecutionOutcome::Number(1.0),
            model: "m".into(),
            dataset: None,
            elapsed_secs: Some(0.05),
            recovery_attempts: vec![],
        };
        let fast = engine.compute(&turn, &DatasetInfo::none());
        assert!((fast.performance.performance_score - 1.0).abs() < 1e-9);
        let ms = fast.performance.execution_time_ms.unwrap();
        assert!((ms - 50.0).abs() < 1e-9);

        turn.elapsed_secs = Some(30.0);
        let slow = engine.compute(&turn, &DatasetInfo::none());
        assert!((slow.performance.performance_score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_quality_score_components() {
        let record = compute_metrics(
            "q",
            "import pandas as pd\n# load\nresult = df.head()",
            ExecutionOutcome::Number(1.0),
            &DatasetInfo::none(),
            "m",
            None,
            vec![],
        );
        assert!((record.code_quality.quality_score - 1.0).abs() < 1e-9);

        let record = compute_metrics(
            "q",
            "result = df.head()",
            ExecutionOutcome::Number(1.0),
            &DatasetInfo::none(),
            "m",
            None,
            vec![],
        );
        assert!((record.code_quality.quality_score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_record_json_keys() {
        let record = compute_metrics(QUESTION, CODE, table(), &sales_dataset(), "m", None, vec![]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["csv_file"], "sales.csv");
        assert_eq!(json["code_quality"]["readability_score"], 10);
        assert_eq!(json["performance"]["time_complexity"]["notation"], "O(n log n)");
        assert!(json["prompt_understanding"]["details"]["extracted_columns"].is_array());

        let back: MetricsRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.overall_score, record.overall_score);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let naive = parse_timestamp("2025-11-20T14:03:12.123456").unwrap();
        assert_eq!(naive.to_rfc3339(), "2025-11-20T14:03:12.123456+00:00");
        let whole_seconds = parse_timestamp("2025-11-20T14:03:12").unwrap();
        assert_eq!(whole_seconds.to_rfc3339(), "2025-11-20T14:03:12+00:00");
        let offset = parse_timestamp("2025-11-20T16:03:12+02:00").unwrap();
        assert_eq!(offset, whole_seconds);
        assert!(parse_timestamp("yesterday").is_none());
    }
}
