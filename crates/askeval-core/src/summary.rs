//! Session summaries, recomputed in full from a session's metrics log

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::complexity::ComplexityClass;
use crate::metrics::MetricsRecord;

/// Aggregate view over every record of one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub average_overall_score: f64,
    pub average_correctness_score: f64,
    pub average_quality_score: f64,
    pub average_performance_score: f64,
    pub average_understanding_score: f64,
    pub average_coverage_score: f64,
    pub average_recovery_score: f64,
    /// Mean over the records that carry a timing
    pub average_execution_time_seconds: Option<f64>,
    pub average_execution_time_ms: Option<f64>,
    /// Sorted, deduplicated
    pub models_used: Vec<String>,
    pub total_questions: usize,
    pub successful_executions: usize,
    pub errors_encountered: usize,
    pub total_recovery_attempts: usize,
    /// Failed turns that at least one repair attempt fixed
    pub successful_recoveries: usize,
    pub recovery_success_rate: f64,
    pub time_complexity_distribution: BTreeMap<ComplexityClass, usize>,
    pub space_complexity_distribution: BTreeMap<ComplexityClass, usize>,
}

/// Summarize a session log; an empty log yields an all-zero summary
pub fn summarize(records: &[MetricsRecord]) -> SessionSummary {
    let timings: Vec<f64> = records
        .iter()
        .filter_map(|r| r.performance.execution_time_seconds)
        .collect();
    let average_execution_time_seconds = mean_of(&timings);

    let models_used: BTreeSet<&str> = records.iter().map(|r| r.model.as_str()).collect();

    let errors_encountered = records
        .iter()
        .filter(|r| r.error_recovery.has_error)
        .count();
    let successful_recoveries = records
        .iter()
        .filter(|r| r.error_recovery.has_error && r.error_recovery.recovery_success)
        .count();
    let recovery_success_rate = if errors_encountered > 0 {
        successful_recoveries as f64 / errors_encountered as f64
    } else {
        0.0
    };

    let mut time_complexity_distribution = BTreeMap::new();
    let mut space_complexity_distribution = BTreeMap::new();
    for record in records {
        *time_complexity_distribution
            .entry(record.performance.time_complexity.notation)
            .or_insert(0) += 1;
        *space_complexity_distribution
            .entry(record.performance.space_complexity.notation)
            .or_insert(0) += 1;
    }

    SessionSummary {
        average_overall_score: average(records, |r| r.overall_score),
        average_correctness_score: average(records, |r| r.code_correctness.correctness_score),
        average_quality_score: average(records, |r| r.code_quality.quality_score),
        average_performance_score: average(records, |r| r.performance.performance_score),
        average_understanding_score: average(records, |r| {
            r.prompt_understanding.understanding_score
        }),
        average_coverage_score: average(records, |r| r.requirement_coverage.coverage_score),
        average_recovery_score: average(records, |r| r.error_recovery.recovery_score),
        average_execution_time_seconds,
        average_execution_time_ms: average_execution_time_seconds.map(|s| s * 1000.0),
        models_used: models_used.into_iter().map(str::to_string).collect(),
        total_questions: records.len(),
        successful_executions: records
            .iter()
            .filter(|r| r.code_correctness.execution_success)
            .count(),
        errors_encountered,
        total_recovery_attempts: records
            .iter()
            .map(|r| r.error_recovery.recovery_attempts_count)
            .sum(),
        successful_recoveries,
        recovery_success_rate,
        time_complexity_distribution,
        space_complexity_distribution,
    }
}

fn average(records: &[MetricsRecord], score: impl Fn(&MetricsRecord) -> f64) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(score).sum::<f64>() / records.len() as f64
}

fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
