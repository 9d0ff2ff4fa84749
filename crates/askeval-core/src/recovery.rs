//! Error recovery scoring across repair attempts
//!
//! An attempt that changes the category of the error is treated as partial
//! progress. This is a proxy, not proof that the root cause was addressed.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RecoveryConfig;
use crate::outcome::{ExecutionOutcome, RecoveryAttempt};

const SUCCESS_RATE_WEIGHT: f64 = 0.5;
const FIX_QUALITY_WEIGHT: f64 = 0.3;
const EFFORT_WEIGHT: f64 = 0.2;

const FIXED: f64 = 1.0;
const CATEGORY_CHANGED: f64 = 0.5;
const NO_PROGRESS: f64 = 0.1;

/// Coarse error taxonomy used to detect progress between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ColumnError,
    SyntaxError,
    TypeError,
    IndexError,
    AttributeError,
    ValueError,
    OtherError,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::ColumnError => "column_error",
            ErrorCategory::SyntaxError => "syntax_error",
            ErrorCategory::TypeError => "type_error",
            ErrorCategory::IndexError => "index_error",
            ErrorCategory::AttributeError => "attribute_error",
            ErrorCategory::ValueError => "value_error",
            ErrorCategory::OtherError => "other_error",
            ErrorCategory::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Keyword rules, checked in order; the first hit wins
const ERROR_RULES: &[(ErrorCategory, &[&str])] = &[
    (ErrorCategory::ColumnError, &["keyerror", "column"]),
    (ErrorCategory::SyntaxError, &["syntax", "invalid"]),
    (ErrorCategory::TypeError, &["type", "dtype"]),
    (ErrorCategory::IndexError, &["index", "out of range"]),
    (ErrorCategory::AttributeError, &["attribute"]),
    (ErrorCategory::ValueError, &["value"]),
];

/// Classify an error message by keyword
pub fn classify_error(message: &str) -> ErrorCategory {
    if message.is_empty() {
        return ErrorCategory::Unknown;
    }
    let lower = message.to_lowercase();
    ERROR_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(ErrorCategory::OtherError)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptDetail {
    pub attempt_number: usize,
    pub success: bool,
    pub error: Option<String>,
    pub fix_quality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecovery {
    pub has_error: bool,
    pub error_message: Option<String>,
    pub recovery_attempts_count: usize,
    pub recovery_success: bool,
    pub recovery_success_rate: f64,
    pub error_fix_quality: f64,
    pub recovery_details: Vec<AttemptDetail>,
    pub recovery_score: f64,
}

impl ErrorRecovery {
    /// Nothing to recover from
    fn not_needed(attempts: usize) -> Self {
        Self {
            has_error: false,
            error_message: None,
            recovery_attempts_count: attempts,
            recovery_success: true,
            recovery_success_rate: 1.0,
            error_fix_quality: 1.0,
            recovery_details: Vec::new(),
            recovery_score: 1.0,
        }
    }
}

/// Score the repair attempts that followed `outcome`
pub fn analyze_recovery(
    outcome: &ExecutionOutcome,
    attempts: &[RecoveryAttempt],
    config: &RecoveryConfig,
) -> ErrorRecovery {
    let Some(original_error) = outcome.error_message() else {
        return ErrorRecovery::not_needed(attempts.len());
    };

    let original_category = classify_error(original_error);
    let recovery_details: Vec<AttemptDetail> = attempts
        .iter()
        .enumerate()
        .map(|(i, attempt)| AttemptDetail {
            attempt_number: i + 1,
            success: attempt.succeeded,
            error: attempt.resulting_error.clone(),
            fix_quality: fix_quality(original_category, attempt),
        })
        .collect();

    let n = attempts.len();
    let (success_rate, fix_quality_mean, score) = if n == 0 {
        (0.0, 0.0, 0.0)
    } else {
        let successes = attempts.iter().filter(|a| a.succeeded).count();
        let rate = successes as f64 / n as f64;
        let quality = recovery_details.iter().map(|d| d.fix_quality).sum::<f64>() / n as f64;
        let saturation = f64::from(config.attempt_saturation.max(1));
        let effort = (n as f64 / saturation).min(1.0);
        let score =
            SUCCESS_RATE_WEIGHT * rate + FIX_QUALITY_WEIGHT * quality + EFFORT_WEIGHT * effort;
        (rate, quality, score)
    };

    debug!(
        category = %original_category,
        attempts = n,
        success_rate,
        fix_quality = fix_quality_mean,
        score,
        "error recovery"
    );

    ErrorRecovery {
        has_error: true,
        error_message: Some(original_error.to_string()),
        recovery_attempts_count: n,
        recovery_success: attempts.iter().any(|a| a.succeeded),
        recovery_success_rate: success_rate,
        error_fix_quality: fix_quality_mean,
        recovery_details,
        recovery_score: score.clamp(0.0, 1.0),
    }
}

fn fix_quality(original: ErrorCategory, attempt: &RecoveryAttempt) -> f64 {
    if attempt.succeeded {
        return FIXED;
    }
    let category = classify_error(attempt.resulting_error.as_deref().unwrap_or_default());
    if category != original {
        CATEGORY_CHANGED
    } else {
        NO_PROGRESS
    }
}
