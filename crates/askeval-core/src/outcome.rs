//! Execution outcomes produced by the sandbox and the repair attempts that follow them

use serde::{Deserialize, Serialize};

/// Structured result of running a snippet.
///
/// Serialized the way the sandbox reports it: `{"type": "table", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Number(f64),
    Table(serde_json::Value),
    Chart(serde_json::Value),
    Text(String),
    Error(String),
}

impl ExecutionOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ExecutionOutcome::Error(_))
    }

    /// The error text if the run failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Short name of the result shape
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionOutcome::Number(_) => "number",
            ExecutionOutcome::Table(_) => "table",
            ExecutionOutcome::Chart(_) => "chart",
            ExecutionOutcome::Text(_) => "text",
            ExecutionOutcome::Error(_) => "error",
        }
    }
}

/// A repaired snippet generated after a failed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryAttempt {
    /// 1-based position in the attempt sequence
    #[serde(default)]
    pub attempt: u32,

    #[serde(default, alias = "code")]
    pub repaired_code: String,

    /// Error raised by the repaired snippet, if any
    #[serde(default, alias = "error")]
    pub resulting_error: Option<String>,

    #[serde(default, alias = "success")]
    pub succeeded: bool,

    #[serde(default, alias = "execution_time")]
    pub elapsed_secs: Option<f64>,
}

impl RecoveryAttempt {
    pub fn success(attempt: u32, repaired_code: impl Into<String>) -> Self {
        Self {
            attempt,
            repaired_code: repaired_code.into(),
            resulting_error: None,
            succeeded: true,
            elapsed_secs: None,
        }
    }

    pub fn failure(
        attempt: u32,
        repaired_code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            repaired_code: repaired_code.into(),
            resulting_error: Some(error.into()),
            succeeded: false,
            elapsed_secs: None,
        }
    }
}
