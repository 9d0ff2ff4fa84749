//! Error types and exit codes for askeval
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (I/O, serialization)
//! - 2: Usage error (bad flags/args, invalid configuration)
//! - 3: Data error (missing session, malformed turn input)
//!
//! Scoring itself never fails; these errors only surface at the I/O edges
//! (configuration, turn input, session store, dataset splitting).

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the askeval binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data error - missing session, malformed input (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur around the scoring pipeline
#[derive(Error, Debug)]
pub enum EvalError {
    // Usage errors (exit code 2)
    #[error("unknown format: {0} (expected: human or json)")]
    UnknownFormat(String),

    #[error("{0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    // Data errors (exit code 3)
    #[error("session not found: {id}")]
    SessionNotFound { id: String },

    #[error("invalid turn input in {path:?}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("{context} not found: {value}")]
    NotFound { context: String, value: String },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to {operation} {target}: {reason}")]
    FailedOperationWithTarget {
        operation: String,
        target: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl EvalError {
    /// Create an error for a failed IO operation with context
    pub fn io_operation(
        operation: &str,
        path: impl std::fmt::Display,
        error: impl std::fmt::Display,
    ) -> Self {
        EvalError::FailedOperationWithTarget {
            operation: operation.to_string(),
            target: path.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        EvalError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for an entity that was not found
    pub fn not_found(context: &str, value: impl std::fmt::Display) -> Self {
        EvalError::NotFound {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for a turn file that could not be understood
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        EvalError::InvalidInput {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            EvalError::UnknownFormat(_)
            | EvalError::UsageError(_)
            | EvalError::InvalidValue { .. } => ExitCode::Usage,

            EvalError::SessionNotFound { .. }
            | EvalError::InvalidInput { .. }
            | EvalError::NotFound { .. } => ExitCode::Data,

            EvalError::Io(_)
            | EvalError::Json(_)
            | EvalError::Toml(_)
            | EvalError::FailedOperationWithTarget { .. }
            | EvalError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    fn error_type(&self) -> &'static str {
        match self {
            EvalError::UnknownFormat(_) => "unknown_format",
            EvalError::UsageError(_) => "usage_error",
            EvalError::InvalidValue { .. } => "invalid_value",
            EvalError::SessionNotFound { .. } => "session_not_found",
            EvalError::InvalidInput { .. } => "invalid_input",
            EvalError::NotFound { .. } => "not_found",
            EvalError::Io(_) => "io_error",
            EvalError::Json(_) => "json_error",
            EvalError::Toml(_) => "toml_error",
            EvalError::FailedOperationWithTarget { .. } => "failed_operation_with_target",
            EvalError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for askeval operations
pub type Result<T> = std::result::Result<T, EvalError>;
