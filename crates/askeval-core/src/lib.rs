//! Askeval Core Library
//!
//! Heuristic scoring of LLM-generated data-analysis code: static inspection,
//! complexity estimation, intent and requirement matching, error-recovery
//! scoring, and per-session aggregation of the resulting metrics records.

pub mod complexity;
pub mod config;
pub mod coverage;
pub mod dataset;
pub mod error;
pub mod format;
pub mod inspect;
pub mod intent;
pub mod logging;
pub mod metrics;
pub mod outcome;
pub mod recovery;
pub mod scanner;
pub mod session;
pub mod summary;

pub use metrics::{compute_metrics, MetricsEngine, MetricsRecord, Turn};
pub use summary::{summarize, SessionSummary};
