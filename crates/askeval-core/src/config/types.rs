//! Configuration type definitions

use serde::{Deserialize, Serialize};

/// Default config file name looked up under the root directory
pub const CONFIG_FILE: &str = "askeval.toml";

/// Scoring tunables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Readability and structure thresholds
    #[serde(default)]
    pub quality: QualityConfig,

    /// Safety scoring
    #[serde(default)]
    pub safety: SafetyConfig,

    /// Execution time and code-length buckets
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Recovery scoring
    #[serde(default)]
    pub recovery: RecoveryConfig,

    /// Weights of the six sub-scores in the overall score
    #[serde(default)]
    pub weights: OverallWeights,
}

/// Readability thresholds for the static inspector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Lines longer than this many characters count as long
    #[serde(default = "default_long_line_chars")]
    pub long_line_chars: usize,

    /// Fraction of long lines above which readability is penalized
    #[serde(default = "default_long_line_ratio")]
    pub long_line_ratio: f64,

    #[serde(default = "default_long_line_penalty")]
    pub long_line_penalty: u32,

    /// Uncommented snippets longer than this many lines are penalized
    #[serde(default = "default_uncommented_line_limit")]
    pub uncommented_line_limit: usize,

    #[serde(default = "default_uncommented_penalty")]
    pub uncommented_penalty: u32,

    /// Control-keyword counts above this are penalized
    #[serde(default = "default_complexity_threshold")]
    pub complexity_threshold: usize,

    #[serde(default = "default_complexity_penalty")]
    pub complexity_penalty: u32,

    /// Starting (and maximum) readability score
    #[serde(default = "default_readability_max")]
    pub readability_max: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            long_line_chars: default_long_line_chars(),
            long_line_ratio: default_long_line_ratio(),
            long_line_penalty: default_long_line_penalty(),
            uncommented_line_limit: default_uncommented_line_limit(),
            uncommented_penalty: default_uncommented_penalty(),
            complexity_threshold: default_complexity_threshold(),
            complexity_penalty: default_complexity_penalty(),
            readability_max: default_readability_max(),
        }
    }
}

fn default_long_line_chars() -> usize {
    100
}

fn default_long_line_ratio() -> f64 {
    0.2
}

fn default_long_line_penalty() -> u32 {
    2
}

fn default_uncommented_line_limit() -> usize {
    10
}

fn default_uncommented_penalty() -> u32 {
    1
}

fn default_complexity_threshold() -> usize {
    5
}

fn default_complexity_penalty() -> u32 {
    1
}

fn default_readability_max() -> u32 {
    10
}

/// Safety scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Score deducted per detected dangerous pattern
    #[serde(default = "default_issue_penalty")]
    pub issue_penalty: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            issue_penalty: default_issue_penalty(),
        }
    }
}

fn default_issue_penalty() -> f64 {
    0.2
}

/// One execution-time bucket: runs faster than `below_secs` earn `score`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub below_secs: f64,
    pub score: f64,
}

/// Performance scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Ascending execution-time buckets
    #[serde(default = "default_time_buckets")]
    pub time_buckets: Vec<TimeBucket>,

    /// Score for runs slower than every bucket
    #[serde(default = "default_slow_score")]
    pub slow_score: f64,

    /// Snippets shorter than this many characters count as short
    #[serde(default = "default_short_code_chars")]
    pub short_code_chars: usize,

    /// Snippets shorter than this many characters count as medium
    #[serde(default = "default_medium_code_chars")]
    pub medium_code_chars: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            time_buckets: default_time_buckets(),
            slow_score: default_slow_score(),
            short_code_chars: default_short_code_chars(),
            medium_code_chars: default_medium_code_chars(),
        }
    }
}

fn default_time_buckets() -> Vec<TimeBucket> {
    vec![
        TimeBucket {
            below_secs: 0.1,
            score: 0.3,
        },
        TimeBucket {
            below_secs: 1.0,
            score: 0.25,
        },
        TimeBucket {
            below_secs: 5.0,
            score: 0.15,
        },
    ]
}

fn default_slow_score() -> f64 {
    0.05
}

fn default_short_code_chars() -> usize {
    500
}

fn default_medium_code_chars() -> usize {
    1000
}

/// Recovery scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Number of attempts at which the effort component saturates
    #[serde(default = "default_attempt_saturation")]
    pub attempt_saturation: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            attempt_saturation: default_attempt_saturation(),
        }
    }
}

fn default_attempt_saturation() -> u32 {
    3
}

/// Weights of the overall score; must sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallWeights {
    #[serde(default = "default_correctness_weight")]
    pub correctness: f64,
    #[serde(default = "default_quality_weight")]
    pub quality: f64,
    #[serde(default = "default_performance_weight")]
    pub performance: f64,
    #[serde(default = "default_understanding_weight")]
    pub understanding: f64,
    #[serde(default = "default_coverage_weight")]
    pub coverage: f64,
    #[serde(default = "default_recovery_weight")]
    pub recovery: f64,
}

impl Default for OverallWeights {
    fn default() -> Self {
        Self {
            correctness: default_correctness_weight(),
            quality: default_quality_weight(),
            performance: default_performance_weight(),
            understanding: default_understanding_weight(),
            coverage: default_coverage_weight(),
            recovery: default_recovery_weight(),
        }
    }
}

impl OverallWeights {
    pub fn sum(&self) -> f64 {
        self.correctness
            + self.quality
            + self.performance
            + self.understanding
            + self.coverage
            + self.recovery
    }

    pub(crate) fn values(&self) -> [(&'static str, f64); 6] {
        [
            ("correctness", self.correctness),
            ("quality", self.quality),
            ("performance", self.performance),
            ("understanding", self.understanding),
            ("coverage", self.coverage),
            ("recovery", self.recovery),
        ]
    }
}

fn default_correctness_weight() -> f64 {
    0.25
}

fn default_quality_weight() -> f64 {
    0.20
}

fn default_performance_weight() -> f64 {
    0.15
}

fn default_understanding_weight() -> f64 {
    0.15
}

fn default_coverage_weight() -> f64 {
    0.15
}

fn default_recovery_weight() -> f64 {
    0.10
}
