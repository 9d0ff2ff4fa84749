//! Scoring configuration for askeval
//!
//! Thresholds and weights live in `askeval.toml`. Every field has a default,
//! so a missing or partial file falls back to the built-in scoring constants.

pub mod types;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EvalError, Result};

pub use types::{
    OverallWeights, PerformanceConfig, QualityConfig, RecoveryConfig, SafetyConfig,
    ScoringConfig, TimeBucket, CONFIG_FILE,
};

const WEIGHT_TOLERANCE: f64 = 1e-6;

impl ScoringConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| EvalError::io_operation("read config", path.display(), e))?;
        let config: ScoringConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration: explicit path, then `<root>/askeval.toml`, then defaults
    pub fn discover(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading explicit config");
            return Self::load(path);
        }

        let candidate = root.join(CONFIG_FILE);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "loading discovered config");
            return Self::load(&candidate);
        }

        Ok(Self::default())
    }

    /// Reject values that would push scores outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in self.weights.values() {
            if !(0.0..=1.0).contains(&weight) {
                return Err(EvalError::invalid_value(
                    &format!("weights.{}", name),
                    weight,
                ));
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(EvalError::invalid_value(
                "weights (must sum to 1.0)",
                format!("{:.4}", sum),
            ));
        }

        if !(0.0..=1.0).contains(&self.quality.long_line_ratio) {
            return Err(EvalError::invalid_value(
                "quality.long_line_ratio",
                self.quality.long_line_ratio,
            ));
        }
        if !(0.0..=1.0).contains(&self.safety.issue_penalty) {
            return Err(EvalError::invalid_value(
                "safety.issue_penalty",
                self.safety.issue_penalty,
            ));
        }
        if self.recovery.attempt_saturation == 0 {
            return Err(EvalError::invalid_value(
                "recovery.attempt_saturation",
                0,
            ));
        }
        if self.performance.short_code_chars > self.performance.medium_code_chars {
            return Err(EvalError::invalid_value(
                "performance.short_code_chars (must not exceed medium_code_chars)",
                self.performance.short_code_chars,
            ));
        }

        let mut previous = 0.0;
        for bucket in &self.performance.time_buckets {
            if bucket.below_secs <= previous {
                return Err(EvalError::invalid_value(
                    "performance.time_buckets (must be ascending)",
                    bucket.below_secs,
                ));
            }
            if !(0.0..=1.0).contains(&bucket.score) {
                return Err(EvalError::invalid_value(
                    "performance.time_buckets.score",
                    bucket.score,
                ));
            }
            previous = bucket.below_secs;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.quality.long_line_chars, 100);
        assert_eq!(config.quality.readability_max, 10);
        assert_eq!(config.quality.complexity_threshold, 5);
        assert_eq!(config.recovery.attempt_saturation, 3);
        assert_eq!(config.performance.time_buckets.len(), 3);
        assert!((config.weights.sum() - 1.0).abs() < 1e-9);
        config.validate().unwrap();
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = ScoringConfig::default();
        config.quality.long_line_chars = 120;
        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = ScoringConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[quality]\ncomplexity_threshold = 8\n").unwrap();

        let loaded = ScoringConfig::load(&path).unwrap();
        assert_eq!(loaded.quality.complexity_threshold, 8);
        assert_eq!(loaded.quality.long_line_chars, 100);
        assert_eq!(loaded.weights, OverallWeights::default());
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[weights]\ncorrectness = 0.5\n").unwrap();

        let err = ScoringConfig::load(&path).unwrap_err();
        assert!(matches!(err, EvalError::InvalidValue { .. }));
    }

    #[test]
    fn test_rejects_unordered_time_buckets() {
        let mut config = ScoringConfig::default();
        config.performance.time_buckets = vec![
            TimeBucket {
                below_secs: 1.0,
                score: 0.3,
            },
            TimeBucket {
                below_secs: 0.5,
                score: 0.2,
            },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discover_prefers_root_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[recovery]\nattempt_saturation = 5\n",
        )
        .unwrap();

        let config = ScoringConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.recovery.attempt_saturation, 5);

        let empty = tempdir().unwrap();
        let config = ScoringConfig::discover(None, empty.path()).unwrap();
        assert_eq!(config, ScoringConfig::default());
    }
}
