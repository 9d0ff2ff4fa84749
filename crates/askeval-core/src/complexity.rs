//! Asymptotic complexity estimation from code patterns
//!
//! Time complexity climbs the ladder O(1) < O(n) < O(n log n) < O(n²) < O(n³):
//! the heaviest data operation sets the base class and detected loops escalate it.
//! Space complexity uses the shorter ladder O(1) < O(n) < O(n²).

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scanner::{CodeScanner, PatternSet};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A rung of the complexity ladder, ordered from cheapest to most expensive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplexityClass {
    #[serde(rename = "O(1)")]
    Constant,
    #[serde(rename = "O(n)")]
    Linear,
    #[serde(rename = "O(n log n)")]
    Linearithmic,
    #[serde(rename = "O(n²)")]
    Quadratic,
    #[serde(rename = "O(n³)")]
    Cubic,
}

impl ComplexityClass {
    pub fn notation(self) -> &'static str {
        match self {
            ComplexityClass::Constant => "O(1)",
            ComplexityClass::Linear => "O(n)",
            ComplexityClass::Linearithmic => "O(n log n)",
            ComplexityClass::Quadratic => "O(n²)",
            ComplexityClass::Cubic => "O(n³)",
        }
    }

    /// Time score: lower complexity scores higher
    pub fn time_score(self) -> f64 {
        match self {
            ComplexityClass::Constant => 1.0,
            ComplexityClass::Linear => 0.7,
            ComplexityClass::Linearithmic => 0.5,
            ComplexityClass::Quadratic => 0.3,
            ComplexityClass::Cubic => 0.1,
        }
    }

    /// Space score on the three-rung ladder
    pub fn space_score(self) -> f64 {
        match self {
            ComplexityClass::Constant => 1.0,
            ComplexityClass::Linear | ComplexityClass::Linearithmic => 0.6,
            ComplexityClass::Quadratic | ComplexityClass::Cubic => 0.2,
        }
    }

    /// Memory multiplier over the raw dataset size
    pub fn memory_multiplier(self) -> f64 {
        match self {
            ComplexityClass::Constant => 1.0,
            ComplexityClass::Linear | ComplexityClass::Linearithmic => 2.0,
            ComplexityClass::Quadratic | ComplexityClass::Cubic => 4.0,
        }
    }

    /// Apply loop escalation to a base class
    fn escalate(self, loop_weight: usize) -> Self {
        match loop_weight {
            0 => self,
            1 => match self {
                ComplexityClass::Constant => ComplexityClass::Linear,
                ComplexityClass::Linear => ComplexityClass::Quadratic,
                other => other,
            },
            _ => match self {
                ComplexityClass::Constant | ComplexityClass::Linear => ComplexityClass::Quadratic,
                _ => ComplexityClass::Cubic,
            },
        }
    }
}

impl fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notation())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeComplexity {
    pub notation: ComplexityClass,
    pub score: f64,
    /// Loop and row-iteration constructs found
    #[serde(rename = "nested_loops")]
    pub loop_weight: usize,
    #[serde(rename = "estimated_operations")]
    pub estimated_ops: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceComplexity {
    pub notation: ComplexityClass,
    pub score: f64,
    pub estimated_memory_mb: f64,
}

/// Estimate time complexity from data operations and loops
pub fn estimate_time_complexity(scanner: &dyn CodeScanner, code: &str) -> TimeComplexity {
    let signals = scanner.signals();
    let loop_weight = signals.loops.count(code);
    let base = heaviest_match(&signals.time_ops, code);
    let notation = base.escalate(loop_weight);

    debug!(base = %base, loop_weight, notation = %notation, "time complexity");

    TimeComplexity {
        notation,
        score: notation.time_score(),
        loop_weight,
        estimated_ops: loop_weight + 1,
    }
}

/// Estimate space complexity; with a dataset size, also estimate peak memory
pub fn estimate_space_complexity(
    scanner: &dyn CodeScanner,
    code: &str,
    dataset_size_bytes: Option<u64>,
) -> SpaceComplexity {
    let notation = heaviest_match(&scanner.signals().space_ops, code);
    let estimated_memory_mb = dataset_size_bytes
        .map(|bytes| bytes as f64 / BYTES_PER_MB * notation.memory_multiplier())
        .unwrap_or(0.0);

    SpaceComplexity {
        notation,
        score: notation.space_score(),
        estimated_memory_mb,
    }
}

fn heaviest_match(table: &[(ComplexityClass, PatternSet)], code: &str) -> ComplexityClass {
    table
        .iter()
        .filter(|(_, patterns)| patterns.is_match(code))
        .map(|(class, _)| *class)
        .max()
        .unwrap_or(ComplexityClass::Constant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::PandasScanner;

    fn time(code: &str) -> TimeComplexity {
        estimate_time_complexity(&PandasScanner, code)
    }

    #[test]
    fn test_constant_by_default() {
        let t = time("x = 1");
        assert_eq!(t.notation, ComplexityClass::Constant);
        assert_eq!(t.score, 1.0);
        assert_eq!(t.loop_weight, 0);
        assert_eq!(t.estimated_ops, 1);
    }

    #[test]
    fn test_highest_data_operation_wins() {
        assert_eq!(time("df.head(5)").notation, ComplexityClass::Constant);
        assert_eq!(time("df['a'].mean()").notation, ComplexityClass::Linear);
        assert_eq!(
            time("df.groupby('a').sum().sort_values('b')").notation,
            ComplexityClass::Linearithmic
        );
        assert_eq!(
            time("a.merge(b, on='id').head()").notation,
            ComplexityClass::Quadratic
        );
    }

    #[test]
    fn test_single_loop_escalation() {
        assert_eq!(time("for r in rows:\n    x += r").notation, ComplexityClass::Linear);
        assert_eq!(
            time("df['a'].apply(f).sum()").notation,
            ComplexityClass::Quadratic
        );
        // O(n log n) is not bumped by a single loop
        assert_eq!(
            time("df.sort_values('a').apply(f)").notation,
            ComplexityClass::Linearithmic
        );
    }

    #[test]
    fn test_two_loops_with_merge_reach_cubic() {
        let code = "m = a.merge(b, on='k')\nfor i in m:\n    for j in m:\n        pass";
        let t = time(code);
        assert_eq!(t.loop_weight, 2);
        assert_eq!(t.notation, ComplexityClass::Cubic);
        assert!((t.score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_two_loops_over_constant_reach_quadratic() {
        let t = time("for i in a:\n    for j in b:\n        pass");
        assert_eq!(t.notation, ComplexityClass::Quadratic);
        assert_eq!(t.estimated_ops, 3);
    }

    #[test]
    fn test_space_ladder() {
        let s = estimate_space_complexity(&PandasScanner, "df.head()", None);
        assert_eq!(s.notation, ComplexityClass::Constant);
        assert_eq!(s.estimated_memory_mb, 0.0);

        let s = estimate_space_complexity(&PandasScanner, "result = df.copy()", None);
        assert_eq!(s.notation, ComplexityClass::Linear);
        assert!((s.score - 0.6).abs() < 1e-9);

        let s = estimate_space_complexity(&PandasScanner, "pd.concat([a, b])", None);
        assert_eq!(s.notation, ComplexityClass::Quadratic);
        assert!((s.score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_memory_estimate_uses_multiplier() {
        let two_mb = 2 * 1024 * 1024;
        let s = estimate_space_complexity(&PandasScanner, "result = df.dropna()", Some(two_mb));
        assert!((s.estimated_memory_mb - 4.0).abs() < 1e-9);

        let s = estimate_space_complexity(&PandasScanner, "df.pivot_table(index='a')", Some(two_mb));
        assert!((s.estimated_memory_mb - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_notation_serializes_as_text() {
        let json = serde_json::to_string(&ComplexityClass::Quadratic).unwrap();
        assert_eq!(json, "\"O(n²)\"");
        let parsed: ComplexityClass = serde_json::from_str("\"O(n log n)\"").unwrap();
        assert_eq!(parsed, ComplexityClass::Linearithmic);
    }
}
