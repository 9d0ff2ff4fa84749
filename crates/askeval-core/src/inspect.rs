//! Static inspection of generated code: syntax, quality signals and safety

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{QualityConfig, SafetyConfig};
use crate::scanner::CodeScanner;

/// One syntax problem found while parsing a snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxIssue {
    /// 1-based line number, when the parser can locate the problem
    #[serde(default)]
    pub line: Option<usize>,
    pub message: String,
    /// Source line containing the problem
    #[serde(default)]
    pub text: Option<String>,
}

impl SyntaxIssue {
    /// An issue with no location
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
            text: None,
        }
    }
}

/// Result of parsing a snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxReport {
    pub valid: bool,
    pub errors: Vec<SyntaxIssue>,
}

impl SyntaxReport {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(issue: SyntaxIssue) -> Self {
        Self {
            valid: false,
            errors: vec![issue],
        }
    }
}

/// Structural quality signals of a snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub has_imports: bool,
    pub has_comments: bool,
    /// Non-blank lines
    pub line_count: usize,
    /// Control-flow keyword occurrences
    pub complexity_score: usize,
    /// 0 to `readability_max`, higher is better
    pub readability_score: u32,
}

/// Category of a dangerous operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCategory {
    FileWrite,
    FileRead,
    Network,
    System,
    DangerousImports,
}

impl SafetyCategory {
    pub fn severity(self) -> Severity {
        match self {
            SafetyCategory::System | SafetyCategory::Network => Severity::High,
            SafetyCategory::FileWrite
            | SafetyCategory::FileRead
            | SafetyCategory::DangerousImports => Severity::Medium,
        }
    }
}

impl fmt::Display for SafetyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SafetyCategory::FileWrite => "file_write",
            SafetyCategory::FileRead => "file_read",
            SafetyCategory::Network => "network",
            SafetyCategory::System => "system",
            SafetyCategory::DangerousImports => "dangerous_imports",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

/// A dangerous pattern found in a snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyIssue {
    pub category: SafetyCategory,
    /// Source of the pattern that matched
    pub pattern: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub is_safe: bool,
    pub safety_issues: Vec<SafetyIssue>,
    pub safety_score: f64,
}

/// Parse the snippet with the scanner's grammar; never fails
pub fn check_syntax(scanner: &dyn CodeScanner, code: &str) -> SyntaxReport {
    scanner.check_syntax(code)
}

/// Count structural signals and derive a readability score
pub fn check_quality(scanner: &dyn CodeScanner, code: &str, config: &QualityConfig) -> QualityReport {
    let signals = scanner.signals();
    let lines: Vec<&str> = code.split('\n').collect();
    let line_count = lines.iter().filter(|l| !l.trim().is_empty()).count();
    let has_imports = signals.imports.is_match(code);
    let has_comments = signals.comments.is_match(code);
    let complexity_score = signals.control_flow.count(code);

    let mut readability = config.readability_max;
    let long_lines = lines
        .iter()
        .filter(|l| l.chars().count() > config.long_line_chars)
        .count();
    if long_lines as f64 > lines.len() as f64 * config.long_line_ratio {
        readability = readability.saturating_sub(config.long_line_penalty);
    }
    if !has_comments && line_count > config.uncommented_line_limit {
        readability = readability.saturating_sub(config.uncommented_penalty);
    }
    if complexity_score > config.complexity_threshold {
        readability = readability.saturating_sub(config.complexity_penalty);
    }

    QualityReport {
        has_imports,
        has_comments,
        line_count,
        complexity_score,
        readability_score: readability,
    }
}

/// Scan for dangerous operations; each matching pattern is one issue
pub fn check_safety(scanner: &dyn CodeScanner, code: &str, config: &SafetyConfig) -> SafetyReport {
    let mut issues = Vec::new();
    for (category, patterns) in &scanner.signals().safety {
        for source in patterns.matching_sources(code) {
            issues.push(SafetyIssue {
                category: *category,
                pattern: source.to_string(),
                severity: category.severity(),
            });
        }
    }

    let safety_score = if issues.is_empty() {
        1.0
    } else {
        (1.0 - issues.len() as f64 * config.issue_penalty).max(0.0)
    };

    SafetyReport {
        is_safe: issues.is_empty(),
        safety_issues: issues,
        safety_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::PandasScanner;

    fn quality(code: &str) -> QualityReport {
        check_quality(&PandasScanner, code, &QualityConfig::default())
    }

    fn safety(code: &str) -> SafetyReport {
        check_safety(&PandasScanner, code, &SafetyConfig::default())
    }

    #[test]
    fn test_quality_of_one_liner() {
        let report = quality("result = df['Sales'].mean()");
        assert!(!report.has_imports);
        assert!(!report.has_comments);
        assert_eq!(report.line_count, 1);
        assert_eq!(report.complexity_score, 0);
        assert_eq!(report.readability_score, 10);
    }

    #[test]
    fn test_blank_lines_not_counted() {
        let report = quality("import pandas as pd\n\n# mean\nresult = df.mean()\n\n");
        assert!(report.has_imports);
        assert!(report.has_comments);
        assert_eq!(report.line_count, 3);
    }

    #[test]
    fn test_control_keywords_counted_per_occurrence() {
        let code = "for a in x:\n    if a:\n        pass\n    if b:\n        pass\n    else:\n        pass";
        let report = quality(code);
        assert_eq!(report.complexity_score, 4);
    }

    #[test]
    fn test_readability_penalties_accumulate() {
        let mut lines = Vec::new();
        for i in 0..12 {
            lines.push(format!("if x{i}:\n    y = {}", "a".repeat(120)));
        }
        let report = quality(&lines.join("\n"));
        // long lines -2, uncommented -1, complexity -1
        assert_eq!(report.readability_score, 6);
    }

    #[test]
    fn test_readability_floors_at_zero() {
        let config = QualityConfig {
            readability_max: 2,
            complexity_penalty: 5,
            ..QualityConfig::default()
        };
        let code = "if a: pass\nif b: pass\nif c: pass\nif d: pass\nif e: pass\nif f: pass";
        let report = check_quality(&PandasScanner, code, &config);
        assert_eq!(report.readability_score, 0);
    }

    #[test]
    fn test_safe_code() {
        let report = safety("result = df.groupby('a')['b'].sum()");
        assert!(report.is_safe);
        assert!(report.safety_issues.is_empty());
        assert_eq!(report.safety_score, 1.0);
    }

    #[test]
    fn test_system_call_is_high_severity() {
        let report = safety("import os\nos.system('rm -rf /')");
        assert!(!report.is_safe);
        let categories: Vec<_> = report.safety_issues.iter().map(|i| i.category).collect();
        assert_eq!(
            categories,
            vec![SafetyCategory::System, SafetyCategory::DangerousImports]
        );
        assert_eq!(report.safety_issues[0].severity, Severity::High);
        assert_eq!(report.safety_issues[1].severity, Severity::Medium);
        assert!((report.safety_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_safety_score_floors_at_zero() {
        let code = "import os, sys\nimport subprocess\nos.system('x')\nsubprocess.run('y')\neval('1')\nexec('2')\nrequests.get(u)";
        let report = safety(code);
        assert!(report.safety_issues.len() >= 5);
        assert_eq!(report.safety_score, 0.0);
    }

    #[test]
    fn test_file_write_detection() {
        let report = safety("df.to_csv('out.csv')");
        assert_eq!(report.safety_issues.len(), 1);
        assert_eq!(report.safety_issues[0].category, SafetyCategory::FileWrite);
        assert_eq!(report.safety_issues[0].pattern, r"\.to_csv\(");
    }
}
