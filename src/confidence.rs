//! Coverage-based confidence grading
//!
//! Confidence annotates a value; it never suppresses one. The combined grade
//! of several inputs is the weakest of them.

use crate::baseline::BaselineWindow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coverage cut points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Minimum coverage graded `high`
    pub high_coverage: f64,

    /// Minimum coverage graded `med`
    pub medium_coverage: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        ConfidenceConfig {
            high_coverage: 0.85,
            medium_coverage: 0.5,
        }
    }
}

/// Ordered so that `Low < Medium < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "med")]
    Medium,
    #[serde(rename = "high")]
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "med",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ConfidenceGate {
    config: ConfidenceConfig,
}

impl ConfidenceGate {
    pub fn new() -> Self {
        ConfidenceGate {
            config: ConfidenceConfig::default(),
        }
    }

    pub fn with_config(config: ConfidenceConfig) -> Self {
        ConfidenceGate { config }
    }

    /// Grade one coverage ratio; NaN grades low
    pub fn grade(&self, coverage: f64) -> Confidence {
        if coverage >= self.config.high_coverage {
            Confidence::High
        } else if coverage >= self.config.medium_coverage {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// A baseline without samples counts as zero coverage
    pub fn grade_baseline(&self, baseline: &BaselineWindow) -> Confidence {
        if baseline.is_empty() {
            Confidence::Low
        } else {
            self.grade(baseline.coverage_ratio)
        }
    }

    /// Weakest grade over all inputs; no inputs grades low
    pub fn combine<I>(&self, coverages: I) -> Confidence
    where
        I: IntoIterator<Item = f64>,
    {
        coverages
            .into_iter()
            .map(|c| self.grade(c))
            .min()
            .unwrap_or(Confidence::Low)
    }

    /// Weakest grade over a set of baselines
    pub fn combine_baselines<'a, I>(&self, baselines: I) -> Confidence
    where
        I: IntoIterator<Item = &'a BaselineWindow>,
    {
        baselines
            .into_iter()
            .map(|b| self.grade_baseline(b))
            .min()
            .unwrap_or(Confidence::Low)
    }
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;
    use chrono::NaiveDate;

    fn window(sample_count: u32) -> BaselineWindow {
        BaselineWindow {
            metric: Metric::Hrv,
            as_of: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            window_days: 28,
            mean: if sample_count > 0 { Some(55.0) } else { None },
            std_dev: None,
            sample_count,
            coverage_ratio: f64::from(sample_count) / 28.0,
        }
    }

    #[test]
    fn test_grade_thresholds() {
        let gate = ConfidenceGate::new();
        assert_eq!(gate.grade(1.0), Confidence::High);
        assert_eq!(gate.grade(0.85), Confidence::High);
        assert_eq!(gate.grade(0.84), Confidence::Medium);
        assert_eq!(gate.grade(0.5), Confidence::Medium);
        assert_eq!(gate.grade(0.49), Confidence::Low);
        assert_eq!(gate.grade(f64::NAN), Confidence::Low);
    }

    #[test]
    fn test_combine_takes_minimum() {
        let gate = ConfidenceGate::new();
        assert_eq!(gate.combine([1.0, 0.6]), Confidence::Medium);
        assert_eq!(gate.combine([1.0, 0.9]), Confidence::High);
        assert_eq!(gate.combine(Vec::<f64>::new()), Confidence::Low);
    }

    #[test]
    fn test_empty_baseline_is_low() {
        let gate = ConfidenceGate::new();
        assert_eq!(gate.grade_baseline(&window(0)), Confidence::Low);
        assert_eq!(gate.grade_baseline(&window(28)), Confidence::High);
        assert_eq!(
            gate.combine_baselines([&window(28), &window(0)]),
            Confidence::Low
        );
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&Confidence::Medium).unwrap(), "\"med\"");
        let parsed: Confidence = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(parsed, Confidence::High);
        assert_eq!(Confidence::Low.to_string(), "low");
    }
}
