//! Daily training readiness
//!
//! Readiness answers "how hard can I train today?" on a 0-100 scale by
//! comparing this morning's biometrics against the athlete's own history.
//!
//! # Scoring
//!
//! Each signal maps onto 0-100 with a linear ramp that saturates at the ends:
//!
//! - **Sleep**: the night's sleep score, or hours slept relative to an 8 hour
//!   target when no score was recorded
//! - **HRV**: `neutral + d * hrv_slope` with `d = (today - baseline) / baseline`.
//!   HRV above baseline indicates parasympathetic recovery.
//! - **Resting HR**: `neutral + d * rhr_slope` with the deviation inverted,
//!   `d = (baseline - today) / baseline`. An elevated morning heart rate is
//!   one of the earliest signs of accumulated fatigue or illness.
//!
//! The weighted mean of the available components is clamped and rounded.
//! Signals without a reading or baseline drop out and the remaining weights
//! are renormalized.
//!
//! # Labels
//!
//! | Score  | Label      |
//! |--------|------------|
//! | 80-100 | Fresh      |
//! | 60-79  | Optimal    |
//! | 40-59  | Tired      |
//! | 0-39   | Very Tired |
//!
//! ```rust
//! use readyrs::readiness::{ReadinessLabel, ReadinessScorer};
//!
//! let scorer = ReadinessScorer::new();
//! assert_eq!(scorer.label_for(82), ReadinessLabel::Fresh);
//! assert_eq!(scorer.label_for(39), ReadinessLabel::VeryTired);
//! ```

use crate::baseline::{BaselineWindow, Baselines};
use crate::confidence::{Confidence, ConfidenceGate};
use crate::models::DailyMetricPoint;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Readiness weights, slopes and label cut points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub sleep_weight: f64,
    pub hrv_weight: f64,
    pub rhr_weight: f64,

    /// Component value when today matches the baseline
    pub neutral_score: f64,

    /// Points per unit of relative HRV deviation
    pub hrv_slope: f64,

    /// Points per unit of relative resting HR deviation (inverted)
    pub rhr_slope: f64,

    /// Sleep duration that maps to a full sleep component
    pub sleep_target_hours: f64,

    /// Score reported when no component is available
    pub default_score: u8,

    pub fresh_min: u8,
    pub optimal_min: u8,
    pub tired_min: u8,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        ReadinessConfig {
            sleep_weight: 0.35,
            hrv_weight: 0.40,
            rhr_weight: 0.25,
            neutral_score: 75.0,
            hrv_slope: 300.0,
            rhr_slope: 500.0,
            sleep_target_hours: 8.0,
            default_score: 50,
            fresh_min: 80,
            optimal_min: 60,
            tired_min: 40,
        }
    }
}

/// Readiness label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessLabel {
    Fresh,
    Optimal,
    Tired,
    #[serde(rename = "Very Tired")]
    VeryTired,
}

impl fmt::Display for ReadinessLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessLabel::Fresh => write!(f, "Fresh"),
            ReadinessLabel::Optimal => write!(f, "Optimal"),
            ReadinessLabel::Tired => write!(f, "Tired"),
            ReadinessLabel::VeryTired => write!(f, "Very Tired"),
        }
    }
}

/// Signals feeding the readiness score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Signal {
    Sleep,
    Hrv,
    RestingHr,
}

/// One scored signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessComponent {
    pub signal: Signal,

    /// Component value on 0-100
    pub score: f64,

    /// Renormalized weight actually applied
    pub weight: f64,

    /// Relative deviation from baseline (HRV, resting HR) or from the sleep
    /// target; for resting HR a positive value means a higher heart rate
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deviation: Option<f64>,
}

/// Readiness for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResult {
    pub date: NaiveDate,
    pub score: u8,
    pub label: ReadinessLabel,
    pub confidence: Confidence,
    pub why_line: String,
    #[serde(default)]
    pub components: Vec<ReadinessComponent>,
}

/// Pure readiness scorer
pub struct ReadinessScorer {
    config: ReadinessConfig,
    gate: ConfidenceGate,
}

impl ReadinessScorer {
    pub fn new() -> Self {
        ReadinessScorer {
            config: ReadinessConfig::default(),
            gate: ConfidenceGate::new(),
        }
    }

    pub fn with_config(config: ReadinessConfig, gate: ConfidenceGate) -> Self {
        ReadinessScorer { config, gate }
    }

    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// Sleep component from the sleep score, falling back to hours slept
    pub fn sleep_component(&self, point: &DailyMetricPoint) -> Option<(f64, Option<f64>)> {
        if let Some(score) = point.sleep_score {
            return Some((f64::from(score).min(100.0), None));
        }

        let hours = point.sleep_hours?;
        if self.config.sleep_target_hours <= 0.0 {
            return None;
        }
        let ratio = hours / self.config.sleep_target_hours;
        Some(((ratio * 100.0).clamp(0.0, 100.0), Some(ratio - 1.0)))
    }

    /// HRV component and its relative deviation
    pub fn hrv_component(
        &self,
        point: &DailyMetricPoint,
        baseline: &BaselineWindow,
    ) -> Option<(f64, f64)> {
        let today = point.hrv_ms?;
        let deviation = baseline.relative_deviation(today)?;
        let score = self.config.neutral_score + deviation * self.config.hrv_slope;
        Some((score.clamp(0.0, 100.0), deviation))
    }

    /// Resting HR component; the returned deviation is `(today - base) / base`
    pub fn rhr_component(
        &self,
        point: &DailyMetricPoint,
        baseline: &BaselineWindow,
    ) -> Option<(f64, f64)> {
        let today = point.resting_hr?;
        let deviation = baseline.relative_deviation(today)?;
        let score = self.config.neutral_score - deviation * self.config.rhr_slope;
        Some((score.clamp(0.0, 100.0), deviation))
    }

    /// Label for an integer score
    pub fn label_for(&self, score: u8) -> ReadinessLabel {
        if score >= self.config.fresh_min {
            ReadinessLabel::Fresh
        } else if score >= self.config.optimal_min {
            ReadinessLabel::Optimal
        } else if score >= self.config.tired_min {
            ReadinessLabel::Tired
        } else {
            ReadinessLabel::VeryTired
        }
    }

    /// Score `today` against the baselines
    pub fn score(
        &self,
        date: NaiveDate,
        today: Option<&DailyMetricPoint>,
        baselines: &Baselines,
    ) -> ReadinessResult {
        let mut components = Vec::with_capacity(3);
        if let Some(point) = today {
            if let Some((score, deviation)) = self.sleep_component(point) {
                components.push(ReadinessComponent {
                    signal: Signal::Sleep,
                    score,
                    weight: self.config.sleep_weight,
                    deviation,
                });
            }
            if let Some((score, deviation)) = self.hrv_component(point, &baselines.hrv) {
                components.push(ReadinessComponent {
                    signal: Signal::Hrv,
                    score,
                    weight: self.config.hrv_weight,
                    deviation: Some(deviation),
                });
            }
            if let Some((score, deviation)) = self.rhr_component(point, &baselines.resting_hr) {
                components.push(ReadinessComponent {
                    signal: Signal::RestingHr,
                    score,
                    weight: self.config.rhr_weight,
                    deviation: Some(deviation),
                });
            }
        }

        let confidence = self.confidence(today, baselines);

        let total_weight: f64 = components.iter().map(|c| c.weight).sum();
        if components.is_empty() || total_weight <= 0.0 {
            debug!(%date, "no readiness inputs, using neutral default");
            return ReadinessResult {
                date,
                score: self.config.default_score,
                label: self.label_for(self.config.default_score),
                confidence: Confidence::Low,
                why_line: "Not enough data yet. Log sleep, HRV or resting HR to personalize readiness."
                    .to_string(),
                components: Vec::new(),
            };
        }

        for component in &mut components {
            component.weight /= total_weight;
        }

        let raw: f64 = components.iter().map(|c| c.score * c.weight).sum();
        let score = if raw.is_finite() {
            raw.clamp(0.0, 100.0).round() as u8
        } else {
            self.config.default_score
        };

        let why_line = self.why_line(&components, baselines);
        debug!(%date, raw, score, ?confidence, "readiness scored");

        ReadinessResult {
            date,
            score,
            label: self.label_for(score),
            confidence,
            why_line,
            components,
        }
    }

    /// Weakest baseline behind the signals recorded today
    ///
    /// A reading whose baseline has no samples grades low. Sleep carries no
    /// baseline, so a day with only sleep grades low as well.
    fn confidence(&self, today: Option<&DailyMetricPoint>, baselines: &Baselines) -> Confidence {
        let Some(point) = today else {
            return Confidence::Low;
        };
        let graded = [
            (point.hrv_ms.is_some(), &baselines.hrv),
            (point.resting_hr.is_some(), &baselines.resting_hr),
        ];
        self.gate.combine_baselines(
            graded
                .into_iter()
                .filter_map(|(recorded, baseline)| recorded.then_some(baseline)),
        )
    }

    /// Explain the component furthest from neutral
    fn why_line(&self, components: &[ReadinessComponent], baselines: &Baselines) -> String {
        let neutral = self.config.neutral_score;
        let Some(driver) = components.iter().max_by(|a, b| {
            (a.score - neutral)
                .abs()
                .total_cmp(&(b.score - neutral).abs())
        }) else {
            return String::new();
        };

        match driver.signal {
            Signal::Hrv => {
                let days = baselines.hrv.window_days;
                match driver.deviation.map(percent) {
                    Some(0) | None => format!("HRV is in line with your {}-day baseline.", days),
                    Some(pct) if pct > 0 => {
                        format!("HRV is {}% above your {}-day baseline.", pct, days)
                    }
                    Some(pct) => format!("HRV is {}% below your {}-day baseline.", -pct, days),
                }
            }
            Signal::RestingHr => {
                let days = baselines.resting_hr.window_days;
                match driver.deviation.map(percent) {
                    Some(0) | None => {
                        format!("Resting HR is in line with your {}-day baseline.", days)
                    }
                    Some(pct) if pct > 0 => {
                        format!("Resting HR is {}% above your {}-day baseline.", pct, days)
                    }
                    Some(pct) => {
                        format!("Resting HR is {}% below your {}-day baseline.", -pct, days)
                    }
                }
            }
            Signal::Sleep => match driver.deviation {
                Some(deviation) => format!(
                    "You slept {:.1}h against a {:.0}h target.",
                    (1.0 + deviation) * self.config.sleep_target_hours,
                    self.config.sleep_target_hours
                ),
                None if driver.score >= neutral => {
                    format!("Sleep score of {:.0} supports training today.", driver.score)
                }
                None => format!("Sleep score of {:.0} is holding readiness back.", driver.score),
            },
        }
    }
}

impl Default for ReadinessScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(deviation: f64) -> i64 {
    (deviation * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 29).unwrap()
    }

    fn window(metric: Metric, mean: Option<f64>, samples: u32) -> BaselineWindow {
        BaselineWindow {
            metric,
            as_of: date(),
            window_days: 28,
            mean,
            std_dev: None,
            sample_count: samples,
            coverage_ratio: f64::from(samples) / 28.0,
        }
    }

    fn full_baselines(hrv: f64, rhr: f64) -> Baselines {
        Baselines {
            hrv: window(Metric::Hrv, Some(hrv), 28),
            resting_hr: window(Metric::RestingHr, Some(rhr), 28),
        }
    }

    fn point(hrv: Option<f64>, rhr: Option<f64>, sleep: Option<u8>) -> DailyMetricPoint {
        let mut point = DailyMetricPoint::empty(date());
        point.hrv_ms = hrv;
        point.resting_hr = rhr;
        point.sleep_score = sleep;
        point
    }

    #[test]
    fn test_on_baseline_day_scores_neutral() {
        let scorer = ReadinessScorer::new();
        let today = point(Some(50.0), Some(50.0), Some(75));
        let result = scorer.score(date(), Some(&today), &full_baselines(50.0, 50.0));

        assert_eq!(result.score, 75);
        assert_eq!(result.label, ReadinessLabel::Optimal);
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.components.len(), 3);
    }

    #[test]
    fn test_hrv_drop_lowers_score() {
        let scorer = ReadinessScorer::new();
        let baselines = full_baselines(50.0, 50.0);

        let normal = scorer.score(date(), Some(&point(Some(50.0), None, None)), &baselines);
        let suppressed = scorer.score(date(), Some(&point(Some(40.0), None, None)), &baselines);

        assert!(suppressed.score < normal.score);
        // 75 - 0.2 * 300
        assert_eq!(suppressed.score, 15);
        assert_eq!(suppressed.why_line, "HRV is 20% below your 28-day baseline.");
    }

    #[test]
    fn test_elevated_rhr_is_penalized() {
        let scorer = ReadinessScorer::new();
        let baselines = full_baselines(50.0, 50.0);
        let result = scorer.score(date(), Some(&point(None, Some(55.0), None)), &baselines);

        // 75 - 0.1 * 500
        assert_eq!(result.score, 25);
        assert_eq!(result.label, ReadinessLabel::VeryTired);
        assert!(result.why_line.contains("Resting HR is 10% above"));
    }

    #[test]
    fn test_components_saturate() {
        let scorer = ReadinessScorer::new();
        let baselines = full_baselines(50.0, 50.0);
        let result = scorer.score(date(), Some(&point(Some(100.0), Some(40.0), Some(100))), &baselines);

        assert_eq!(result.score, 100);
        assert!(result.components.iter().all(|c| c.score <= 100.0));
    }

    #[test]
    fn test_missing_components_renormalize() {
        let scorer = ReadinessScorer::new();
        let baselines = full_baselines(50.0, 50.0);
        let result = scorer.score(date(), Some(&point(None, None, Some(90))), &baselines);

        assert_eq!(result.score, 90);
        assert_eq!(result.components.len(), 1);
        assert!((result.components[0].weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sleep_hours_fallback() {
        let scorer = ReadinessScorer::new();
        let mut today = DailyMetricPoint::empty(date());
        today.sleep_hours = Some(6.0);

        let result = scorer.score(date(), Some(&today), &full_baselines(50.0, 50.0));
        assert_eq!(result.score, 75);
        assert_eq!(result.why_line, "You slept 6.0h against a 8h target.");
    }

    #[test]
    fn test_no_data_neutral_default() {
        let scorer = ReadinessScorer::new();
        let baselines = Baselines {
            hrv: window(Metric::Hrv, None, 0),
            resting_hr: window(Metric::RestingHr, None, 0),
        };
        let result = scorer.score(date(), None, &baselines);

        assert_eq!(result.score, 50);
        assert_eq!(result.label, ReadinessLabel::Tired);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.components.is_empty());
    }

    #[test]
    fn test_baseline_without_samples_drops_component() {
        let scorer = ReadinessScorer::new();
        let baselines = Baselines {
            hrv: window(Metric::Hrv, None, 0),
            resting_hr: window(Metric::RestingHr, Some(50.0), 28),
        };
        let result = scorer.score(date(), Some(&point(Some(60.0), Some(50.0), None)), &baselines);

        assert_eq!(result.components.len(), 1);
        assert_eq!(result.components[0].signal, Signal::RestingHr);
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_confidence_ignores_signals_not_recorded_today() {
        let scorer = ReadinessScorer::new();
        let baselines = Baselines {
            hrv: window(Metric::Hrv, Some(50.0), 28),
            resting_hr: window(Metric::RestingHr, Some(50.0), 5),
        };

        let hrv_only = scorer.score(date(), Some(&point(Some(50.0), None, Some(80))), &baselines);
        assert_eq!(hrv_only.confidence, Confidence::High);

        let with_rhr = scorer.score(date(), Some(&point(Some(50.0), Some(50.0), Some(80))), &baselines);
        assert_eq!(with_rhr.confidence, Confidence::Low);
    }

    #[test]
    fn test_sleep_only_grades_low() {
        let scorer = ReadinessScorer::new();
        let result = scorer.score(date(), Some(&point(None, None, Some(90))), &full_baselines(50.0, 50.0));

        assert_eq!(result.score, 90);
        assert_eq!(result.components.len(), 1);
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_rounding_not_truncation() {
        let scorer = ReadinessScorer::new();
        let mut today = DailyMetricPoint::empty(date());
        // 7.0 / 8.0 * 100 = 87.5
        today.sleep_hours = Some(7.0);
        let result = scorer.score(date(), Some(&today), &full_baselines(50.0, 50.0));
        assert_eq!(result.score, 88);
    }

    #[test]
    fn test_labels() {
        let scorer = ReadinessScorer::new();
        assert_eq!(scorer.label_for(100), ReadinessLabel::Fresh);
        assert_eq!(scorer.label_for(80), ReadinessLabel::Fresh);
        assert_eq!(scorer.label_for(79), ReadinessLabel::Optimal);
        assert_eq!(scorer.label_for(60), ReadinessLabel::Optimal);
        assert_eq!(scorer.label_for(59), ReadinessLabel::Tired);
        assert_eq!(scorer.label_for(40), ReadinessLabel::Tired);
        assert_eq!(scorer.label_for(0), ReadinessLabel::VeryTired);
    }

    #[test]
    fn test_json_shape() {
        let scorer = ReadinessScorer::new();
        let today = point(Some(50.0), Some(50.0), None);
        let result = scorer.score(date(), Some(&today), &full_baselines(50.0, 50.0));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["date"], "2024-04-29");
        assert_eq!(json["label"], "Optimal");
        assert_eq!(json["confidence"], "high");
        assert!(json["whyLine"].is_string());
        assert_eq!(json["score"], 75);
    }
}
