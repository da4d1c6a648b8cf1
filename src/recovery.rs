//! Recovery scoring and recommendations
//!
//! Recovery is a broader view than readiness: it blends the overnight
//! biometrics with how the athlete says they feel, their life stress, and
//! the strain of recent training.
//!
//! # Sub-scores
//!
//! All sub-scores live on 0-100, higher meaning better recovered:
//!
//! - **Sleep, HRV, resting HR**: scored exactly as in readiness
//! - **Subjective wellness**: the recorded value
//! - **Stress**: `100 - stress level`
//! - **Training load impact**: 100 while the acute:chronic ratio is at or
//!   below 1.0, falling with every tenth above it; a training stress balance
//!   below -10 pulls it down further. Training below capacity earns no bonus.
//!
//! Missing sub-scores drop out of the weighted mean and the remaining weights
//! are renormalized. Without any wellness or biometric input the engine
//! returns a neutral score with zero confidence instead of guessing.
//!
//! # Recommendations
//!
//! Weak sub-scores map onto a fixed catalog keyed by the underlying cause.
//! HRV and resting HR share one cause (autonomic recovery), so a bad night
//! that shows in both produces a single recommendation. The weakest causes
//! come first and the list is capped. Priority is never stored: it is derived
//! from the recommendation text whenever a caller asks for it.

use crate::acwr::AcwrPoint;
use crate::baseline::{BaselineWindow, Baselines};
use crate::models::DailyMetricPoint;
use crate::pmc::LoadState;
use crate::readiness::ReadinessScorer;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Recovery weights and thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub sleep_weight: f64,
    pub hrv_weight: f64,
    pub rhr_weight: f64,
    pub wellness_weight: f64,
    pub stress_weight: f64,
    pub load_weight: f64,

    /// Sub-scores below this produce a recommendation
    pub weak_threshold: f64,

    /// Sub-scores below this produce the stronger wording
    pub severe_threshold: f64,

    pub max_recommendations: usize,

    /// Score reported when there is nothing to score, also used to fill
    /// missing breakdown entries
    pub neutral_score: u8,

    /// Ratio above which load impact starts to fall
    pub acwr_neutral_ratio: f64,

    /// Load impact points lost per unit of ratio above neutral
    pub acwr_penalty_slope: f64,

    /// TSB below which load impact falls
    pub tsb_floor: f64,

    /// Load impact points lost per TSB point below the floor
    pub tsb_penalty_slope: f64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig {
            sleep_weight: 0.25,
            hrv_weight: 0.25,
            rhr_weight: 0.15,
            wellness_weight: 0.10,
            stress_weight: 0.10,
            load_weight: 0.15,
            weak_threshold: 70.0,
            severe_threshold: 40.0,
            max_recommendations: 3,
            neutral_score: 50,
            acwr_neutral_ratio: 1.0,
            acwr_penalty_slope: 150.0,
            tsb_floor: -10.0,
            tsb_penalty_slope: 2.5,
        }
    }
}

/// Underlying cause a recommendation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecoveryCause {
    SleepDebt,
    /// HRV and resting HR
    AutonomicStrain,
    LowWellness,
    LifeStress,
    TrainingLoad,
}

impl RecoveryCause {
    /// Catalog text for this cause
    pub fn recommendation(&self, severe: bool) -> &'static str {
        match (self, severe) {
            (RecoveryCause::AutonomicStrain, true) => {
                "Take a rest day or a short recovery jog; HRV and resting HR show incomplete recovery."
            }
            (RecoveryCause::AutonomicStrain, false) => {
                "Keep today's session easy and focus on recovery."
            }
            (RecoveryCause::TrainingLoad, true) => {
                "Prioritize recovery; cap intensity until ACWR is back in range."
            }
            (RecoveryCause::TrainingLoad, false) => {
                "Hold or slightly reduce load; avoid stacking hard days."
            }
            (RecoveryCause::SleepDebt, true) => {
                "Sleep was short or poor; plan an early night and move hard work to another day."
            }
            (RecoveryCause::SleepDebt, false) => {
                "Aim for 7-9 hours of sleep tonight to support adaptation."
            }
            (RecoveryCause::LifeStress, true) => {
                "Stress is high; swap intensity for an easy run and some breathing work."
            }
            (RecoveryCause::LifeStress, false) => {
                "Manage stress with a short walk or breathing exercises."
            }
            (RecoveryCause::LowWellness, true) => {
                "Consider a rest day; you reported feeling run down."
            }
            (RecoveryCause::LowWellness, false) => {
                "Check how your legs feel in the warm-up before committing to hard efforts."
            }
        }
    }
}

/// Recommendation shown when every sub-score looks good
pub const MAINTENANCE_RECOMMENDATION: &str =
    "All systems look good. Train as planned and keep your routine consistent.";

/// Recommendation shown when there is no wellness or biometric data
pub const NO_DATA_RECOMMENDATION: &str =
    "Log your sleep, stress and how you feel each morning to get personalized guidance.";

/// Recommendation priority derived from its text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
}

impl RecommendationPriority {
    /// Classify by category keywords: rest/recovery is high, stress/sleep is
    /// medium, anything else is low
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has = |keys: &[&str]| words.iter().any(|w| keys.contains(w));

        if has(&["rest", "recovery", "recover"]) {
            RecommendationPriority::High
        } else if has(&["stress", "sleep"]) {
            RecommendationPriority::Medium
        } else {
            RecommendationPriority::Low
        }
    }
}

impl fmt::Display for RecommendationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationPriority::High => write!(f, "high"),
            RecommendationPriority::Medium => write!(f, "medium"),
            RecommendationPriority::Low => write!(f, "low"),
        }
    }
}

/// Sub-score breakdown as integers on 0-100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryBreakdown {
    pub sleep_score: u8,

    pub hrv_score: u8,

    #[serde(rename = "restingHRScore")]
    pub resting_hr_score: u8,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subjective_wellness_score: Option<u8>,

    pub training_load_impact: u8,

    /// Recorded stress level (0-100, higher is more stressed)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stress_level: Option<u8>,
}

/// Recovery assessment for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRecommendation {
    pub date: NaiveDate,

    pub recovery_score: u8,

    /// Data coverage behind the score (0-100)
    pub confidence: u8,

    pub breakdown: RecoveryBreakdown,

    pub recommendations: Vec<String>,

    /// Inputs that were missing and filled with neutral values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub limitations: Vec<String>,
}

impl RecoveryRecommendation {
    /// Recommendations paired with their derived priority, in list order
    pub fn prioritized(&self) -> Vec<(RecommendationPriority, &str)> {
        self.recommendations
            .iter()
            .map(|text| (RecommendationPriority::classify(text), text.as_str()))
            .collect()
    }
}

/// Everything the recovery engine reads for one day
#[derive(Debug, Clone, Copy)]
pub struct RecoveryInputs<'a> {
    pub date: NaiveDate,
    pub today: Option<&'a DailyMetricPoint>,
    pub baselines: &'a Baselines,
    pub acwr: &'a AcwrPoint,
    pub load_state: Option<&'a LoadState>,
}

#[derive(Debug, Default)]
struct SubScores {
    sleep: Option<f64>,
    hrv: Option<f64>,
    rhr: Option<f64>,
    wellness: Option<f64>,
    stress: Option<f64>,
    load: f64,
}

impl SubScores {
    fn has_wellness_or_biometrics(&self) -> bool {
        self.sleep.is_some()
            || self.hrv.is_some()
            || self.rhr.is_some()
            || self.wellness.is_some()
            || self.stress.is_some()
    }
}

/// Recovery recommendation engine
pub struct RecoveryRecommendationEngine {
    config: RecoveryConfig,
    scorer: ReadinessScorer,
}

impl RecoveryRecommendationEngine {
    pub fn new() -> Self {
        RecoveryRecommendationEngine {
            config: RecoveryConfig::default(),
            scorer: ReadinessScorer::new(),
        }
    }

    /// The readiness scorer supplies the shared sleep/HRV/RHR mapping
    pub fn with_config(config: RecoveryConfig, scorer: ReadinessScorer) -> Self {
        RecoveryRecommendationEngine { config, scorer }
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Training load impact from the workload ratio and form
    pub fn training_load_impact(&self, ratio: Option<f64>, tsb: Option<f64>) -> f64 {
        let mut impact = 100.0;

        if let Some(ratio) = ratio {
            if ratio > self.config.acwr_neutral_ratio {
                impact = 100.0 - (ratio - self.config.acwr_neutral_ratio) * self.config.acwr_penalty_slope;
            }
        }

        if let Some(tsb) = tsb {
            if tsb < self.config.tsb_floor {
                let form_impact = 100.0 + (tsb - self.config.tsb_floor) * self.config.tsb_penalty_slope;
                impact = impact.min(form_impact);
            }
        }

        impact.clamp(0.0, 100.0)
    }

    /// Assess recovery for one day
    pub fn assess(&self, inputs: RecoveryInputs<'_>) -> RecoveryRecommendation {
        let subs = self.sub_scores(&inputs);
        let confidence = self.confidence(&inputs);
        let breakdown = self.breakdown(&subs, inputs.today);

        if !subs.has_wellness_or_biometrics() {
            debug!(date = %inputs.date, "no wellness or biometric inputs, using neutral default");
            return RecoveryRecommendation {
                date: inputs.date,
                recovery_score: self.config.neutral_score,
                confidence: 0,
                breakdown,
                recommendations: vec![NO_DATA_RECOMMENDATION.to_string()],
                limitations: vec!["No wellness or biometric data for this day".to_string()],
            };
        }

        let weighted = [
            (subs.sleep, self.config.sleep_weight),
            (subs.hrv, self.config.hrv_weight),
            (subs.rhr, self.config.rhr_weight),
            (subs.wellness, self.config.wellness_weight),
            (subs.stress, self.config.stress_weight),
            (Some(subs.load), self.config.load_weight),
        ];
        let (sum, total_weight) = weighted
            .iter()
            .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
            .fold((0.0, 0.0), |(sum, total), (s, w)| (sum + s, total + w));

        let recovery_score = if total_weight > 0.0 && sum.is_finite() {
            to_score(sum / total_weight)
        } else {
            self.config.neutral_score
        };

        let recommendations = self.recommendations(&subs);
        let limitations = self.limitations(&subs);

        debug!(
            date = %inputs.date,
            recovery_score,
            confidence,
            recommendations = recommendations.len(),
            "recovery assessed"
        );

        RecoveryRecommendation {
            date: inputs.date,
            recovery_score,
            confidence,
            breakdown,
            recommendations,
            limitations,
        }
    }

    fn sub_scores(&self, inputs: &RecoveryInputs<'_>) -> SubScores {
        let load = self.training_load_impact(inputs.acwr.ratio, inputs.load_state.map(|s| s.tsb()));

        let Some(point) = inputs.today else {
            return SubScores {
                load,
                ..SubScores::default()
            };
        };

        SubScores {
            sleep: self.scorer.sleep_component(point).map(|(score, _)| score),
            hrv: self.scorer.hrv_component(point, &inputs.baselines.hrv).map(|(score, _)| score),
            rhr: self
                .scorer
                .rhr_component(point, &inputs.baselines.resting_hr)
                .map(|(score, _)| score),
            wellness: point.subjective_wellness.map(|w| f64::from(w).min(100.0)),
            stress: point.stress_level.map(|s| 100.0 - f64::from(s).min(100.0)),
            load,
        }
    }

    /// Mean coverage of the six inputs, as 0-100
    fn confidence(&self, inputs: &RecoveryInputs<'_>) -> u8 {
        let present = |value: bool| if value { 1.0 } else { 0.0 };
        let biometric = |value: Option<f64>, baseline: &BaselineWindow| match value {
            Some(_) if !baseline.is_empty() => baseline.coverage_ratio.clamp(0.0, 1.0),
            _ => 0.0,
        };

        let today = inputs.today;
        let coverages = [
            present(today.map_or(false, |p| p.sleep_score.is_some() || p.sleep_hours.is_some())),
            present(today.map_or(false, |p| p.subjective_wellness.is_some())),
            present(today.map_or(false, |p| p.stress_level.is_some())),
            biometric(today.and_then(|p| p.hrv_ms), &inputs.baselines.hrv),
            biometric(today.and_then(|p| p.resting_hr), &inputs.baselines.resting_hr),
            inputs.acwr.coverage_ratio.clamp(0.0, 1.0),
        ];

        to_score(coverages.iter().sum::<f64>() / coverages.len() as f64 * 100.0)
    }

    fn breakdown(&self, subs: &SubScores, today: Option<&DailyMetricPoint>) -> RecoveryBreakdown {
        let neutral = self.config.neutral_score;
        RecoveryBreakdown {
            sleep_score: subs.sleep.map_or(neutral, to_score),
            hrv_score: subs.hrv.map_or(neutral, to_score),
            resting_hr_score: subs.rhr.map_or(neutral, to_score),
            subjective_wellness_score: subs.wellness.map(to_score),
            training_load_impact: to_score(subs.load),
            stress_level: today.and_then(|p| p.stress_level).map(|s| s.min(100)),
        }
    }

    fn limitations(&self, subs: &SubScores) -> Vec<String> {
        let mut limitations = Vec::new();
        if subs.sleep.is_none() {
            limitations.push("Sleep data unavailable; sleep score shown as neutral".to_string());
        }
        if subs.hrv.is_none() {
            limitations.push("HRV reading or baseline unavailable; HRV score shown as neutral".to_string());
        }
        if subs.rhr.is_none() {
            limitations.push(
                "Resting HR reading or baseline unavailable; resting HR score shown as neutral"
                    .to_string(),
            );
        }
        limitations
    }

    fn recommendations(&self, subs: &SubScores) -> Vec<String> {
        let mut weak: Vec<(RecoveryCause, f64)> = [
            (RecoveryCause::SleepDebt, subs.sleep),
            (RecoveryCause::AutonomicStrain, subs.hrv),
            (RecoveryCause::AutonomicStrain, subs.rhr),
            (RecoveryCause::LowWellness, subs.wellness),
            (RecoveryCause::LifeStress, subs.stress),
            (RecoveryCause::TrainingLoad, Some(subs.load)),
        ]
        .into_iter()
        .filter_map(|(cause, score)| score.map(|s| (cause, s)))
        .filter(|(_, score)| *score < self.config.weak_threshold)
        .collect();

        weak.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut seen: Vec<RecoveryCause> = Vec::new();
        let mut recommendations = Vec::new();
        for (cause, score) in weak {
            if seen.contains(&cause) {
                continue;
            }
            seen.push(cause);
            recommendations.push(
                cause
                    .recommendation(score < self.config.severe_threshold)
                    .to_string(),
            );
            if recommendations.len() >= self.config.max_recommendations {
                break;
            }
        }

        if recommendations.is_empty() {
            recommendations.push(MAINTENANCE_RECOMMENDATION.to_string());
        }
        recommendations
    }
}

impl Default for RecoveryRecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn to_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
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

    fn baselines() -> Baselines {
        Baselines {
            hrv: window(Metric::Hrv, Some(50.0), 28),
            resting_hr: window(Metric::RestingHr, Some(50.0), 28),
        }
    }

    fn empty_baselines() -> Baselines {
        Baselines {
            hrv: window(Metric::Hrv, None, 0),
            resting_hr: window(Metric::RestingHr, None, 0),
        }
    }

    fn acwr(ratio: Option<f64>, coverage: f64) -> AcwrPoint {
        AcwrPoint {
            date: date(),
            acute_7d: ratio.unwrap_or(0.0) * 50.0,
            chronic_28d: if ratio.is_some() { 50.0 } else { 0.0 },
            ratio,
            band: None,
            coverage_ratio: coverage,
        }
    }

    fn good_day() -> DailyMetricPoint {
        let mut point = DailyMetricPoint::empty(date());
        point.hrv_ms = Some(55.0);
        point.resting_hr = Some(48.0);
        point.sleep_score = Some(90);
        point.subjective_wellness = Some(85);
        point.stress_level = Some(20);
        point
    }

    #[test]
    fn test_no_data_neutral_default() {
        let engine = RecoveryRecommendationEngine::new();
        let baselines = empty_baselines();
        let acwr = acwr(None, 0.0);
        let result = engine.assess(RecoveryInputs {
            date: date(),
            today: None,
            baselines: &baselines,
            acwr: &acwr,
            load_state: None,
        });

        assert_eq!(result.recovery_score, 50);
        assert_eq!(result.confidence, 0);
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0], NO_DATA_RECOMMENDATION);
        assert_eq!(result.breakdown.sleep_score, 50);
        assert_eq!(result.breakdown.training_load_impact, 100);
    }

    #[test]
    fn test_good_day_maintenance() {
        let engine = RecoveryRecommendationEngine::new();
        let baselines = baselines();
        let acwr = acwr(Some(1.0), 1.0);
        let today = good_day();
        let result = engine.assess(RecoveryInputs {
            date: date(),
            today: Some(&today),
            baselines: &baselines,
            acwr: &acwr,
            load_state: None,
        });

        assert!(result.recovery_score >= 80);
        assert_eq!(result.confidence, 100);
        assert_eq!(result.recommendations, vec![MAINTENANCE_RECOMMENDATION.to_string()]);
        assert_eq!(result.breakdown.stress_level, Some(20));
        assert!(result.limitations.is_empty());
    }

    #[test]
    fn test_autonomic_cause_deduplicated() {
        let engine = RecoveryRecommendationEngine::new();
        let baselines = baselines();
        let acwr = acwr(Some(1.0), 1.0);
        let mut today = good_day();
        today.hrv_ms = Some(45.0);
        today.resting_hr = Some(54.0);

        let result = engine.assess(RecoveryInputs {
            date: date(),
            today: Some(&today),
            baselines: &baselines,
            acwr: &acwr,
            load_state: None,
        });

        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(
            result.recommendations[0],
            RecoveryCause::AutonomicStrain.recommendation(true)
        );
        assert_eq!(result.breakdown.hrv_score, 45);
        assert_eq!(result.breakdown.resting_hr_score, 35);
    }

    #[test]
    fn test_weakest_first_and_capped() {
        let engine = RecoveryRecommendationEngine::new();
        let baselines = baselines();
        let acwr = acwr(Some(1.6), 1.0);
        let mut today = good_day();
        today.sleep_score = Some(30);
        today.stress_level = Some(80);
        today.subjective_wellness = Some(60);
        today.hrv_ms = Some(45.0);

        let result = engine.assess(RecoveryInputs {
            date: date(),
            today: Some(&today),
            baselines: &baselines,
            acwr: &acwr,
            load_state: None,
        });

        // stress 20, sleep 30, load 10, wellness 60, hrv 45
        assert_eq!(result.recommendations.len(), 3);
        assert_eq!(result.recommendations[0], RecoveryCause::TrainingLoad.recommendation(true));
        assert_eq!(result.recommendations[1], RecoveryCause::LifeStress.recommendation(true));
        assert_eq!(result.recommendations[2], RecoveryCause::SleepDebt.recommendation(true));
    }

    #[test]
    fn test_training_load_impact() {
        let engine = RecoveryRecommendationEngine::new();
        assert_eq!(engine.training_load_impact(None, None), 100.0);
        assert_eq!(engine.training_load_impact(Some(0.6), None), 100.0);
        assert_eq!(engine.training_load_impact(Some(1.0), None), 100.0);
        assert!((engine.training_load_impact(Some(1.2), None) - 70.0).abs() < 1e-9);
        assert_eq!(engine.training_load_impact(Some(2.0), None), 0.0);
        assert!((engine.training_load_impact(Some(1.0), Some(-20.0)) - 75.0).abs() < 1e-9);
        assert_eq!(engine.training_load_impact(None, Some(5.0)), 100.0);
    }

    #[test]
    fn test_tsb_lowers_score() {
        let engine = RecoveryRecommendationEngine::new();
        let baselines = baselines();
        let acwr = acwr(Some(1.0), 1.0);
        let today = good_day();
        let fresh = LoadState::new(date(), 50.0, 45.0);
        let fatigued = LoadState::new(date(), 50.0, 90.0);

        let assess = |state: &LoadState| {
            engine.assess(RecoveryInputs {
                date: date(),
                today: Some(&today),
                baselines: &baselines,
                acwr: &acwr,
                load_state: Some(state),
            })
        };

        assert!(assess(&fatigued).recovery_score < assess(&fresh).recovery_score);
        assert_eq!(assess(&fatigued).breakdown.training_load_impact, 25);
    }

    #[test]
    fn test_missing_biometrics_fill_neutral_with_limitations() {
        let engine = RecoveryRecommendationEngine::new();
        let baselines = empty_baselines();
        let acwr = acwr(None, 0.0);
        let mut today = DailyMetricPoint::empty(date());
        today.subjective_wellness = Some(80);

        let result = engine.assess(RecoveryInputs {
            date: date(),
            today: Some(&today),
            baselines: &baselines,
            acwr: &acwr,
            load_state: None,
        });

        assert_eq!(result.breakdown.hrv_score, 50);
        assert_eq!(result.breakdown.subjective_wellness_score, Some(80));
        assert_eq!(result.limitations.len(), 3);
        // wellness 80 * 0.10 + load 100 * 0.15 over 0.25
        assert_eq!(result.recovery_score, 92);
        // one of six inputs present
        assert_eq!(result.confidence, 17);
    }

    #[test]
    fn test_priority_classification() {
        use RecommendationPriority::*;
        assert_eq!(RecommendationPriority::classify("Take a rest day."), High);
        assert_eq!(RecommendationPriority::classify("Focus on recovery"), High);
        assert_eq!(RecommendationPriority::classify("Manage stress today"), Medium);
        assert_eq!(RecommendationPriority::classify("More SLEEP please"), Medium);
        assert_eq!(RecommendationPriority::classify("Restore your interest"), Low);
        assert_eq!(RecommendationPriority::classify(MAINTENANCE_RECOMMENDATION), Low);
    }

    #[test]
    fn test_catalog_priorities() {
        assert_eq!(
            RecommendationPriority::classify(RecoveryCause::AutonomicStrain.recommendation(false)),
            RecommendationPriority::High
        );
        assert_eq!(
            RecommendationPriority::classify(RecoveryCause::SleepDebt.recommendation(false)),
            RecommendationPriority::Medium
        );
        assert_eq!(
            RecommendationPriority::classify(RecoveryCause::TrainingLoad.recommendation(false)),
            RecommendationPriority::Low
        );
    }

    #[test]
    fn test_json_shape() {
        let engine = RecoveryRecommendationEngine::new();
        let baselines = baselines();
        let acwr = acwr(Some(1.0), 1.0);
        let today = good_day();
        let result = engine.assess(RecoveryInputs {
            date: date(),
            today: Some(&today),
            baselines: &baselines,
            acwr: &acwr,
            load_state: None,
        });

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["recoveryScore"].is_number());
        assert!(json["breakdown"]["restingHRScore"].is_number());
        assert!(json["breakdown"]["trainingLoadImpact"].is_number());
        assert!(json["recommendations"].is_array());
        assert!(json.get("limitations").is_none());
    }
}
