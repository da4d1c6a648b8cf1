//! Engine facade
//!
//! [`ReadinessEngine`] wires the aggregator, baselines, load model, ACWR,
//! readiness and recovery scorers into single calls. It owns no user data:
//! every call borrows a history and returns freshly allocated results, so
//! one engine can be shared across threads.

use crate::acwr::{AcwrCalculator, AcwrPoint};
use crate::aggregation::{local_day, AggregatedHistory, DailyMetricAggregator, ValidationIssue};
use crate::baseline::{BaselineEstimator, BaselineWindow, Baselines};
use crate::cache::{BaselineKey, EngineCache};
use crate::config::EngineConfig;
use crate::confidence::ConfidenceGate;
use crate::error::{EngineError, Result};
use crate::models::{Metric, UserHistory};
use crate::pmc::{LoadState, PmcPoint, TrainingLoadModel, TsbInterpretation};
use crate::readiness::{ReadinessResult, ReadinessScorer};
use crate::recovery::{RecoveryInputs, RecoveryRecommendation, RecoveryRecommendationEngine};
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Everything the engine derives for one user and day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineReport {
    pub user_id: String,
    pub date: NaiveDate,
    pub readiness: ReadinessResult,
    pub baselines: Baselines,

    /// `None` before the first recorded activity
    pub load: Option<LoadState>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<TsbInterpretation>,

    pub acwr: AcwrPoint,
    pub recovery: RecoveryRecommendation,

    /// Fields and records dropped while aggregating the history
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total_users: usize,
    pub successful_users: usize,
    pub failed_users: usize,
    pub total_duration_ms: u128,
    pub reports: Vec<EngineReport>,

    /// `(user_id, error message)` for every failed user
    pub failures: Vec<(String, String)>,
}

/// Readiness and load analytics for one or many users
pub struct ReadinessEngine {
    config: EngineConfig,
    aggregator: DailyMetricAggregator,
    baselines: BaselineEstimator,
    load_model: TrainingLoadModel,
    acwr: AcwrCalculator,
    readiness: ReadinessScorer,
    recovery: RecoveryRecommendationEngine,
}

impl ReadinessEngine {
    /// Engine with the default policy
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    /// Engine with a validated custom policy
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        let scorer = || {
            ReadinessScorer::with_config(
                config.readiness.clone(),
                ConfidenceGate::with_config(config.confidence.clone()),
            )
        };

        ReadinessEngine {
            aggregator: DailyMetricAggregator::with_config(config.aggregation.clone()),
            baselines: BaselineEstimator::with_config(config.baseline.clone()),
            load_model: TrainingLoadModel::with_config(config.pmc.clone()),
            acwr: AcwrCalculator::with_config(config.acwr.clone()),
            readiness: scorer(),
            recovery: RecoveryRecommendationEngine::with_config(config.recovery.clone(), scorer()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fold a history into daily points and activity loads
    pub fn aggregate(&self, history: &UserHistory) -> AggregatedHistory {
        self.aggregator.aggregate(history)
    }

    /// Full report for `as_of`
    #[instrument(skip(self, history), fields(user_id = %history.user_id))]
    pub fn analyze(&self, history: &UserHistory, as_of: NaiveDate) -> Result<EngineReport> {
        self.analyze_inner(history, as_of, None)
    }

    /// Full report for `as_of`, reusing and refreshing `cache`
    #[instrument(skip(self, history, cache), fields(user_id = %history.user_id))]
    pub fn analyze_with_cache(
        &self,
        history: &UserHistory,
        as_of: NaiveDate,
        cache: &EngineCache,
    ) -> Result<EngineReport> {
        self.analyze_inner(history, as_of, Some(cache))
    }

    /// Analyze many users in parallel
    #[instrument(skip(self, histories), fields(users = histories.len()))]
    pub fn analyze_batch(&self, histories: &[UserHistory], as_of: NaiveDate) -> BatchReport {
        let start_time = Instant::now();

        let outcomes: Vec<(String, Result<EngineReport>)> = histories
            .par_iter()
            .map(|history| (history.user_id.clone(), self.analyze(history, as_of)))
            .collect();

        let mut reports = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (user_id, outcome) in outcomes {
            match outcome {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "analysis failed");
                    failures.push((user_id, e.to_string()));
                }
            }
        }

        let summary = BatchReport {
            total_users: histories.len(),
            successful_users: reports.len(),
            failed_users: failures.len(),
            total_duration_ms: start_time.elapsed().as_millis(),
            reports,
            failures,
        };

        info!(
            users = summary.total_users,
            failed = summary.failed_users,
            duration_ms = summary.total_duration_ms as u64,
            "batch analysis complete"
        );
        summary
    }

    /// PMC series for `from..=to`
    #[instrument(skip(self, history), fields(user_id = %history.user_id))]
    pub fn pmc_series(
        &self,
        history: &UserHistory,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PmcPoint>> {
        let aggregated = self.aggregator.aggregate(history);
        Ok(self.load_model.series(&aggregated.daily_loads(), from, to)?)
    }

    /// Weekly CTL ramp rate as of `as_of`
    pub fn ctl_ramp_rate(&self, history: &UserHistory, as_of: NaiveDate) -> Option<f64> {
        let aggregated = self.aggregator.aggregate(history);
        let states = self.load_model.states(&aggregated.daily_loads(), as_of);
        self.load_model.ctl_ramp_rate(&states)
    }

    /// ACWR for every day of `from..=to`
    pub fn acwr_series(&self, history: &UserHistory, from: NaiveDate, to: NaiveDate) -> Vec<AcwrPoint> {
        let aggregated = self.aggregator.aggregate(history);
        self.acwr.acwr_series(&aggregated.daily_loads(), from, to)
    }

    /// Baseline of one metric for every day of `from..=to`
    pub fn baseline_series(
        &self,
        history: &UserHistory,
        metric: Metric,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<BaselineWindow> {
        let aggregated = self.aggregator.aggregate(history);
        self.baselines.baseline_series(&aggregated.days, metric, from, to)
    }

    /// Readiness for every day of `from..=to`
    pub fn readiness_series(
        &self,
        history: &UserHistory,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<ReadinessResult> {
        let aggregated = self.aggregator.aggregate(history);
        let hrv = self.baselines.baseline_series(&aggregated.days, Metric::Hrv, from, to);
        let rhr = self
            .baselines
            .baseline_series(&aggregated.days, Metric::RestingHr, from, to);

        hrv.into_iter()
            .zip(rhr)
            .map(|(hrv, resting_hr)| {
                let date = hrv.as_of;
                let baselines = Baselines { hrv, resting_hr };
                self.readiness.score(date, aggregated.days.get(&date), &baselines)
            })
            .collect()
    }

    /// Latest local day with any record, the natural default evaluation day
    pub fn latest_day(history: &UserHistory) -> Option<NaiveDate> {
        let offset = history.utc_offset();
        let wellness = history.wellness.iter().map(|r| local_day(r.submitted_at, offset));
        let activities = history.activities.iter().map(|r| local_day(r.started_at, offset));
        wellness.chain(activities).max()
    }

    /// First day of a trailing range of `days` ending at `to`
    pub fn range_start(to: NaiveDate, days: u32) -> NaiveDate {
        to.checked_sub_days(Days::new(u64::from(days.max(1)) - 1))
            .unwrap_or(NaiveDate::MIN)
    }

    fn analyze_inner(
        &self,
        history: &UserHistory,
        as_of: NaiveDate,
        cache: Option<&EngineCache>,
    ) -> Result<EngineReport> {
        let user_id = history.user_id.as_str();
        let aggregated = self.aggregator.aggregate(history);
        let daily_loads = aggregated.daily_loads();

        let baselines = match cache {
            Some(cache) => {
                let window_days = self.config.baseline.window_days;
                let key = BaselineKey::new(as_of, window_days, &aggregated.days);
                match cache.baselines(user_id, &key) {
                    Some(cached) => cached,
                    None => {
                        let fresh = self.baselines.estimate(&aggregated.days, as_of);
                        cache.store_baselines(user_id, key, fresh.clone());
                        fresh
                    }
                }
            }
            None => self.baselines.estimate(&aggregated.days, as_of),
        };

        let cached_state = cache.and_then(|c| c.resumable_state(user_id, &daily_loads, as_of));
        let load = match cached_state {
            Some(state) => {
                debug!(cached = %state.date(), "resuming load model from cache");
                Some(self.load_model.resume(&state, &daily_loads, as_of)?)
            }
            None => self.load_model.fold(&daily_loads, as_of),
        };

        if let Some(state) = &load {
            state.verify().map_err(EngineError::from)?;
            if let Some(cache) = cache {
                cache.store_load_state(user_id, *state, &daily_loads);
            }
        }

        let acwr = self.acwr.acwr_as_of(&daily_loads, as_of);
        let today = aggregated.days.get(&as_of);
        let readiness = self.readiness.score(as_of, today, &baselines);
        let recovery = self.recovery.assess(RecoveryInputs {
            date: as_of,
            today,
            baselines: &baselines,
            acwr: &acwr,
            load_state: load.as_ref(),
        });

        debug!(
            readiness = readiness.score,
            confidence = %readiness.confidence,
            recovery = recovery.recovery_score,
            ratio = ?acwr.ratio,
            tsb = ?load.as_ref().map(|s| s.tsb()),
            "analysis complete"
        );

        Ok(EngineReport {
            user_id: history.user_id.clone(),
            date: as_of,
            readiness,
            baselines,
            form: load.as_ref().map(|s| TsbInterpretation::from_tsb(s.tsb())),
            load,
            acwr,
            recovery,
            issues: aggregated.issues,
        })
    }
}

impl Default for ReadinessEngine {
    fn default() -> Self {
        Self::new()
    }
}
