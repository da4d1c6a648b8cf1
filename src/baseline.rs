//! Rolling personal baselines for HRV and resting heart rate
//!
//! A baseline is the mean of the trailing `window_days` days that end the day
//! *before* the evaluation day, so today's reading is compared against
//! history rather than against itself. Days without a reading do not count
//! as zero: they are skipped by the mean and only lower the coverage ratio.
//!
//! [`RollingBaseline`] keeps a running sum, so sliding the window forward by
//! a day costs O(1) amortized regardless of the window size.

use crate::error::InvariantViolation;
use crate::models::{DailyMetricPoint, Metric};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Default baseline window in days
pub const DEFAULT_BASELINE_WINDOW: u32 = 28;

/// Baseline policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Trailing window length in days
    pub window_days: u32,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        BaselineConfig {
            window_days: DEFAULT_BASELINE_WINDOW,
        }
    }
}

/// Snapshot of one metric's baseline as of a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineWindow {
    pub metric: Metric,

    /// Evaluation day; the window ends the day before
    pub as_of: NaiveDate,

    pub window_days: u32,

    /// `None` when the window holds no sample
    pub mean: Option<f64>,

    /// Sample standard deviation, `None` below two samples
    pub std_dev: Option<f64>,

    pub sample_count: u32,

    /// `sample_count / window_days`
    pub coverage_ratio: f64,
}

impl BaselineWindow {
    /// True when no sample backs this baseline
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Relative deviation `(value - mean) / mean`
    pub fn relative_deviation(&self, value: f64) -> Option<f64> {
        match self.mean {
            Some(mean) if mean > 0.0 => Some((value - mean) / mean),
            _ => None,
        }
    }
}

/// Trailing-window mean with O(1) eviction
#[derive(Debug, Clone)]
pub struct RollingBaseline {
    metric: Metric,
    window_days: u32,
    samples: VecDeque<(NaiveDate, f64)>,
    sum: f64,
    sum_sq: f64,
    as_of: Option<NaiveDate>,
}

impl RollingBaseline {
    pub fn new(metric: Metric, window_days: u32) -> Self {
        RollingBaseline {
            metric,
            window_days: window_days.max(1),
            samples: VecDeque::with_capacity(window_days as usize),
            sum: 0.0,
            sum_sq: 0.0,
            as_of: None,
        }
    }

    /// Move the evaluation day forward, evicting days that left the window
    pub fn advance_to(&mut self, day: NaiveDate) {
        let window_start = day
            .checked_sub_days(Days::new(u64::from(self.window_days)))
            .unwrap_or(NaiveDate::MIN);

        while let Some(&(date, value)) = self.samples.front() {
            if date >= window_start {
                break;
            }
            self.samples.pop_front();
            self.sum -= value;
            self.sum_sq -= value * value;
        }

        if self.samples.is_empty() {
            // Drop accumulated rounding error whenever the window drains
            self.sum = 0.0;
            self.sum_sq = 0.0;
        }

        self.as_of = Some(day);
    }

    /// Fold in a reading from a day before the evaluation day
    pub fn push(&mut self, date: NaiveDate, value: f64) -> Result<(), InvariantViolation> {
        if let Some(&(last, _)) = self.samples.back() {
            if date <= last {
                return Err(InvariantViolation::NonChronological {
                    previous: last,
                    next: date,
                });
            }
        }
        if let Some(as_of) = self.as_of {
            if date >= as_of {
                return Err(InvariantViolation::NonChronological {
                    previous: date,
                    next: as_of,
                });
            }
        }

        self.samples.push_back((date, value));
        self.sum += value;
        self.sum_sq += value * value;
        Ok(())
    }

    pub fn sample_count(&self) -> u32 {
        self.samples.len() as u32
    }

    /// Current window as a value object
    pub fn snapshot(&self) -> BaselineWindow {
        let n = self.samples.len();
        let mean = if n == 0 { None } else { Some(self.sum / n as f64) };
        let std_dev = if n < 2 {
            None
        } else {
            let nf = n as f64;
            let variance = (self.sum_sq - self.sum * self.sum / nf) / (nf - 1.0);
            Some(variance.max(0.0).sqrt())
        };

        BaselineWindow {
            metric: self.metric,
            as_of: self.as_of.unwrap_or(NaiveDate::MIN),
            window_days: self.window_days,
            mean,
            std_dev,
            sample_count: n as u32,
            coverage_ratio: (n as f64 / f64::from(self.window_days)).min(1.0),
        }
    }
}

/// Both baselines the scorers consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baselines {
    pub hrv: BaselineWindow,
    pub resting_hr: BaselineWindow,
}

/// Computes baselines from aggregated daily points
pub struct BaselineEstimator {
    config: BaselineConfig,
}

impl BaselineEstimator {
    pub fn new() -> Self {
        BaselineEstimator {
            config: BaselineConfig::default(),
        }
    }

    pub fn with_config(config: BaselineConfig) -> Self {
        BaselineEstimator { config }
    }

    /// Baseline of one metric for an evaluation day
    pub fn baseline_as_of(
        &self,
        points: &BTreeMap<NaiveDate, DailyMetricPoint>,
        metric: Metric,
        day: NaiveDate,
    ) -> BaselineWindow {
        let mut rolling = RollingBaseline::new(metric, self.config.window_days);
        rolling.advance_to(day);

        let window_start = day
            .checked_sub_days(Days::new(u64::from(rolling.window_days)))
            .unwrap_or(NaiveDate::MIN);

        for (date, point) in points.range(window_start..day) {
            if let Some(value) = metric.value_of(point) {
                // Range iteration is strictly increasing and below `day`
                let _ = rolling.push(*date, value);
            }
        }

        rolling.snapshot()
    }

    /// HRV and resting HR baselines for an evaluation day
    pub fn estimate(
        &self,
        points: &BTreeMap<NaiveDate, DailyMetricPoint>,
        day: NaiveDate,
    ) -> Baselines {
        Baselines {
            hrv: self.baseline_as_of(points, Metric::Hrv, day),
            resting_hr: self.baseline_as_of(points, Metric::RestingHr, day),
        }
    }

    /// One baseline per day from `from` through `to`, sliding a single window
    pub fn baseline_series(
        &self,
        points: &BTreeMap<NaiveDate, DailyMetricPoint>,
        metric: Metric,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<BaselineWindow> {
        let mut series = Vec::new();
        if from > to {
            return series;
        }

        let mut rolling = RollingBaseline::new(metric, self.config.window_days);
        let window_start = from
            .checked_sub_days(Days::new(u64::from(rolling.window_days)))
            .unwrap_or(NaiveDate::MIN);

        let mut pending = points
            .range(window_start..to)
            .filter_map(|(date, point)| metric.value_of(point).map(|v| (*date, v)))
            .peekable();

        let mut day = from;
        loop {
            rolling.advance_to(day);
            while let Some(&(date, value)) = pending.peek() {
                if date >= day {
                    break;
                }
                let _ = rolling.push(date, value);
                pending.next();
            }
            series.push(rolling.snapshot());

            if day >= to {
                break;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        series
    }
}

impl Default for BaselineEstimator {
    fn default() -> Self {
        Self::new()
    }
}
