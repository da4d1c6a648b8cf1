//! Performance Management Chart (CTL / ATL / TSB)
//!
//! The model is a strict left fold over the chronologically ordered daily
//! load series:
//!
//! ```text
//! ctl[t] = ctl[t-1] + (load[t] - ctl[t-1]) / ctl_time_constant
//! atl[t] = atl[t-1] + (load[t] - atl[t-1]) / atl_time_constant
//! tsb[t] = ctl[t] - atl[t]
//! ```
//!
//! Rest days advance the recursion with a load of zero. The first day with
//! activity starts the fold with `ctl = atl = load`. A cached [`LoadState`]
//! can be carried forward with [`TrainingLoadModel::resume`] so long
//! histories are never refolded from scratch.

use crate::error::InvariantViolation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// PMC calculation errors
#[derive(Error, Debug, PartialEq)]
pub enum PmcError {
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// PMC configuration with customizable time constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PmcConfig {
    /// CTL time constant in days (default: 42)
    pub ctl_time_constant: f64,

    /// ATL time constant in days (default: 7)
    pub atl_time_constant: f64,

    /// Ramp rate calculation period in days
    pub ramp_rate_days: u16,

    /// Days of PMC history included in reports
    pub series_days: u16,
}

impl Default for PmcConfig {
    fn default() -> Self {
        PmcConfig {
            ctl_time_constant: 42.0,
            atl_time_constant: 7.0,
            ramp_rate_days: 7,
            series_days: 90,
        }
    }
}

/// Fitness / fatigue / form for one day
///
/// Only constructible through [`LoadState::new`], which derives `tsb`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadState {
    date: NaiveDate,
    ctl: f64,
    atl: f64,
    tsb: f64,
}

impl LoadState {
    pub fn new(date: NaiveDate, ctl: f64, atl: f64) -> Self {
        LoadState {
            date,
            ctl,
            atl,
            tsb: ctl - atl,
        }
    }

    /// First day of a fold
    pub fn cold_start(date: NaiveDate, load: f64) -> Self {
        Self::new(date, load, load)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Chronic Training Load (fitness)
    pub fn ctl(&self) -> f64 {
        self.ctl
    }

    /// Acute Training Load (fatigue)
    pub fn atl(&self) -> f64 {
        self.atl
    }

    /// Training Stress Balance (form)
    pub fn tsb(&self) -> f64 {
        self.tsb
    }

    /// Check the invariants of the state
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        if self.tsb != self.ctl - self.atl {
            return Err(InvariantViolation::TsbMismatch {
                date: self.date,
                ctl: self.ctl,
                atl: self.atl,
                tsb: self.tsb,
            });
        }
        for (field, value) in [("ctl", self.ctl), ("atl", self.atl)] {
            if !value.is_finite() || value < 0.0 {
                return Err(InvariantViolation::InvalidLoad {
                    date: self.date,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// One day of the PMC series as callers receive it
///
/// Days before the first recorded activity carry `null` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmcPoint {
    pub date: NaiveDate,
    pub ctl: Option<f64>,
    pub atl: Option<f64>,
    pub tsb: Option<f64>,
}

impl From<&LoadState> for PmcPoint {
    fn from(state: &LoadState) -> Self {
        PmcPoint {
            date: state.date,
            ctl: Some(state.ctl),
            atl: Some(state.atl),
            tsb: Some(state.tsb),
        }
    }
}

/// Training Stress Balance interpretation ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TsbInterpretation {
    VeryFresh,    // +25 and above
    Fresh,        // +5 to +25
    Neutral,      // -10 to +5
    Fatigued,     // -30 to -10
    VeryFatigued, // Below -30
}

impl TsbInterpretation {
    /// Get TSB interpretation from numeric value
    pub fn from_tsb(tsb: f64) -> Self {
        if tsb >= 25.0 {
            TsbInterpretation::VeryFresh
        } else if tsb >= 5.0 {
            TsbInterpretation::Fresh
        } else if tsb >= -10.0 {
            TsbInterpretation::Neutral
        } else if tsb >= -30.0 {
            TsbInterpretation::Fatigued
        } else {
            TsbInterpretation::VeryFatigued
        }
    }

    /// Get interpretation description
    pub fn description(&self) -> &'static str {
        match self {
            TsbInterpretation::VeryFresh => "Very fresh (may be losing fitness)",
            TsbInterpretation::Fresh => "Fresh and ready for hard training/racing",
            TsbInterpretation::Neutral => "Neutral (normal training)",
            TsbInterpretation::Fatigued => "Fatigued (monitor closely)",
            TsbInterpretation::VeryFatigued => "Very fatigued (rest needed)",
        }
    }
}

/// Incremental CTL/ATL/TSB model
pub struct TrainingLoadModel {
    config: PmcConfig,
}

impl TrainingLoadModel {
    /// Create new model with default time constants
    pub fn new() -> Self {
        TrainingLoadModel {
            config: PmcConfig::default(),
        }
    }

    /// Create new model with custom configuration
    pub fn with_config(config: PmcConfig) -> Self {
        TrainingLoadModel { config }
    }

    pub fn config(&self) -> &PmcConfig {
        &self.config
    }

    /// Advance one day from `prev` with that day's load
    pub fn step(&self, prev: &LoadState, load: f64) -> LoadState {
        let date = prev.date.succ_opt().unwrap_or(prev.date);
        let ctl = prev.ctl + (load - prev.ctl) / self.config.ctl_time_constant;
        let atl = prev.atl + (load - prev.atl) / self.config.atl_time_constant;

        let state = LoadState::new(date, ctl, atl);
        debug_assert!(state.verify().is_ok(), "load state invariant broken: {:?}", state);
        state
    }

    /// Carry `cached` forward through `to`, filling rest days with zero load
    pub fn resume(
        &self,
        cached: &LoadState,
        daily_loads: &BTreeMap<NaiveDate, f64>,
        to: NaiveDate,
    ) -> Result<LoadState, InvariantViolation> {
        if to < cached.date {
            return Err(InvariantViolation::NonChronological {
                previous: cached.date,
                next: to,
            });
        }

        let mut state = *cached;
        while state.date < to {
            let Some(next) = state.date.succ_opt() else {
                break;
            };
            let load = daily_loads.get(&next).copied().unwrap_or(0.0);
            state = self.step(&state, load);
        }
        Ok(state)
    }

    /// Every state from the first day with load through `to`
    pub fn states(&self, daily_loads: &BTreeMap<NaiveDate, f64>, to: NaiveDate) -> Vec<LoadState> {
        let Some((&first, &first_load)) = daily_loads.range(..=to).next() else {
            return Vec::new();
        };

        let days = (to - first).num_days().max(0) as usize + 1;
        let mut states = Vec::with_capacity(days);
        let mut state = LoadState::cold_start(first, first_load);
        states.push(state);

        while state.date < to {
            let next = match state.date.succ_opt() {
                Some(next) => next,
                None => break,
            };
            let load = daily_loads.get(&next).copied().unwrap_or(0.0);
            state = self.step(&state, load);
            states.push(state);
        }

        states
    }

    /// Final state of the fold through `to`; `None` before any activity
    pub fn fold(&self, daily_loads: &BTreeMap<NaiveDate, f64>, to: NaiveDate) -> Option<LoadState> {
        let (&first, &first_load) = daily_loads.range(..=to).next()?;
        let cold = LoadState::cold_start(first, first_load);
        self.resume(&cold, daily_loads, to).ok()
    }

    /// PMC series for `from..=to`; days before the first activity are null
    pub fn series(
        &self,
        daily_loads: &BTreeMap<NaiveDate, f64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PmcPoint>, PmcError> {
        if from > to {
            return Err(PmcError::InvalidDateRange(
                "Start date must be before end date".to_string(),
            ));
        }

        let states = self.states(daily_loads, to);
        let by_date: BTreeMap<NaiveDate, &LoadState> =
            states.iter().map(|s| (s.date, s)).collect();

        let mut series = Vec::new();
        let mut day = from;
        loop {
            match by_date.get(&day) {
                Some(state) => {
                    state.verify()?;
                    series.push(PmcPoint::from(*state));
                }
                None => series.push(PmcPoint {
                    date: day,
                    ctl: None,
                    atl: None,
                    tsb: None,
                }),
            }

            if day >= to {
                break;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        Ok(series)
    }

    /// CTL change per week over the configured ramp period
    pub fn ctl_ramp_rate(&self, states: &[LoadState]) -> Option<f64> {
        let days = self.config.ramp_rate_days as usize;
        if days == 0 || states.len() <= days {
            return None;
        }

        let recent = states[states.len() - 1].ctl;
        let past = states[states.len() - 1 - days].ctl;
        Some((recent - past) / (days as f64 / 7.0))
    }
}

impl Default for TrainingLoadModel {
    fn default() -> Self {
        Self::new()
    }
}
