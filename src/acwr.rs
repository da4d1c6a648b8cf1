//! Acute:Chronic Workload Ratio
//!
//! Both loads are mean daily loads ending at the evaluation day (inclusive).
//! Rest days inside the history count as zero. Before the history is long
//! enough to fill a window, the window shrinks to the days since the first
//! recorded activity and the shrink shows up in `coverage_ratio`.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ACWR policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcwrConfig {
    /// Acute window in days
    pub acute_days: u32,

    /// Chronic window in days
    pub chronic_days: u32,

    /// Ratios below this are undertraining
    pub undertraining_below: f64,

    /// Upper bound (inclusive) of the optimal band
    pub optimal_max: f64,

    /// Upper bound (inclusive) of the caution band
    pub caution_max: f64,
}

impl Default for AcwrConfig {
    fn default() -> Self {
        AcwrConfig {
            acute_days: 7,
            chronic_days: 28,
            undertraining_below: 0.8,
            optimal_max: 1.3,
            caution_max: 1.5,
        }
    }
}

/// Injury-risk band of a ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AcwrBand {
    Undertraining,
    Optimal,
    Caution,
    HighRisk,
}

impl AcwrBand {
    /// Classify a ratio with boundary-inclusive bands
    pub fn classify(ratio: f64, config: &AcwrConfig) -> Self {
        if ratio < config.undertraining_below {
            AcwrBand::Undertraining
        } else if ratio <= config.optimal_max {
            AcwrBand::Optimal
        } else if ratio <= config.caution_max {
            AcwrBand::Caution
        } else {
            AcwrBand::HighRisk
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AcwrBand::Undertraining => "Undertraining",
            AcwrBand::Optimal => "Optimal",
            AcwrBand::Caution => "Caution",
            AcwrBand::HighRisk => "High Risk",
        }
    }

    /// Load guidance for the coming days
    pub fn guidance(&self) -> &'static str {
        match self {
            AcwrBand::Undertraining => "Increase load gradually (5-10%) to avoid detraining.",
            AcwrBand::Optimal => "Maintain progressive overload.",
            AcwrBand::Caution => "Hold or slightly reduce load; avoid stacking hard days.",
            AcwrBand::HighRisk => "Prioritize recovery; cap intensity until ACWR is back in range.",
        }
    }
}

/// Workload ratio for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcwrPoint {
    pub date: NaiveDate,

    /// Mean daily load over the acute window
    pub acute_7d: f64,

    /// Mean daily load over the chronic window
    pub chronic_28d: f64,

    /// `None` when the chronic load is zero
    pub ratio: Option<f64>,

    /// `None` whenever `ratio` is
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub band: Option<AcwrBand>,

    /// Share of the chronic window backed by recorded history
    pub coverage_ratio: f64,
}

/// ACWR calculator over a daily load map
pub struct AcwrCalculator {
    config: AcwrConfig,
}

impl AcwrCalculator {
    pub fn new() -> Self {
        AcwrCalculator {
            config: AcwrConfig::default(),
        }
    }

    pub fn with_config(config: AcwrConfig) -> Self {
        AcwrCalculator { config }
    }

    pub fn config(&self) -> &AcwrConfig {
        &self.config
    }

    /// Ratio as of `day`, using loads on or before it
    pub fn acwr_as_of(&self, daily_loads: &BTreeMap<NaiveDate, f64>, day: NaiveDate) -> AcwrPoint {
        let Some((&first, _)) = daily_loads.range(..=day).next() else {
            return AcwrPoint {
                date: day,
                acute_7d: 0.0,
                chronic_28d: 0.0,
                ratio: None,
                band: None,
                coverage_ratio: 0.0,
            };
        };

        let available = (day - first).num_days() as u64 + 1;
        let acute_days = available.min(u64::from(self.config.acute_days.max(1)));
        let chronic_days = available.min(u64::from(self.config.chronic_days.max(1)));

        let acute = Self::window_mean(daily_loads, day, acute_days);
        let chronic = Self::window_mean(daily_loads, day, chronic_days);

        let ratio = if chronic > 0.0 {
            Some(acute / chronic)
        } else {
            None
        };

        AcwrPoint {
            date: day,
            acute_7d: acute,
            chronic_28d: chronic,
            ratio,
            band: ratio.map(|r| AcwrBand::classify(r, &self.config)),
            coverage_ratio: chronic_days as f64 / f64::from(self.config.chronic_days.max(1)),
        }
    }

    /// One point per day from `from` through `to`
    pub fn acwr_series(
        &self,
        daily_loads: &BTreeMap<NaiveDate, f64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<AcwrPoint> {
        from.iter_days()
            .take_while(|day| *day <= to)
            .map(|day| self.acwr_as_of(daily_loads, day))
            .collect()
    }

    fn window_mean(daily_loads: &BTreeMap<NaiveDate, f64>, day: NaiveDate, days: u64) -> f64 {
        let start = day
            .checked_sub_days(Days::new(days - 1))
            .unwrap_or(NaiveDate::MIN);
        let total: f64 = daily_loads.range(start..=day).map(|(_, load)| load).sum();
        total / days as f64
    }
}

impl Default for AcwrCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn steady(start: NaiveDate, days: u64, load: f64) -> BTreeMap<NaiveDate, f64> {
        (0..days).map(|i| (start + Days::new(i), load)).collect()
    }

    #[test]
    fn test_band_boundaries() {
        let config = AcwrConfig::default();
        assert_eq!(AcwrBand::classify(0.0, &config), AcwrBand::Undertraining);
        assert_eq!(AcwrBand::classify(0.79, &config), AcwrBand::Undertraining);
        assert_eq!(AcwrBand::classify(0.8, &config), AcwrBand::Optimal);
        assert_eq!(AcwrBand::classify(1.3, &config), AcwrBand::Optimal);
        assert_eq!(AcwrBand::classify(1.31, &config), AcwrBand::Caution);
        assert_eq!(AcwrBand::classify(1.5, &config), AcwrBand::Caution);
        assert_eq!(AcwrBand::classify(1.51, &config), AcwrBand::HighRisk);
    }

    #[test]
    fn test_empty_history() {
        let calc = AcwrCalculator::new();
        let point = calc.acwr_as_of(&BTreeMap::new(), date(2024, 6, 1));

        assert_eq!(point.acute_7d, 0.0);
        assert_eq!(point.chronic_28d, 0.0);
        assert_eq!(point.ratio, None);
        assert_eq!(point.band, None);
        assert_eq!(point.coverage_ratio, 0.0);
    }

    #[test]
    fn test_steady_load_is_optimal() {
        let calc = AcwrCalculator::new();
        let start = date(2024, 5, 1);
        let loads = steady(start, 40, 60.0);
        let point = calc.acwr_as_of(&loads, start + Days::new(39));

        assert!((point.ratio.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(point.band, Some(AcwrBand::Optimal));
        assert_eq!(point.coverage_ratio, 1.0);
    }

    #[test]
    fn test_spike_ratio() {
        let calc = AcwrCalculator::new();
        let start = date(2024, 5, 1);
        let mut loads = steady(start, 21, 50.0);
        for i in 21..28 {
            loads.insert(start + Days::new(i), 150.0);
        }
        let point = calc.acwr_as_of(&loads, start + Days::new(27));

        // acute 150, chronic (21*50 + 7*150) / 28 = 75
        assert!((point.acute_7d - 150.0).abs() < 1e-9);
        assert!((point.chronic_28d - 75.0).abs() < 1e-9);
        assert!((point.ratio.unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(point.band, Some(AcwrBand::HighRisk));
    }

    #[test]
    fn test_rest_weeks_count_as_zero() {
        let calc = AcwrCalculator::new();
        let start = date(2024, 5, 1);
        let loads = steady(start, 21, 40.0);
        let point = calc.acwr_as_of(&loads, start + Days::new(27));

        assert_eq!(point.acute_7d, 0.0);
        assert_eq!(point.ratio, Some(0.0));
        assert_eq!(point.band, Some(AcwrBand::Undertraining));
    }

    #[test]
    fn test_window_shrinks_to_available_history() {
        let calc = AcwrCalculator::new();
        let start = date(2024, 5, 1);
        let loads = steady(start, 10, 30.0);
        let point = calc.acwr_as_of(&loads, start + Days::new(9));

        assert!((point.chronic_28d - 30.0).abs() < 1e-12);
        assert!((point.coverage_ratio - 10.0 / 28.0).abs() < 1e-12);
    }

    #[test]
    fn test_future_loads_ignored() {
        let calc = AcwrCalculator::new();
        let start = date(2024, 5, 1);
        let mut loads = steady(start, 28, 50.0);
        loads.insert(start + Days::new(30), 500.0);

        let point = calc.acwr_as_of(&loads, start + Days::new(27));
        assert!((point.ratio.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_series_length_and_json_shape() {
        let calc = AcwrCalculator::new();
        let start = date(2024, 5, 1);
        let loads = steady(start, 14, 45.0);
        let series = calc.acwr_series(&loads, start, start + Days::new(13));
        assert_eq!(series.len(), 14);

        let json = serde_json::to_value(&series[13]).unwrap();
        assert!(json.get("acute7d").is_some());
        assert!(json.get("chronic28d").is_some());
        assert!(json["ratio"].is_number());

        let empty = serde_json::to_value(calc.acwr_as_of(&BTreeMap::new(), start)).unwrap();
        assert!(empty["ratio"].is_null());
    }
}
