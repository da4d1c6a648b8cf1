use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone};
use readyrs::acwr::{AcwrBand, AcwrCalculator, AcwrConfig};
use readyrs::baseline::BaselineEstimator;
use readyrs::confidence::{Confidence, ConfidenceGate};
use readyrs::engine::ReadinessEngine;
use readyrs::export::{json, text};
use readyrs::import::ImportManager;
use readyrs::models::{
    ActivityRecord, GarminTelemetry, ManualWellness, UserHistory, WellnessRecord, WellnessSource,
};
use readyrs::pmc::TrainingLoadModel;
use readyrs::readiness::ReadinessLabel;
use readyrs::recovery::NO_DATA_RECOMMENDATION;
use readyrs::EngineCache;
use std::collections::BTreeMap;
use std::io::Write;

/// End-to-end workflows across aggregation, load modelling and scoring

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn day(n: u64) -> NaiveDate {
        start() + Days::new(n)
    }

    fn at(date: NaiveDate, hour: u32, offset_minutes: i32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_minutes * 60)
            .unwrap()
            .from_local_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
            .unwrap()
    }

    fn telemetry(date: NaiveDate, hrv: f64, rhr: f64, sleep_score: f64) -> WellnessRecord {
        WellnessRecord {
            submitted_at: at(date, 7, 0),
            data: WellnessSource::GarminTelemetry(GarminTelemetry {
                hrv_ms: Some(hrv),
                resting_hr: Some(rhr),
                sleep_score: Some(sleep_score),
                ..GarminTelemetry::default()
            }),
        }
    }

    fn run(date: NaiveDate, minutes: f64) -> ActivityRecord {
        ActivityRecord {
            started_at: at(date, 18, 0),
            distance_km: Some(minutes / 6.0),
            duration_sec: minutes * 60.0,
            hr_zone: None,
        }
    }

    /// 28 steady days followed by `today_hrv` on day 28
    fn steady_history(today_hrv: f64) -> UserHistory {
        let mut history = UserHistory::new("steady");
        for n in 0..28 {
            history.wellness.push(telemetry(day(n), 50.0, 50.0, 80.0));
            if n % 7 != 6 {
                history.activities.push(run(day(n), 50.0));
            }
        }
        history.wellness.push(telemetry(day(28), today_hrv, 50.0, 80.0));
        history
    }

    /// Test the full report on a month of consistent data
    #[test]
    fn test_full_report_on_complete_history() {
        let engine = ReadinessEngine::new();
        let report = engine.analyze(&steady_history(50.0), day(28)).unwrap();

        assert_eq!(report.baselines.hrv.sample_count, 28);
        assert_eq!(report.baselines.hrv.mean, Some(50.0));
        assert_eq!(report.readiness.confidence, Confidence::High);
        assert!(report.readiness.score <= 100);
        assert!(report.recovery.recovery_score <= 100);
        assert!(report.recovery.confidence <= 100);
        assert!(!report.recovery.recommendations.is_empty());
        assert!(report.recovery.recommendations.len() <= 3);

        let load = report.load.expect("load state after first activity");
        assert!((load.tsb() - (load.ctl() - load.atl())).abs() < 1e-9);
    }

    /// Test that an HRV drop below baseline lowers readiness
    #[test]
    fn test_hrv_drop_lowers_readiness() {
        let engine = ReadinessEngine::new();
        let normal = engine.analyze(&steady_history(50.0), day(28)).unwrap();
        let dropped = engine.analyze(&steady_history(40.0), day(28)).unwrap();

        assert!(dropped.readiness.score < normal.readiness.score);
        assert_eq!(normal.readiness.label, ReadinessLabel::Optimal);
        assert_eq!(dropped.readiness.label, ReadinessLabel::Tired);
        assert!(dropped.readiness.why_line.contains("HRV is 20% below"));
    }

    /// Test that analysis is deterministic for the same input
    #[test]
    fn test_analysis_is_idempotent() {
        let engine = ReadinessEngine::new();
        let history = steady_history(45.0);

        let first = engine.analyze(&history, day(28)).unwrap();
        let second = engine.analyze(&history, day(28)).unwrap();
        assert_eq!(first, second);

        let cache = EngineCache::new();
        let cached = engine.analyze_with_cache(&history, day(28), &cache).unwrap();
        let again = engine.analyze_with_cache(&history, day(28), &cache).unwrap();
        assert_eq!(cached, first);
        assert_eq!(again, first);
    }

    /// Test the neutral recovery default when no wellness data exists
    #[test]
    fn test_no_data_recovery_default() {
        let engine = ReadinessEngine::new();
        let mut history = UserHistory::new("runs-only");
        for n in 0..10 {
            history.activities.push(run(day(n), 40.0));
        }

        let report = engine.analyze(&history, day(9)).unwrap();
        assert_eq!(report.recovery.recovery_score, 50);
        assert_eq!(report.recovery.confidence, 0);
        assert_eq!(report.recovery.recommendations, vec![NO_DATA_RECOMMENDATION.to_string()]);
        assert_eq!(report.readiness.score, 50);
        assert_eq!(report.readiness.confidence, Confidence::Low);
    }

    /// Test the TSB identity on every day of a PMC series
    #[test]
    fn test_tsb_identity_across_series() {
        let engine = ReadinessEngine::new();
        let mut history = steady_history(50.0);
        history.activities.push(run(day(20), 180.0));

        let series = engine.pmc_series(&history, day(0), day(60)).unwrap();
        assert_eq!(series.len(), 61);
        for point in &series {
            let (ctl, atl, tsb) = (point.ctl.unwrap(), point.atl.unwrap(), point.tsb.unwrap());
            assert!((tsb - (ctl - atl)).abs() < 1e-9, "tsb mismatch on {}", point.date);
        }
    }

    /// Test that days before the first activity have no load values
    #[test]
    fn test_pmc_null_before_first_activity() {
        let engine = ReadinessEngine::new();
        let mut history = UserHistory::new("late-starter");
        history.activities.push(run(day(5), 60.0));

        let series = engine.pmc_series(&history, day(0), day(7)).unwrap();
        assert!(series[..5].iter().all(|p| p.ctl.is_none() && p.tsb.is_none()));
        assert_eq!(series[5].ctl, Some(60.0));
        assert_eq!(series[5].tsb, Some(0.0));
    }

    /// Test ATL decay over rest days after a single session
    #[test]
    fn test_atl_decays_over_rest_days() {
        let model = TrainingLoadModel::new();
        let mut loads = BTreeMap::new();
        loads.insert(day(0), 100.0);

        for n in 0..=14u64 {
            let state = model.fold(&loads, day(n)).unwrap();
            let expected = 100.0 * (6.0_f64 / 7.0).powi(n as i32);
            assert!((state.atl() - expected).abs() < 1e-9, "day {}", n);
            assert!(state.ctl() <= 100.0);
        }
    }

    /// Test ACWR band boundaries
    #[test]
    fn test_acwr_band_boundaries() {
        let config = AcwrConfig::default();
        assert_eq!(AcwrBand::classify(1.5, &config), AcwrBand::Caution);
        assert_eq!(AcwrBand::classify(1.3, &config), AcwrBand::Optimal);
        assert_eq!(AcwrBand::classify(0.8, &config), AcwrBand::Optimal);
        assert_eq!(AcwrBand::classify(0.79, &config), AcwrBand::Undertraining);
        assert_eq!(AcwrBand::classify(1.51, &config), AcwrBand::HighRisk);
    }

    /// Four weeks of runs: three at `base` minutes, then one at `peak`
    fn ramp_history(base: f64, peak: f64) -> UserHistory {
        let mut history = UserHistory::new("ramp");
        for n in 0..28 {
            let minutes = if n < 21 { base } else { peak };
            history.activities.push(run(day(n), minutes));
        }
        history
    }

    /// Test that built histories landing exactly on a band edge classify inclusively
    #[test]
    fn test_acwr_band_edges_from_history() {
        let engine = ReadinessEngine::new();
        let calculator = AcwrCalculator::new();

        // chronic (21 * 50 + 7 * 90) / 28 = 60, acute 90
        let history = ramp_history(50.0, 90.0);
        let report = engine.analyze(&history, day(27)).unwrap();
        assert_eq!(report.acwr.chronic_28d, 60.0);
        assert_eq!(report.acwr.acute_7d, 90.0);
        assert_eq!(report.acwr.ratio, Some(1.5));
        assert_eq!(report.acwr.band, Some(AcwrBand::Caution));
        assert_eq!(report.acwr.coverage_ratio, 1.0);

        // chronic (21 * 45 + 7 * 65) / 28 = 50, acute 65
        let history = ramp_history(45.0, 65.0);
        let loads: BTreeMap<NaiveDate, f64> = history
            .activities
            .iter()
            .map(|a| (a.started_at.date_naive(), a.duration_sec / 60.0))
            .collect();
        let point = calculator.acwr_as_of(&loads, day(27));
        assert_eq!(point.ratio, Some(1.3));
        assert_eq!(point.band, Some(AcwrBand::Optimal));

        let report = engine.analyze(&history, day(27)).unwrap();
        assert_eq!(report.acwr, point);
    }

    /// Test that stripping data away never raises recovery confidence
    #[test]
    fn test_recovery_confidence_never_rises_when_data_is_removed() {
        let engine = ReadinessEngine::new();
        let mut history = steady_history(50.0);
        history.wellness.push(WellnessRecord {
            submitted_at: at(day(28), 9, 0),
            data: WellnessSource::ManualEntry(ManualWellness {
                stress: Some(3.0),
                mental_energy: Some(7.0),
                soreness: Some(2.0),
                ..ManualWellness::default()
            }),
        });

        let mut previous = engine.analyze(&history, day(28)).unwrap().recovery.confidence;
        assert!(previous > 90);

        while !history.wellness.is_empty() || !history.activities.is_empty() {
            // Today's entries go first, then history from the most recent day
            history.wellness.pop();
            if !history.activities.is_empty() {
                history.activities.remove(0);
            }

            let confidence = engine.analyze(&history, day(28)).unwrap().recovery.confidence;
            assert!(
                confidence <= previous,
                "confidence rose from {} to {} with {} wellness records left",
                previous,
                confidence,
                history.wellness.len()
            );
            previous = confidence;
        }
        assert_eq!(previous, 0);
    }

    /// Test that the ratio is absent exactly when chronic load is zero
    #[test]
    fn test_acwr_ratio_absent_without_chronic_load() {
        let calculator = AcwrCalculator::new();
        let mut loads = BTreeMap::new();
        loads.insert(day(0), 80.0);

        let early = calculator.acwr_as_of(&loads, day(3));
        assert!(early.chronic_28d > 0.0);
        assert!(early.ratio.is_some());

        let stale = calculator.acwr_as_of(&loads, day(40));
        assert_eq!(stale.chronic_28d, 0.0);
        assert_eq!(stale.ratio, None);
        assert_eq!(stale.band, None);

        let none = calculator.acwr_as_of(&BTreeMap::new(), day(0));
        assert_eq!(none.ratio, None);
        assert_eq!(none.coverage_ratio, 0.0);
    }

    /// Test that confidence never falls as baseline coverage grows
    #[test]
    fn test_confidence_monotone_in_coverage() {
        let estimator = BaselineEstimator::new();
        let gate = ConfidenceGate::new();
        let history = steady_history(50.0);
        let aggregated = ReadinessEngine::new().aggregate(&history);

        let mut previous = Confidence::Low;
        for n in 0..=28 {
            let baselines = estimator.estimate(&aggregated.days, day(n));
            let grade = gate.combine_baselines([&baselines.hrv, &baselines.resting_hr]);
            assert!(grade >= previous, "confidence dropped on day {}", n);
            previous = grade;
        }
        assert_eq!(previous, Confidence::High);
    }

    /// Test local-day bucketing and source precedence
    #[test]
    fn test_local_day_and_source_precedence() {
        let engine = ReadinessEngine::new();
        let mut history = UserHistory::new("tz");
        history.utc_offset_minutes = 120;

        // 23:30 UTC is 01:30 the next local day
        history.activities.push(ActivityRecord {
            started_at: at(day(0), 23, 0) + chrono::Duration::minutes(30),
            distance_km: None,
            duration_sec: 1800.0,
            hr_zone: Some(3),
        });
        history.wellness.push(WellnessRecord {
            submitted_at: at(day(1), 8, 120),
            data: WellnessSource::GarminTelemetry(GarminTelemetry {
                hrv_ms: Some(60.0),
                ..GarminTelemetry::default()
            }),
        });
        history.wellness.push(WellnessRecord {
            submitted_at: at(day(1), 9, 120),
            data: WellnessSource::ManualEntry(ManualWellness {
                hrv_ms: Some(40.0),
                sleep_hours: Some(7.0),
                ..ManualWellness::default()
            }),
        });

        let aggregated = engine.aggregate(&history);
        let loads = aggregated.daily_loads();
        assert_eq!(loads.len(), 1);
        assert!((loads[&day(1)] - 30.0 * 1.6).abs() < 1e-9);

        let point = &aggregated.days[&day(1)];
        assert_eq!(point.hrv_ms, Some(60.0));
        assert_eq!(point.sleep_hours, Some(7.0));
    }

    /// Test implausible values are dropped and reported
    #[test]
    fn test_out_of_range_values_reported() {
        let engine = ReadinessEngine::new();
        let mut history = UserHistory::new("noisy");
        history.wellness.push(telemetry(day(0), 900.0, 50.0, 80.0));
        history.activities.push(ActivityRecord {
            started_at: at(day(0), 18, 0),
            distance_km: Some(5.0),
            duration_sec: -60.0,
            hr_zone: None,
        });

        let report = engine.analyze(&history, day(0)).unwrap();
        assert!(!report.issues.is_empty());
        assert!(report.load.is_none());
        assert_eq!(report.baselines.hrv.sample_count, 0);
    }

    /// Test JSON import through to a JSON and text report
    #[test]
    fn test_import_analyze_export_workflow() {
        let document = serde_json::json!([
            {
                "userId": "json-runner",
                "utcOffsetMinutes": -300,
                "wellness": [
                    {"submittedAt": "2024-03-01T07:00:00-05:00",
                     "data": {"source": "manualEntry", "sleepHours": 6.0, "stress": 7, "soreness": 6}}
                ],
                "activities": [
                    {"startedAt": "2024-03-01T17:00:00-05:00", "distanceKm": 10.0, "durationSec": 3000}
                ]
            },
            {"userId": "empty-runner"}
        ]);

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(document.to_string().as_bytes()).unwrap();

        let histories = ImportManager::import_histories(file.path()).unwrap();
        assert_eq!(histories.len(), 2);

        let engine = ReadinessEngine::new();
        let batch = engine.analyze_batch(&histories, day(0));
        assert_eq!(batch.successful_users, 2);

        let rendered = json::to_json_pretty(&batch).unwrap();
        assert!(rendered.contains("\"restingHRScore\""));
        assert!(rendered.contains("\"acute7d\""));
        assert!(rendered.contains("\"userId\": \"json-runner\""));

        let report = batch
            .reports
            .iter()
            .find(|r| r.user_id == "json-runner")
            .unwrap();
        let text_report = text::render_report(report);
        assert!(text_report.contains("json-runner"));
        assert!(text_report.contains("Recommendations"));

        let table = text::render_batch(&batch);
        assert!(table.contains("empty-runner"));
    }
}
