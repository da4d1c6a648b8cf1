//! Daily metric aggregation
//!
//! Folds raw wellness submissions and run records into one canonical
//! [`DailyMetricPoint`] per local calendar day and a list of
//! [`ActivityLoadPoint`]s.
//!
//! # Precedence
//!
//! Every fallback between sources is decided here and nowhere else. For each
//! field of each day:
//!
//! 1. a value from [`WellnessSource::GarminTelemetry`] beats a value from
//!    [`WellnessSource::ManualEntry`];
//! 2. within the same source, the submission with the latest timestamp that
//!    carries a valid value wins (last-write-wins on submission time, not on
//!    input order);
//! 3. [`WellnessSource::NoData`] contributes nothing.
//!
//! There is no default value. A field nobody recorded stays `None`, and `0`
//! is a legitimate reading.
//!
//! Late submissions are folded into [`DayState`]s, which remember the source
//! and instant behind every field, so the same rules hold across batches.
//!
//! # Validation
//!
//! Malformed values are dropped one field at a time and reported as
//! [`ValidationIssue`]s; the rest of the record still counts.

use crate::models::{
    ActivityLoadPoint, ActivityRecord, DailyMetricPoint, GarminTelemetry, ManualWellness,
    UserHistory, WellnessRecord, WellnessSource,
};
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Plausible HRV range in milliseconds (exclusive lower bound)
pub const HRV_RANGE_MS: (f64, f64) = (0.0, 300.0);

/// Plausible resting heart rate range in bpm
pub const RESTING_HR_RANGE_BPM: (f64, f64) = (25.0, 140.0);

/// Questionnaire scale used by manual check-ins
pub const QUESTIONNAIRE_SCALE: (f64, f64) = (1.0, 10.0);

/// Aggregation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Days after which a past day is finalized and never rewritten
    pub grace_days: u32,

    /// Intensity factors for heart-rate zones 1 through 5
    pub zone_intensity_factors: [f64; 5],

    /// Lower clamp for the pace-derived intensity proxy
    pub min_pace_intensity: f64,

    /// Upper clamp for the pace-derived intensity proxy
    pub max_pace_intensity: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            grace_days: 2,
            zone_intensity_factors: [1.0, 1.3, 1.6, 1.9, 2.3],
            min_pace_intensity: 0.5,
            max_pace_intensity: 2.5,
        }
    }
}

/// A single dropped field or record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Local day the offending record belongs to
    pub date: NaiveDate,

    /// Field name, e.g. `hrvMs`
    pub field: String,

    /// Offending raw value
    pub value: f64,

    /// Why the value was dropped
    pub reason: String,
}

/// Output of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedHistory {
    /// One point per local day that had at least one wellness submission
    pub days: BTreeMap<NaiveDate, DailyMetricPoint>,

    /// Run loads in chronological order
    pub activities: Vec<ActivityLoadPoint>,

    /// Fields and records dropped during validation
    pub issues: Vec<ValidationIssue>,
}

impl AggregatedHistory {
    /// Total load per day; days without runs are absent
    pub fn daily_loads(&self) -> BTreeMap<NaiveDate, f64> {
        let mut loads: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for activity in &self.activities {
            *loads.entry(activity.date).or_insert(0.0) += activity.load();
        }
        loads
    }

    /// Points in chronological order
    pub fn points(&self) -> Vec<DailyMetricPoint> {
        self.days.values().cloned().collect()
    }
}

/// Normalized candidate values extracted from one submission
#[derive(Debug, Default)]
struct SubmissionValues {
    hrv_ms: Option<f64>,
    resting_hr: Option<f64>,
    sleep_score: Option<f64>,
    sleep_hours: Option<f64>,
    subjective_wellness: Option<f64>,
    stress_level: Option<f64>,
}

/// Ordering key of a candidate value: source precedence, then submission instant
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    value: f64,
    precedence: u8,
    submitted_at: DateTime<FixedOffset>,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        (self.precedence, self.submitted_at, self.value)
            .partial_cmp(&(other.precedence, other.submitted_at, other.value))
            .map(|ordering| ordering.is_gt())
            .unwrap_or(false)
    }
}

/// Winning candidate per field of one day
///
/// Carries source precedence and submission instant with every value so
/// later folds resolve conflicts exactly like a full aggregation would.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayState {
    hrv_ms: Option<Candidate>,
    resting_hr: Option<Candidate>,
    sleep_score: Option<Candidate>,
    sleep_hours: Option<Candidate>,
    subjective_wellness: Option<Candidate>,
    stress_level: Option<Candidate>,
}

impl DayState {
    fn offer(slot: &mut Option<Candidate>, value: Option<f64>, precedence: u8, at: DateTime<FixedOffset>) {
        let Some(value) = value else { return };
        let candidate = Candidate {
            value,
            precedence,
            submitted_at: at,
        };
        match slot {
            Some(current) if !candidate.beats(current) => {}
            _ => *slot = Some(candidate),
        }
    }

    fn absorb(&mut self, values: SubmissionValues, precedence: u8, at: DateTime<FixedOffset>) {
        Self::offer(&mut self.hrv_ms, values.hrv_ms, precedence, at);
        Self::offer(&mut self.resting_hr, values.resting_hr, precedence, at);
        Self::offer(&mut self.sleep_score, values.sleep_score, precedence, at);
        Self::offer(&mut self.sleep_hours, values.sleep_hours, precedence, at);
        Self::offer(&mut self.subjective_wellness, values.subjective_wellness, precedence, at);
        Self::offer(&mut self.stress_level, values.stress_level, precedence, at);
    }

    /// Canonical point for `date`
    pub fn point(&self, date: NaiveDate) -> DailyMetricPoint {
        DailyMetricPoint {
            date,
            hrv_ms: self.hrv_ms.map(|c| c.value),
            resting_hr: self.resting_hr.map(|c| c.value),
            sleep_score: self.sleep_score.map(|c| to_score(c.value)),
            sleep_hours: self.sleep_hours.map(|c| c.value),
            subjective_wellness: self.subjective_wellness.map(|c| to_score(c.value)),
            stress_level: self.stress_level.map(|c| to_score(c.value)),
        }
    }

    /// Fold another day's winners into this one under the same precedence
    pub fn merge(&mut self, other: &DayState) {
        let pairs = [
            (&mut self.hrv_ms, other.hrv_ms),
            (&mut self.resting_hr, other.resting_hr),
            (&mut self.sleep_score, other.sleep_score),
            (&mut self.sleep_hours, other.sleep_hours),
            (&mut self.subjective_wellness, other.subjective_wellness),
            (&mut self.stress_level, other.stress_level),
        ];
        for (slot, candidate) in pairs {
            if let Some(c) = candidate {
                Self::offer(slot, Some(c.value), c.precedence, c.submitted_at);
            }
        }
    }
}

fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Folds raw records into canonical daily points
pub struct DailyMetricAggregator {
    config: AggregationConfig,
}

impl DailyMetricAggregator {
    /// Create aggregator with default policy
    pub fn new() -> Self {
        DailyMetricAggregator {
            config: AggregationConfig::default(),
        }
    }

    /// Create aggregator with custom policy
    pub fn with_config(config: AggregationConfig) -> Self {
        DailyMetricAggregator { config }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate a user's complete history
    pub fn aggregate(&self, history: &UserHistory) -> AggregatedHistory {
        let offset = history.utc_offset();
        let (days, mut issues) = self.aggregate_wellness(&history.wellness, offset);
        let (activities, activity_issues) =
            self.aggregate_activities(&history.activities, offset, history.easy_pace_sec_per_km);
        issues.extend(activity_issues);

        debug!(
            user = %history.user_id,
            days = days.len(),
            activities = activities.len(),
            issues = issues.len(),
            "Aggregated history"
        );

        AggregatedHistory {
            days,
            activities,
            issues,
        }
    }

    /// Collapse wellness submissions into one point per local day
    pub fn aggregate_wellness(
        &self,
        records: &[WellnessRecord],
        offset: FixedOffset,
    ) -> (BTreeMap<NaiveDate, DailyMetricPoint>, Vec<ValidationIssue>) {
        let (states, issues) = self.aggregate_day_states(records, offset);
        (day_points(&states), issues)
    }

    /// Per-field winners for every local day, keeping precedence and instants
    pub fn aggregate_day_states(
        &self,
        records: &[WellnessRecord],
        offset: FixedOffset,
    ) -> (BTreeMap<NaiveDate, DayState>, Vec<ValidationIssue>) {
        let mut states: BTreeMap<NaiveDate, DayState> = BTreeMap::new();
        let mut issues = Vec::new();

        for record in records {
            let date = local_day(record.submitted_at, offset);
            let values = match &record.data {
                WellnessSource::GarminTelemetry(telemetry) => {
                    normalize_telemetry(telemetry, date, &mut issues)
                }
                WellnessSource::ManualEntry(manual) => normalize_manual(manual, date, &mut issues),
                WellnessSource::NoData => SubmissionValues::default(),
            };

            states
                .entry(date)
                .or_default()
                .absorb(values, record.data.precedence(), record.submitted_at);
        }

        (states, issues)
    }

    /// Convert run records into load points
    pub fn aggregate_activities(
        &self,
        records: &[ActivityRecord],
        offset: FixedOffset,
        easy_pace_sec_per_km: Option<f64>,
    ) -> (Vec<ActivityLoadPoint>, Vec<ValidationIssue>) {
        let mut points = Vec::with_capacity(records.len());
        let mut issues = Vec::new();

        let easy_pace = easy_pace_sec_per_km.filter(|p| p.is_finite() && *p > 0.0);

        for record in records {
            let date = local_day(record.started_at, offset);

            if !record.duration_sec.is_finite() || record.duration_sec < 0.0 {
                push_issue(&mut issues, date, "durationSec", record.duration_sec, "must be a non-negative number");
                continue;
            }

            let distance_km = match record.distance_km {
                Some(d) if d.is_finite() && d >= 0.0 => Some(d),
                Some(d) => {
                    push_issue(&mut issues, date, "distanceKm", d, "must be a non-negative number");
                    None
                }
                None => None,
            };

            let intensity_proxy =
                self.intensity_proxy(record, date, distance_km, easy_pace, &mut issues);

            points.push(ActivityLoadPoint {
                date,
                distance_km,
                duration_sec: record.duration_sec,
                intensity_proxy,
            });
        }

        points.sort_by(|a, b| a.date.cmp(&b.date));
        (points, issues)
    }

    /// Intensity proxy precedence: heart-rate zone, then pace vs easy pace, then 1.0
    fn intensity_proxy(
        &self,
        record: &ActivityRecord,
        date: NaiveDate,
        distance_km: Option<f64>,
        easy_pace: Option<f64>,
        issues: &mut Vec<ValidationIssue>,
    ) -> f64 {
        if let Some(zone) = record.hr_zone {
            match zone {
                1..=5 => return self.config.zone_intensity_factors[usize::from(zone - 1)],
                _ => push_issue(issues, date, "hrZone", f64::from(zone), "zone must be 1-5"),
            }
        }

        match (easy_pace, distance_km) {
            (Some(easy), Some(distance)) if distance > 0.0 && record.duration_sec > 0.0 => {
                let pace = record.duration_sec / distance;
                (easy / pace).clamp(self.config.min_pace_intensity, self.config.max_pace_intensity)
            }
            _ => 1.0,
        }
    }

    /// Fold new submissions into existing day states
    ///
    /// Days older than `as_of - grace_days` are finalized: records landing on
    /// them are reported and ignored. Open days merge the new submissions
    /// under the same precedence as [`Self::aggregate_wellness`], so folding
    /// records in batches gives the same points as aggregating them at once.
    pub fn fold_incremental(
        &self,
        existing: &BTreeMap<NaiveDate, DayState>,
        records: &[WellnessRecord],
        offset: FixedOffset,
        as_of: NaiveDate,
    ) -> (BTreeMap<NaiveDate, DayState>, Vec<ValidationIssue>) {
        let cutoff = as_of
            .checked_sub_days(Days::new(u64::from(self.config.grace_days)))
            .unwrap_or(as_of);

        let (fresh, mut issues) = self.aggregate_day_states(records, offset);
        let mut merged = existing.clone();

        for (date, state) in fresh {
            if date < cutoff {
                warn!(%date, %cutoff, "Ignoring submission for finalized day");
                issues.push(ValidationIssue {
                    date,
                    field: "date".to_string(),
                    value: 0.0,
                    reason: format!("day is finalized (before {})", cutoff),
                });
                continue;
            }

            merged.entry(date).or_default().merge(&state);
        }

        (merged, issues)
    }
}

impl Default for DailyMetricAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Local calendar day of an instant in the user's offset
pub fn local_day(at: DateTime<FixedOffset>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// Canonical points of a day-state map
pub fn day_points(states: &BTreeMap<NaiveDate, DayState>) -> BTreeMap<NaiveDate, DailyMetricPoint> {
    states
        .iter()
        .map(|(date, state)| (*date, state.point(*date)))
        .collect()
}

fn push_issue(issues: &mut Vec<ValidationIssue>, date: NaiveDate, field: &str, value: f64, reason: &str) {
    warn!(%date, field, value, reason, "Dropping invalid field");
    issues.push(ValidationIssue {
        date,
        field: field.to_string(),
        value,
        reason: reason.to_string(),
    });
}

/// Keep `value` when it is finite and inside `[min, max]` (or `(min, max]` when `exclusive_min`)
fn checked(
    value: Option<f64>,
    (min, max): (f64, f64),
    exclusive_min: bool,
    date: NaiveDate,
    field: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<f64> {
    let v = value?;
    let above_min = if exclusive_min { v > min } else { v >= min };
    if v.is_finite() && above_min && v <= max {
        Some(v)
    } else {
        push_issue(issues, date, field, v, &format!("outside {}-{}", min, max));
        None
    }
}

fn normalize_telemetry(
    telemetry: &GarminTelemetry,
    date: NaiveDate,
    issues: &mut Vec<ValidationIssue>,
) -> SubmissionValues {
    SubmissionValues {
        hrv_ms: checked(telemetry.hrv_ms, HRV_RANGE_MS, true, date, "hrvMs", issues),
        resting_hr: checked(telemetry.resting_hr, RESTING_HR_RANGE_BPM, false, date, "restingHr", issues),
        sleep_score: checked(telemetry.sleep_score, (0.0, 100.0), false, date, "sleepScore", issues),
        sleep_hours: checked(telemetry.sleep_hours, (0.0, 24.0), false, date, "sleepHours", issues),
        subjective_wellness: None,
        stress_level: checked(telemetry.stress_level, (0.0, 100.0), false, date, "stressLevel", issues),
    }
}

fn normalize_manual(
    manual: &ManualWellness,
    date: NaiveDate,
    issues: &mut Vec<ValidationIssue>,
) -> SubmissionValues {
    let quality = checked(manual.sleep_quality, QUESTIONNAIRE_SCALE, false, date, "sleepQuality", issues);
    let stress = checked(manual.stress, QUESTIONNAIRE_SCALE, false, date, "stress", issues);
    let energy = checked(manual.mental_energy, QUESTIONNAIRE_SCALE, false, date, "mentalEnergy", issues);
    let soreness = checked(manual.soreness, QUESTIONNAIRE_SCALE, false, date, "soreness", issues);

    // Soreness runs the other way round: 1 feels best
    let freshness = soreness.map(|s| QUESTIONNAIRE_SCALE.1 + 1.0 - s);
    let subjective_wellness = match (energy, freshness) {
        (Some(e), Some(f)) => Some((e + f) / 2.0 * 10.0),
        (Some(e), None) => Some(e * 10.0),
        (None, Some(f)) => Some(f * 10.0),
        (None, None) => None,
    };

    SubmissionValues {
        hrv_ms: checked(manual.hrv_ms, HRV_RANGE_MS, true, date, "hrvMs", issues),
        resting_hr: checked(manual.resting_hr, RESTING_HR_RANGE_BPM, false, date, "restingHr", issues),
        sleep_score: quality.map(|q| q * 10.0),
        sleep_hours: checked(manual.sleep_hours, (0.0, 24.0), false, date, "sleepHours", issues),
        subjective_wellness,
        stress_level: stress.map(|s| s * 10.0),
    }
}
