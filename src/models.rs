use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Biometric metrics that carry a personal rolling baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// Heart rate variability (RMSSD, milliseconds)
    Hrv,
    /// Resting heart rate (beats per minute)
    RestingHr,
}

impl Metric {
    /// Read this metric from a daily point
    pub fn value_of(&self, point: &DailyMetricPoint) -> Option<f64> {
        match self {
            Metric::Hrv => point.hrv_ms,
            Metric::RestingHr => point.resting_hr,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::Hrv => "HRV",
            Metric::RestingHr => "Resting HR",
        }
    }
}

/// Morning check-in entered by the user in the app
///
/// Questionnaire answers use the coaching 1-10 scale; all fields are raw and
/// validated during aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManualWellness {
    /// Hours slept last night
    pub sleep_hours: Option<f64>,

    /// Perceived sleep quality (1-10)
    pub sleep_quality: Option<f64>,

    /// Muscle soreness (1-10, higher is more sore)
    pub soreness: Option<f64>,

    /// Life stress (1-10, higher is more stressed)
    pub stress: Option<f64>,

    /// Mental energy (1-10)
    pub mental_energy: Option<f64>,

    /// Resting heart rate measured by hand (bpm)
    pub resting_hr: Option<f64>,

    /// HRV read from a chest strap or phone app (ms)
    pub hrv_ms: Option<f64>,
}

/// Daily summary pushed by the wearable integration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GarminTelemetry {
    /// Overnight HRV (RMSSD, ms)
    pub hrv_ms: Option<f64>,

    /// Resting heart rate (bpm)
    pub resting_hr: Option<f64>,

    /// Device sleep score (0-100)
    pub sleep_score: Option<f64>,

    /// Total sleep (hours)
    pub sleep_hours: Option<f64>,

    /// Average stress level (0-100)
    pub stress_level: Option<f64>,
}

/// One wellness submission, tagged by where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum WellnessSource {
    ManualEntry(ManualWellness),
    GarminTelemetry(GarminTelemetry),
    /// The source synced but had nothing for the day
    NoData,
}

impl WellnessSource {
    /// Precedence rank used when two sources disagree on a field (higher wins)
    pub fn precedence(&self) -> u8 {
        match self {
            WellnessSource::GarminTelemetry(_) => 2,
            WellnessSource::ManualEntry(_) => 1,
            WellnessSource::NoData => 0,
        }
    }
}

/// Raw wellness record as stored by the app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessRecord {
    /// Submission time with the device's UTC offset
    pub submitted_at: DateTime<FixedOffset>,

    /// Source-specific payload
    pub data: WellnessSource,
}

/// Raw run record as logged or synced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Start time with the device's UTC offset
    pub started_at: DateTime<FixedOffset>,

    /// Distance covered in kilometers
    #[serde(default)]
    pub distance_km: Option<f64>,

    /// Moving time in seconds
    pub duration_sec: f64,

    /// Dominant heart-rate zone (1-5) when the device reported one
    #[serde(default)]
    pub hr_zone: Option<u8>,
}

/// Everything the engine needs for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserHistory {
    /// Unique user identifier
    pub user_id: String,

    /// User's UTC offset in minutes, used to assign local calendar days
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Easy running pace in seconds per kilometer
    #[serde(default)]
    pub easy_pace_sec_per_km: Option<f64>,

    #[serde(default)]
    pub wellness: Vec<WellnessRecord>,

    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
}

impl UserHistory {
    pub fn new(user_id: impl Into<String>) -> Self {
        UserHistory {
            user_id: user_id.into(),
            utc_offset_minutes: 0,
            easy_pace_sec_per_km: None,
            wellness: Vec::new(),
            activities: Vec::new(),
        }
    }

    /// The user's offset as a chrono `FixedOffset`, UTC when out of range
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Canonical wellness values for one local calendar day
///
/// `None` means nothing was recorded; zero is a real value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetricPoint {
    pub date: NaiveDate,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hrv_ms: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resting_hr: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sleep_score: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sleep_hours: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subjective_wellness: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stress_level: Option<u8>,
}

impl DailyMetricPoint {
    /// Empty point for a day
    pub fn empty(date: NaiveDate) -> Self {
        DailyMetricPoint {
            date,
            hrv_ms: None,
            resting_hr: None,
            sleep_score: None,
            sleep_hours: None,
            subjective_wellness: None,
            stress_level: None,
        }
    }

    /// True if no field carries a value
    pub fn is_empty(&self) -> bool {
        self.hrv_ms.is_none()
            && self.resting_hr.is_none()
            && self.sleep_score.is_none()
            && self.sleep_hours.is_none()
            && self.subjective_wellness.is_none()
            && self.stress_level.is_none()
    }
}

/// Training impulse contributed by one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLoadPoint {
    pub date: NaiveDate,

    /// `None` when the recorded distance was invalid
    pub distance_km: Option<f64>,

    pub duration_sec: f64,

    pub intensity_proxy: f64,
}

impl ActivityLoadPoint {
    /// Unitless load: duration in minutes weighted by the intensity proxy
    pub fn load(&self) -> f64 {
        self.duration_sec / 60.0 * self.intensity_proxy
    }
}
