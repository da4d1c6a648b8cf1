use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::models::{ActivityRecord, GarminTelemetry, ManualWellness, WellnessRecord, WellnessSource};

/// CSV importer with flexible column mapping
///
/// Wellness and activity logs come as two files. Column names are matched
/// case-insensitively against common spellings. Empty cells are missing
/// values; cells that are present but not numeric are passed on as NaN so
/// the aggregator drops and reports them like any other invalid value.
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
    offset: FixedOffset,
}

impl CsvImporter {
    /// Importer that reads zone-less timestamps in the given offset
    pub fn new(offset: FixedOffset) -> Self {
        let mut column_mapping = HashMap::new();

        Self::add_mapping(
            &mut column_mapping,
            "timestamp",
            &["timestamp", "time", "date", "datetime", "submitted_at", "started_at", "start", "start_time"],
        );
        Self::add_mapping(&mut column_mapping, "source", &["source", "origin", "device"]);
        Self::add_mapping(&mut column_mapping, "hrv_ms", &["hrv", "hrv_ms", "rmssd"]);
        Self::add_mapping(
            &mut column_mapping,
            "resting_hr",
            &["rhr", "resting_hr", "resting_heart_rate", "resting_bpm"],
        );
        Self::add_mapping(&mut column_mapping, "sleep_hours", &["sleep_hours", "sleep", "hours_slept"]);
        Self::add_mapping(&mut column_mapping, "sleep_score", &["sleep_score"]);
        Self::add_mapping(&mut column_mapping, "sleep_quality", &["sleep_quality", "quality"]);
        Self::add_mapping(&mut column_mapping, "soreness", &["soreness", "muscle_soreness"]);
        Self::add_mapping(&mut column_mapping, "stress", &["stress", "stress_level"]);
        Self::add_mapping(&mut column_mapping, "mental_energy", &["energy", "mental_energy"]);
        Self::add_mapping(
            &mut column_mapping,
            "distance_km",
            &["distance", "distance_km", "dist", "km"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "duration_sec",
            &["duration", "duration_sec", "duration_s", "seconds", "moving_time", "elapsed_time"],
        );
        Self::add_mapping(&mut column_mapping, "hr_zone", &["zone", "hr_zone", "heart_rate_zone"]);

        Self {
            column_mapping,
            offset,
        }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    /// Parse a timestamp; zone-less values are read in the importer's offset
    pub fn parse_timestamp(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt);
        }

        let formats = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%Y-%m-%dT%H:%M",
        ];
        for format in &formats {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return self.offset.from_local_datetime(&naive).single();
            }
        }

        // Date only: anchor at noon so the local day is unambiguous
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
        let naive = date.and_hms_opt(12, 0, 0)?;
        self.offset.from_local_datetime(&naive).single()
    }

    /// Parse seconds, or `h:mm:ss` / `mm:ss`
    pub fn parse_duration(value: &str) -> f64 {
        if !value.contains(':') {
            return value.parse::<f64>().unwrap_or(f64::NAN);
        }

        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() > 3 {
            return f64::NAN;
        }
        parts.iter().try_fold(0.0, |total, part| {
            part.parse::<f64>().ok().map(|v| total * 60.0 + v)
        })
        .unwrap_or(f64::NAN)
    }

    fn open(&self, path: &Path) -> Result<(csv::Reader<std::fs::File>, HashMap<String, usize>), ImportError> {
        if !path.exists() {
            return Err(ImportError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|e| parse_error(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| parse_error(e.to_string()))?
            .clone();

        // First spelling wins when a file repeats a column under two aliases
        let mut columns = HashMap::new();
        for (index, name) in headers.iter().enumerate() {
            columns.entry(self.normalize_column_name(name)).or_insert(index);
        }

        if !columns.contains_key("timestamp") {
            return Err(ImportError::MissingColumn {
                column: "timestamp".to_string(),
            });
        }

        Ok((reader, columns))
    }

    /// Import a wellness log
    ///
    /// Rows whose `source` mentions garmin are device telemetry; all other
    /// rows are manual check-ins on the 1-10 questionnaire scale.
    pub fn import_wellness(&self, path: &Path) -> Result<Vec<WellnessRecord>, ImportError> {
        let (mut reader, columns) = self.open(path)?;
        let mut records = Vec::new();

        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| parse_error(e.to_string()))?;
            let cells = Cells {
                record: &record,
                columns: &columns,
            };

            let Some(submitted_at) = cells.text("timestamp").and_then(|t| self.parse_timestamp(t)) else {
                warn!(row = row + 2, file = %path.display(), "skipping wellness row without a valid timestamp");
                continue;
            };

            let source = cells.text("source").unwrap_or("manual").to_lowercase();
            let data = if source.contains("garmin") {
                WellnessSource::GarminTelemetry(GarminTelemetry {
                    hrv_ms: cells.number("hrv_ms"),
                    resting_hr: cells.number("resting_hr"),
                    sleep_score: cells.number("sleep_score"),
                    sleep_hours: cells.number("sleep_hours"),
                    stress_level: cells.number("stress"),
                })
            } else {
                WellnessSource::ManualEntry(ManualWellness {
                    sleep_hours: cells.number("sleep_hours"),
                    sleep_quality: cells.number("sleep_quality"),
                    soreness: cells.number("soreness"),
                    stress: cells.number("stress"),
                    mental_energy: cells.number("mental_energy"),
                    resting_hr: cells.number("resting_hr"),
                    hrv_ms: cells.number("hrv_ms"),
                })
            };

            records.push(WellnessRecord { submitted_at, data });
        }

        debug!(count = records.len(), file = %path.display(), "imported wellness rows");
        Ok(records)
    }

    /// Import an activity log
    pub fn import_activities(&self, path: &Path) -> Result<Vec<ActivityRecord>, ImportError> {
        let (mut reader, columns) = self.open(path)?;
        if !columns.contains_key("duration_sec") {
            return Err(ImportError::MissingColumn {
                column: "duration".to_string(),
            });
        }

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| parse_error(e.to_string()))?;
            let cells = Cells {
                record: &record,
                columns: &columns,
            };

            let Some(started_at) = cells.text("timestamp").and_then(|t| self.parse_timestamp(t)) else {
                warn!(row = row + 2, file = %path.display(), "skipping activity row without a valid timestamp");
                continue;
            };

            let Some(duration) = cells.text("duration_sec") else {
                warn!(row = row + 2, file = %path.display(), "skipping activity row without a duration");
                continue;
            };

            let hr_zone = cells.text("hr_zone").and_then(|z| {
                let zone = z.trim_start_matches(['z', 'Z']).parse::<u8>().ok();
                if zone.is_none() {
                    warn!(row = row + 2, value = z, "ignoring unreadable heart-rate zone");
                }
                zone
            });

            records.push(ActivityRecord {
                started_at,
                distance_km: cells.number("distance_km"),
                duration_sec: Self::parse_duration(duration),
                hr_zone,
            });
        }

        debug!(count = records.len(), file = %path.display(), "imported activity rows");
        Ok(records)
    }
}

struct Cells<'a> {
    record: &'a StringRecord,
    columns: &'a HashMap<String, usize>,
}

impl<'a> Cells<'a> {
    fn text(&self, column: &str) -> Option<&'a str> {
        let index = *self.columns.get(column)?;
        self.record.get(index).filter(|v| !v.is_empty())
    }

    fn number(&self, column: &str) -> Option<f64> {
        self.text(column)
            .map(|v| v.parse::<f64>().unwrap_or(f64::NAN))
    }
}

fn parse_error(reason: String) -> ImportError {
    ImportError::ParseError {
        format: "csv".to_string(),
        reason,
    }
}
