use crate::error::ImportError;
use crate::models::UserHistory;
use std::path::Path;
use tracing::info;

pub mod csv;
pub mod json;

/// Supported history file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFormat {
    Json,
    Csv,
}

impl HistoryFormat {
    /// Detect the format from a file extension
    pub fn detect(path: &Path) -> Result<Self, ImportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(HistoryFormat::Json),
            "csv" => Ok(HistoryFormat::Csv),
            other => Err(ImportError::UnsupportedFormat {
                format: if other.is_empty() {
                    "(no extension)".to_string()
                } else {
                    other.to_string()
                },
            }),
        }
    }
}

/// Loads user histories from disk
pub struct ImportManager;

impl ImportManager {
    /// Load a single history document
    pub fn import_history(path: &Path) -> Result<UserHistory, ImportError> {
        match HistoryFormat::detect(path)? {
            HistoryFormat::Json => {
                let history = json::import_history(path)?;
                info!(
                    user_id = %history.user_id,
                    file = %path.display(),
                    "imported history"
                );
                Ok(history)
            }
            HistoryFormat::Csv => Err(ImportError::UnsupportedFormat {
                format: "csv history (pass wellness and activity CSV files separately)".to_string(),
            }),
        }
    }

    /// Load every history in a JSON document
    pub fn import_histories(path: &Path) -> Result<Vec<UserHistory>, ImportError> {
        match HistoryFormat::detect(path)? {
            HistoryFormat::Json => json::import_histories(path),
            HistoryFormat::Csv => Err(ImportError::UnsupportedFormat {
                format: "csv batch".to_string(),
            }),
        }
    }

    /// Build a history from a wellness CSV and/or an activity CSV
    pub fn import_csv_pair(
        user_id: &str,
        utc_offset_minutes: i32,
        wellness: Option<&Path>,
        activities: Option<&Path>,
    ) -> Result<UserHistory, ImportError> {
        let mut history = UserHistory::new(user_id);
        history.utc_offset_minutes = utc_offset_minutes;

        let importer = csv::CsvImporter::new(history.utc_offset());
        if let Some(path) = wellness {
            history.wellness = importer.import_wellness(path)?;
        }
        if let Some(path) = activities {
            history.activities = importer.import_activities(path)?;
        }

        info!(
            user_id,
            wellness = history.wellness.len(),
            activities = history.activities.len(),
            "imported csv history"
        );
        Ok(history)
    }
}
