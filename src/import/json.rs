use crate::error::ImportError;
use crate::models::UserHistory;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A JSON document holding one history or an array of them
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryDocument {
    Many(Vec<UserHistory>),
    One(Box<UserHistory>),
}

fn read(path: &Path) -> Result<String, ImportError> {
    if !path.exists() {
        return Err(ImportError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    fs::read_to_string(path).map_err(|e| ImportError::ParseError {
        format: "json".to_string(),
        reason: e.to_string(),
    })
}

fn parse(content: &str) -> Result<HistoryDocument, ImportError> {
    serde_json::from_str(content).map_err(|e| ImportError::ParseError {
        format: "json".to_string(),
        reason: e.to_string(),
    })
}

/// Load a single user history
pub fn import_history(path: &Path) -> Result<UserHistory, ImportError> {
    match parse(&read(path)?)? {
        HistoryDocument::One(history) => {
            debug!(
                user_id = %history.user_id,
                wellness = history.wellness.len(),
                activities = history.activities.len(),
                "loaded history"
            );
            Ok(*history)
        }
        HistoryDocument::Many(mut histories) if histories.len() == 1 => Ok(histories.remove(0)),
        HistoryDocument::Many(histories) => Err(ImportError::ParseError {
            format: "json".to_string(),
            reason: format!("expected one history, found {}", histories.len()),
        }),
    }
}

/// Load every history in a file, accepting a single object or an array
pub fn import_histories(path: &Path) -> Result<Vec<UserHistory>, ImportError> {
    let histories = match parse(&read(path)?)? {
        HistoryDocument::One(history) => vec![*history],
        HistoryDocument::Many(histories) => histories,
    };
    debug!(count = histories.len(), "loaded histories");
    Ok(histories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HISTORY: &str = r#"{
        "userId": "runner-7",
        "utcOffsetMinutes": 60,
        "wellness": [
            {"submittedAt": "2024-05-02T07:00:00+01:00",
             "data": {"source": "manualEntry", "sleepHours": 7.5, "soreness": 3}}
        ],
        "activities": [
            {"startedAt": "2024-05-02T18:00:00+01:00", "distanceKm": 8.2, "durationSec": 2700}
        ]
    }"#;

    fn write(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_import_single_history() {
        let file = write(HISTORY);
        let history = import_history(file.path()).unwrap();

        assert_eq!(history.user_id, "runner-7");
        assert_eq!(history.utc_offset_minutes, 60);
        assert_eq!(history.wellness.len(), 1);
        assert_eq!(history.activities[0].hr_zone, None);
    }

    #[test]
    fn test_import_array() {
        let file = write(&format!("[{}, {}]", HISTORY, HISTORY.replace("runner-7", "runner-8")));
        let histories = import_histories(file.path()).unwrap();
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[1].user_id, "runner-8");

        assert!(import_history(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = import_history(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let file = write("{\"userId\": ");
        let err = import_history(file.path()).unwrap_err();
        assert!(matches!(err, ImportError::ParseError { .. }));
    }
}
