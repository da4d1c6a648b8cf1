use crate::error::ExportError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub mod json;
pub mod text;

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    Json,
    #[default]
    Text,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" | "table" => Ok(ExportFormat::Text),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Render `value` in `format` and write it to `output`, or stdout when `None`
///
/// `render_text` produces the human-readable form.
pub fn export<T, F>(
    value: &T,
    format: ExportFormat,
    output: Option<&Path>,
    render_text: F,
) -> Result<(), ExportError>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match (format, output) {
        (ExportFormat::Json, Some(path)) => {
            json::export_json(value, path)?;
            info!(file = %path.display(), "exported json");
            Ok(())
        }
        (ExportFormat::Json, None) => write_stdout(&json::to_json_pretty(value)?),
        (ExportFormat::Text, Some(path)) => {
            colored::control::set_override(false);
            let content = render_text(value);
            colored::control::unset_override();
            std::fs::write(path, content).map_err(|e| ExportError::WriteFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            info!(file = %path.display(), "exported text");
            Ok(())
        }
        (ExportFormat::Text, None) => write_stdout(&render_text(value)),
    }
}

fn write_stdout(content: &str) -> Result<(), ExportError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", content.trim_end()).map_err(|e| ExportError::WriteFailed {
        path: "<stdout>".into(),
        reason: e.to_string(),
    })
}
