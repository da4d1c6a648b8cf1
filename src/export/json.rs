use crate::error::ExportError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Serialize any report to pretty JSON
pub fn to_json_pretty<T>(data: &T) -> Result<String, ExportError>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string_pretty(data).map_err(|e| ExportError::SerializationError(e.to_string()))
}

/// Export any serializable data structure to a JSON file
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<(), ExportError>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let json_data = to_json_pretty(data)?;
    let path = output_path.as_ref();

    let write = || -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(json_data.as_bytes())?;
        file.write_all(b"\n")
    };

    write().map_err(|e| ExportError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
