//! Unified error hierarchy for readyrs
//!
//! Missing or sparse data is never an error in this crate: it shows up as
//! low confidence and `None` baselines. The variants here cover configuration,
//! file import/export, and computation invariants that indicate a defect.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all readyrs operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// A numerical invariant of the load model was broken
    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    /// PMC series errors
    #[error("PMC error: {0}")]
    Pmc(#[from] crate::pmc::PmcError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// History import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Report export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broken computation invariants
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    /// `tsb` drifted away from `ctl - atl`
    #[error("tsb != ctl - atl on {date}: ctl={ctl}, atl={atl}, tsb={tsb}")]
    TsbMismatch {
        date: NaiveDate,
        ctl: f64,
        atl: f64,
        tsb: f64,
    },

    /// A load value went negative or non-finite
    #[error("invalid {field} on {date}: {value}")]
    InvalidLoad {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    /// The fold was asked to step to a day that is not after the previous one
    #[error("non-chronological step from {previous} to {next}")]
    NonChronological { previous: NaiveDate, next: NaiveDate },
}

/// History import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported file format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parse error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Required column missing from a CSV header
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },
}

/// Report export errors
#[derive(Debug, Error)]
pub enum ExportError {
    /// Unsupported output format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Serialization failed
    #[error("Serialization failed: {0}")]
    SerializationError(String),

    /// Writing the output failed
    #[error("Export failed to {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Result type alias for readyrs operations
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EngineError::Invariant(_) => ErrorSeverity::Critical,
            EngineError::Pmc(crate::pmc::PmcError::Invariant(_)) => ErrorSeverity::Critical,
            EngineError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            EngineError::Configuration(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find history file: {}", path.display())
            }
            EngineError::Import(ImportError::MissingColumn { column }) => {
                format!("The CSV file has no '{}' column.", column)
            }
            EngineError::Invariant(_) => {
                "Internal calculation error. Please report this with your history file."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Defect requiring immediate attention
    Critical,
    /// Error that prevents the operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
