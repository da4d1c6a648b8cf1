// Library interface for readyrs
// This allows the CLI, integration tests and benches to share the engine

pub mod acwr;
pub mod aggregation;
pub mod baseline;
pub mod cache;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod pmc;
pub mod readiness;
pub mod recovery;

// Re-export commonly used types for convenience
pub use acwr::{AcwrBand, AcwrCalculator, AcwrPoint};
pub use aggregation::{AggregatedHistory, DailyMetricAggregator, DayState};
pub use baseline::{BaselineEstimator, BaselineWindow, Baselines};
pub use cache::EngineCache;
pub use confidence::{Confidence, ConfidenceGate};
pub use config::{AppConfig, EngineConfig};
pub use engine::{BatchReport, EngineReport, ReadinessEngine};
pub use error::{EngineError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use pmc::{LoadState, PmcPoint, TrainingLoadModel};
pub use readiness::{ReadinessLabel, ReadinessResult, ReadinessScorer};
pub use recovery::{RecoveryRecommendation, RecoveryRecommendationEngine};
