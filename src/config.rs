use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::acwr::AcwrConfig;
use crate::aggregation::AggregationConfig;
use crate::baseline::BaselineConfig;
use crate::confidence::ConfidenceConfig;
use crate::error::EngineError;
use crate::logging::LogConfig;
use crate::pmc::PmcConfig;
use crate::readiness::ReadinessConfig;
use crate::recovery::RecoveryConfig;

/// Tolerance used when checking that weights sum to one
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    #[serde(default)]
    pub metadata: ConfigMetadata,

    /// Scoring policy
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Every weight, slope and cut point the engine uses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub aggregation: AggregationConfig,
    pub baseline: BaselineConfig,
    pub pmc: PmcConfig,
    pub acwr: AcwrConfig,
    pub confidence: ConfidenceConfig,
    pub readiness: ReadinessConfig,
    pub recovery: RecoveryConfig,
}

impl EngineConfig {
    /// Reject policies the scorers cannot work with
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: String| Err(EngineError::Configuration(msg));

        if self.baseline.window_days == 0 {
            return invalid("baseline.window_days must be positive".to_string());
        }

        if !(self.pmc.ctl_time_constant >= 1.0 && self.pmc.atl_time_constant >= 1.0) {
            return invalid(format!(
                "pmc time constants must be at least 1 day (ctl={}, atl={})",
                self.pmc.ctl_time_constant, self.pmc.atl_time_constant
            ));
        }

        if self.acwr.acute_days == 0 || self.acwr.acute_days > self.acwr.chronic_days {
            return invalid(format!(
                "acwr windows must satisfy 0 < acute ({}) <= chronic ({})",
                self.acwr.acute_days, self.acwr.chronic_days
            ));
        }

        if !(self.acwr.undertraining_below <= self.acwr.optimal_max
            && self.acwr.optimal_max <= self.acwr.caution_max)
        {
            return invalid("acwr band thresholds must be ordered".to_string());
        }

        let confidence = &self.confidence;
        if !(0.0 <= confidence.medium_coverage
            && confidence.medium_coverage <= confidence.high_coverage
            && confidence.high_coverage <= 1.0)
        {
            return invalid("confidence cut points must satisfy 0 <= medium <= high <= 1".to_string());
        }

        let readiness = &self.readiness;
        check_weights(
            "readiness",
            &[readiness.sleep_weight, readiness.hrv_weight, readiness.rhr_weight],
        )?;
        if !(readiness.tired_min <= readiness.optimal_min
            && readiness.optimal_min <= readiness.fresh_min
            && readiness.fresh_min <= 100)
        {
            return invalid("readiness label cut points must be ordered".to_string());
        }
        if readiness.sleep_target_hours <= 0.0 || readiness.default_score > 100 {
            return invalid("readiness sleep target and default score out of range".to_string());
        }

        let recovery = &self.recovery;
        check_weights(
            "recovery",
            &[
                recovery.sleep_weight,
                recovery.hrv_weight,
                recovery.rhr_weight,
                recovery.wellness_weight,
                recovery.stress_weight,
                recovery.load_weight,
            ],
        )?;
        if recovery.severe_threshold > recovery.weak_threshold {
            return invalid("recovery severe threshold must not exceed weak threshold".to_string());
        }
        if recovery.max_recommendations == 0 {
            return invalid("recovery.max_recommendations must be positive".to_string());
        }

        Ok(())
    }
}

fn check_weights(section: &str, weights: &[f64]) -> Result<(), EngineError> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(EngineError::Configuration(format!(
            "{} weights must be non-negative",
            section
        )));
    }

    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(EngineError::Configuration(format!(
            "{} weights must sum to 1.0 (got {:.4})",
            section, sum
        )));
    }
    Ok(())
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config
            .engine
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".readyrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();
        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Ignoring config file {} ({:#}), using defaults",
                    config_path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }
}
