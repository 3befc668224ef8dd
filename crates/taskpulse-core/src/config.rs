//! TOML-based engine configuration.
//!
//! Holds the tunable constants of the engine:
//! - Workday window used for available-hours math
//! - KPI capacity, tolerance band, utilization thresholds, score weights
//!   and health-status boundaries
//! - Minimum sample count for task-type analytics
//! - Productivity variance significance threshold
//!
//! Configuration is stored at `~/.config/taskpulse/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, CoreError, Result};

/// Lowest accepted significance threshold for task-type analytics.
pub const MIN_SAMPLE_THRESHOLD_FLOOR: usize = 3;

/// Daily work window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkdayConfig {
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
}

/// How `active_contributors` is approximated (there is no person entity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorProxy {
    /// Number of closed time entries in range
    EntryCount,
    /// Largest crew recorded on a single entry
    PeakPersonnel,
    /// Number of distinct tasks with tracked time
    DistinctTasks,
}

/// Relative weight of each score in the composite health score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_weight")]
    pub efficiency: f64,
    #[serde(default = "default_weight")]
    pub accuracy: f64,
    #[serde(default = "default_weight")]
    pub utilization: f64,
}

/// Lower score bounds for each health status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthBoundaries {
    #[serde(default = "default_excellent")]
    pub excellent: f64,
    #[serde(default = "default_good")]
    pub good: f64,
    #[serde(default = "default_fair")]
    pub fair: f64,
}

/// KPI aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiConfig {
    #[serde(default = "default_person_hours_per_day")]
    pub available_person_hours_per_day: f64,
    /// Half-width of the on-estimate band around a ratio of 1.0
    #[serde(default = "default_tolerance")]
    pub on_estimate_tolerance: f64,
    #[serde(default = "default_under_utilized")]
    pub under_utilized_below: f64,
    #[serde(default = "default_over_utilized")]
    pub over_utilized_above: f64,
    #[serde(default = "default_contributor_proxy")]
    pub contributor_proxy: ContributorProxy,
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub health: HealthBoundaries,
}

/// Task-type analytics settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_min_samples")]
    pub minimum_sample_threshold: usize,
}

/// Productivity-rate settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityConfig {
    #[serde(default = "default_variance_threshold")]
    pub significant_variance_percentage: f64,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/taskpulse/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub workday: WorkdayConfig,
    #[serde(default)]
    pub kpi: KpiConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub productivity: ProductivityConfig,
}

// Default functions
fn default_start_hour() -> u32 {
    7
}
fn default_end_hour() -> u32 {
    15
}
fn default_weight() -> f64 {
    1.0
}
fn default_excellent() -> f64 {
    80.0
}
fn default_good() -> f64 {
    60.0
}
fn default_fair() -> f64 {
    40.0
}
fn default_person_hours_per_day() -> f64 {
    8.0
}
fn default_tolerance() -> f64 {
    0.05
}
fn default_under_utilized() -> f64 {
    50.0
}
fn default_over_utilized() -> f64 {
    100.0
}
fn default_contributor_proxy() -> ContributorProxy {
    ContributorProxy::EntryCount
}
fn default_min_samples() -> usize {
    MIN_SAMPLE_THRESHOLD_FLOOR
}
fn default_variance_threshold() -> f64 {
    30.0
}

impl Default for WorkdayConfig {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            efficiency: 1.0,
            accuracy: 1.0,
            utilization: 1.0,
        }
    }
}

impl Default for HealthBoundaries {
    fn default() -> Self {
        Self {
            excellent: default_excellent(),
            good: default_good(),
            fair: default_fair(),
        }
    }
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            available_person_hours_per_day: default_person_hours_per_day(),
            on_estimate_tolerance: default_tolerance(),
            under_utilized_below: default_under_utilized(),
            over_utilized_above: default_over_utilized(),
            contributor_proxy: default_contributor_proxy(),
            weights: ScoreWeights::default(),
            health: HealthBoundaries::default(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            minimum_sample_threshold: default_min_samples(),
        }
    }
}

impl Default for ProductivityConfig {
    fn default() -> Self {
        Self {
            significant_variance_percentage: default_variance_threshold(),
        }
    }
}

/// Returns `~/.config/taskpulse[-dev]/` based on TASKPULSE_ENV.
///
/// Set TASKPULSE_ENV=dev to use the development directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TASKPULSE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("taskpulse-dev")
    } else {
        base_dir.join("taskpulse")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl EngineConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown().into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")).into());
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value)?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown().into())
    }

    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file at an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: EngineConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        debug!(path = %path.display(), "loaded engine configuration");
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The result must still validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the updated configuration is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: EngineConfig = serde_json::from_value(json).map_err(|e| {
            CoreError::from(ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check the cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.workday.end_hour > 24 {
            return Err(invalid("workday.end_hour", "must be at most 24"));
        }
        if self.workday.end_hour <= self.workday.start_hour {
            return Err(invalid("workday.end_hour", "must be after workday.start_hour"));
        }
        if !(self.kpi.available_person_hours_per_day > 0.0) {
            return Err(invalid(
                "kpi.available_person_hours_per_day",
                "must be greater than 0",
            ));
        }
        if !(0.0..1.0).contains(&self.kpi.on_estimate_tolerance) {
            return Err(invalid("kpi.on_estimate_tolerance", "must be in [0, 1)"));
        }
        if self.kpi.under_utilized_below > self.kpi.over_utilized_above {
            return Err(invalid(
                "kpi.under_utilized_below",
                "must not exceed kpi.over_utilized_above",
            ));
        }
        let w = &self.kpi.weights;
        if [w.efficiency, w.accuracy, w.utilization].iter().any(|v| !(*v >= 0.0)) {
            return Err(invalid("kpi.weights", "weights must be non-negative"));
        }
        let h = &self.kpi.health;
        if !(h.excellent >= h.good && h.good >= h.fair) {
            return Err(invalid("kpi.health", "boundaries must satisfy excellent >= good >= fair"));
        }
        Ok(())
    }

    /// Significance threshold with the floor applied.
    pub fn minimum_sample_threshold(&self) -> usize {
        self.analytics
            .minimum_sample_threshold
            .max(MIN_SAMPLE_THRESHOLD_FLOOR)
    }
}
