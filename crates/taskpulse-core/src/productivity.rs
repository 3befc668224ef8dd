//! Productivity-rate reconciliation for a single task-edit session.
//!
//! A task can be planned against an expected rate, the historical rate of its
//! task type, or a custom rate typed in by the user. [`ProductivityRateModel`]
//! holds all three, tracks which one is active and reports how far the
//! historical rate drifts from the expected one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::TaskTypeAnalytics;
use crate::config::EngineConfig;
use crate::error::ValidationError;

/// Which rate source drives the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductivityMode {
    #[default]
    Expected,
    Historical,
    Custom,
}

/// Relative difference between the historical and expected rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateVariance {
    /// `|historical - expected| / expected * 100`
    pub percentage: f64,
    /// Historical rate is faster than expected
    pub is_positive: bool,
}

/// Session state for the three productivity-rate sources of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductivityRateModel {
    pub expected_productivity: Option<f64>,
    pub historical_productivity: Option<f64>,
    /// Raw user input; unparseable text counts as no custom rate
    pub custom_productivity_input: String,
    pub productivity_mode: ProductivityMode,
    /// Variance at or above this percentage is significant (closed interval)
    pub significant_variance_percentage: f64,
}

impl Default for ProductivityRateModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductivityRateModel {
    pub fn new() -> Self {
        Self {
            expected_productivity: None,
            historical_productivity: None,
            custom_productivity_input: String::new(),
            productivity_mode: ProductivityMode::Expected,
            significant_variance_percentage: 30.0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            significant_variance_percentage: config.productivity.significant_variance_percentage,
            ..Self::new()
        }
    }

    /// Seed a model with known expected and historical rates.
    pub fn with_rates(expected: Option<f64>, historical: Option<f64>) -> Self {
        Self {
            expected_productivity: expected,
            historical_productivity: historical,
            ..Self::new()
        }
    }

    /// Load rates at the start of an edit session.
    ///
    /// A saved custom rate that differs from the expected rate puts the
    /// session in custom mode; otherwise the expected rate is active.
    pub fn load_productivity_rates(
        &mut self,
        expected: Option<f64>,
        historical: Option<f64>,
        existing_custom: Option<f64>,
    ) {
        self.expected_productivity = expected;
        self.historical_productivity = historical;

        match existing_custom {
            Some(custom) if Some(custom) != expected => {
                self.productivity_mode = ProductivityMode::Custom;
                self.custom_productivity_input = custom.to_string();
            }
            _ => {
                self.productivity_mode = ProductivityMode::Expected;
                self.custom_productivity_input.clear();
            }
        }
        debug!(mode = ?self.productivity_mode, "loaded productivity rates");
    }

    /// Take the historical rate from a task-type profile.
    pub fn load_historical(&mut self, analytics: Option<&TaskTypeAnalytics>) {
        self.historical_productivity = analytics.and_then(|a| a.mean_productivity);
    }

    /// Switch the active source. Rate values are left untouched.
    pub fn select_mode(&mut self, mode: ProductivityMode) {
        self.productivity_mode = mode;
    }

    /// Store user input and switch to custom mode, even if the text does not parse.
    pub fn set_custom_rate(&mut self, input: &str) {
        self.custom_productivity_input = input.to_string();
        self.productivity_mode = ProductivityMode::Custom;
        if self.custom_rate().is_none() && !input.trim().is_empty() {
            debug!(input, "custom productivity rate does not parse, treating as absent");
        }
    }

    /// Parsed custom rate, if the input is a finite number.
    pub fn custom_rate(&self) -> Option<f64> {
        self.custom_productivity_input
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Rate currently driving the estimate; 0 when nothing is known.
    pub fn active_rate(&self) -> f64 {
        let selected = match self.productivity_mode {
            ProductivityMode::Historical => self.historical_productivity,
            ProductivityMode::Custom => self.custom_rate(),
            ProductivityMode::Expected => None,
        };
        selected.or(self.expected_productivity).unwrap_or(0.0)
    }

    pub fn calculate_variance(&self) -> Option<RateVariance> {
        let expected = self.expected_productivity?;
        let historical = self.historical_productivity?;
        if expected == 0.0 {
            return None;
        }
        Some(RateVariance {
            percentage: (historical - expected).abs() * 100.0 / expected,
            is_positive: historical > expected,
        })
    }

    pub fn has_significant_variance(&self) -> bool {
        self.calculate_variance()
            .is_some_and(|v| v.percentage >= self.significant_variance_percentage)
    }

    /// The active rate, or an error when it is not strictly positive.
    pub fn validate(&self, unit: &str) -> Result<f64, ValidationError> {
        let rate = self.active_rate();
        if rate > 0.0 {
            Ok(rate)
        } else {
            Err(ValidationError::NonPositiveRate {
                unit: unit.to_string(),
            })
        }
    }

    pub fn formatted_rate(&self, unit: &str) -> String {
        format!("{:.1} {}/person-hr", self.active_rate(), unit)
    }

    pub fn variance_message(&self) -> Option<String> {
        let variance = self.calculate_variance()?;
        let direction = if variance.is_positive { "faster" } else { "slower" };
        Some(format!(
            "Historical rate is {:.0}% {} than expected",
            variance.percentage, direction
        ))
    }
}
