//! Unified task estimation.
//!
//! Solves for the unknown among duration, personnel and
//! quantity x productivity under one of three modes:
//!
//! - **Duration**: the estimate is typed in directly (or rolled up from subtasks)
//! - **Effort**: `duration = effort_hours / personnel`
//! - **Quantity**: `effort = quantity / rate`, then either duration or crew
//!   size is derived, or nothing is derived and productivity is measured
//!   after completion
//!
//! Derivations follow a skip-don't-fail policy: when a denominator is zero
//! or an input is missing, dependent fields keep their previous value and
//! [`TaskEstimator::recalculate`] returns `None`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::TaskTypeAnalytics;
use crate::task::{Task, TaskIndex};

/// Which quantity the user supplies directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMode {
    /// Hours and minutes entered by hand
    #[default]
    Duration,
    /// Person-hours plus crew size
    Effort,
    /// Quantity plus productivity rate
    Quantity,
}

/// What quantity mode derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuantityCalculationMode {
    /// Crew size known, solve for duration
    #[default]
    CalculateDuration,
    /// Target duration known, solve for crew size
    CalculatePersonnel,
    /// Nothing derived; productivity is computed from actuals at completion
    ManualEntry,
}

/// Value produced by a successful derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Derivation {
    DurationHours(f64),
    Personnel(u32),
}

/// `effort / personnel`, skipped for a zero crew.
pub fn duration_from_effort(effort_hours: f64, personnel: u32) -> Option<f64> {
    if personnel == 0 || !effort_hours.is_finite() {
        return None;
    }
    Some(effort_hours / f64::from(personnel))
}

/// `(quantity / rate) / personnel`, skipped for a zero rate or crew.
pub fn duration_from_quantity(quantity: f64, rate: f64, personnel: u32) -> Option<f64> {
    if rate <= 0.0 || personnel == 0 || !quantity.is_finite() {
        return None;
    }
    Some(quantity / rate / f64::from(personnel))
}

/// `ceil((quantity / rate) / duration)`, at least 1, skipped for a zero rate or duration.
pub fn personnel_from_quantity(quantity: f64, rate: f64, duration_hours: f64) -> Option<u32> {
    if rate <= 0.0 || duration_hours <= 0.0 || !quantity.is_finite() {
        return None;
    }
    let people = (quantity / rate / duration_hours).ceil();
    if !people.is_finite() {
        return None;
    }
    Some(people.clamp(1.0, f64::from(u32::MAX)) as u32)
}

/// Units per person-hour observed on a finished task.
pub fn retroactive_productivity(quantity: f64, actual_person_hours: f64) -> Option<f64> {
    if actual_person_hours <= 0.0 || !quantity.is_finite() || quantity < 0.0 {
        return None;
    }
    Some(quantity / actual_person_hours)
}

/// Live estimation state for one task form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskEstimator {
    pub mode: EstimationMode,
    pub quantity_mode: QuantityCalculationMode,
    /// Manual entry (duration mode)
    pub estimate_hours: u32,
    pub estimate_minutes: u32,
    /// Manual entry overrides the subtask roll-up
    pub has_custom_estimate: bool,
    pub effort_hours: Option<f64>,
    pub personnel_count: Option<u32>,
    pub quantity: Option<f64>,
    /// Units per person-hour
    pub productivity_rate: Option<f64>,
    /// Derived duration, or the target duration when solving for crew size
    pub duration_hours: Option<f64>,
}

impl TaskEstimator {
    pub fn new(mode: EstimationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Prefill from a stored task.
    pub fn for_task(task: &Task, index: &TaskIndex<'_>) -> Self {
        let mut estimator = Self {
            has_custom_estimate: task.has_custom_estimate,
            quantity: task.quantity,
            productivity_rate: task.productivity_rate,
            personnel_count: task.planned_personnel,
            ..Self::default()
        };

        if let Some(seconds) = index.effective_estimate_seconds(&task.id) {
            estimator.set_manual_seconds(seconds);
            estimator.duration_hours = Some(seconds as f64 / 3600.0);
        }
        if task.quantity.is_some() && task.productivity_rate.is_some() {
            estimator.mode = EstimationMode::Quantity;
        }
        estimator
    }

    /// Switch mode. No derivation is re-run; the next input change triggers it.
    pub fn set_mode(&mut self, mode: EstimationMode) {
        self.mode = mode;
    }

    pub fn set_quantity_mode(&mut self, mode: QuantityCalculationMode) {
        self.quantity_mode = mode;
    }

    /// Manual hours and minutes; marks the estimate as a deliberate override.
    pub fn set_manual_duration(&mut self, hours: u32, minutes: u32) {
        self.estimate_hours = hours + minutes / 60;
        self.estimate_minutes = minutes % 60;
        self.has_custom_estimate = true;
    }

    fn set_manual_seconds(&mut self, seconds: u64) {
        let total_minutes = seconds / 60;
        self.estimate_hours = u32::try_from(total_minutes / 60).unwrap_or(u32::MAX);
        self.estimate_minutes = (total_minutes % 60) as u32;
    }

    pub fn set_effort_hours(&mut self, effort_hours: f64) -> Option<Derivation> {
        self.effort_hours = Some(effort_hours);
        self.recalculate()
    }

    pub fn set_personnel(&mut self, personnel: u32) -> Option<Derivation> {
        self.personnel_count = Some(personnel);
        self.recalculate()
    }

    pub fn set_quantity(&mut self, quantity: f64) -> Option<Derivation> {
        self.quantity = Some(quantity);
        self.recalculate()
    }

    pub fn set_productivity_rate(&mut self, rate: f64) -> Option<Derivation> {
        self.productivity_rate = Some(rate);
        self.recalculate()
    }

    /// Target duration used when solving for crew size.
    pub fn set_duration_hours(&mut self, duration_hours: f64) -> Option<Derivation> {
        self.duration_hours = Some(duration_hours);
        self.recalculate()
    }

    /// Re-run the derivation for the current mode.
    ///
    /// Returns `None` and leaves every field untouched when the mode derives
    /// nothing or an input is missing or zero.
    pub fn recalculate(&mut self) -> Option<Derivation> {
        let derived = match self.mode {
            EstimationMode::Duration => None,
            EstimationMode::Effort => {
                duration_from_effort(self.effort_hours?, self.personnel_count?)
                    .map(Derivation::DurationHours)
            }
            EstimationMode::Quantity => {
                let quantity = self.quantity?;
                let rate = self.productivity_rate?;
                match self.quantity_mode {
                    QuantityCalculationMode::CalculateDuration => {
                        duration_from_quantity(quantity, rate, self.personnel_count?)
                            .map(Derivation::DurationHours)
                    }
                    QuantityCalculationMode::CalculatePersonnel => {
                        personnel_from_quantity(quantity, rate, self.duration_hours?)
                            .map(Derivation::Personnel)
                    }
                    QuantityCalculationMode::ManualEntry => None,
                }
            }
        };

        match derived {
            Some(Derivation::DurationHours(hours)) => self.duration_hours = Some(hours),
            Some(Derivation::Personnel(people)) => self.personnel_count = Some(people),
            None => debug!(mode = ?self.mode, "estimate derivation skipped"),
        }
        derived
    }

    /// Total person-hours implied by the current inputs.
    pub fn total_effort_hours(&self) -> Option<f64> {
        match self.mode {
            EstimationMode::Duration => self.manual_seconds().map(|s| s as f64 / 3600.0),
            EstimationMode::Effort => self.effort_hours,
            EstimationMode::Quantity => {
                let rate = self.productivity_rate.filter(|r| *r > 0.0)?;
                Some(self.quantity? / rate)
            }
        }
    }

    fn manual_seconds(&self) -> Option<u64> {
        let seconds = u64::from(self.estimate_hours) * 3600 + u64::from(self.estimate_minutes) * 60;
        (seconds > 0).then_some(seconds)
    }

    /// Estimate to store on the task, in seconds.
    pub fn estimated_seconds(&self) -> Option<u64> {
        match self.mode {
            EstimationMode::Duration => self.manual_seconds(),
            EstimationMode::Effort | EstimationMode::Quantity => self
                .duration_hours
                .filter(|h| h.is_finite() && *h >= 0.0)
                .map(|h| (h * 3600.0).round() as u64),
        }
    }

    /// Estimate after applying the subtask roll-up.
    ///
    /// In duration mode a roll-up sum wins unless the estimate was set as a
    /// custom override.
    pub fn resolve_estimate(&self, rollup_seconds: Option<u64>) -> Option<u64> {
        match (self.mode, rollup_seconds) {
            (EstimationMode::Duration, Some(sum)) if !self.has_custom_estimate => Some(sum),
            _ => self.estimated_seconds(),
        }
    }

    /// Scale the plan by a task type's typical overrun.
    ///
    /// Only significant profiles are applied. Effort mode scales the effort and
    /// quantity mode lowers the rate. Duration mode is left alone: a manual or
    /// rolled-up duration is the user's own figure and is never rewritten.
    /// Returns whether anything changed.
    pub fn apply_historical_correction(&mut self, analytics: &TaskTypeAnalytics) -> bool {
        if !analytics.is_significant {
            return false;
        }
        let factor = analytics.adjusted_effort(1.0);
        if factor <= 0.0 || !factor.is_finite() {
            return false;
        }

        match self.mode {
            EstimationMode::Duration => false,
            EstimationMode::Effort => {
                let Some(effort) = self.effort_hours else {
                    return false;
                };
                self.set_effort_hours(effort * factor);
                true
            }
            EstimationMode::Quantity => {
                let Some(rate) = self.productivity_rate.filter(|r| *r > 0.0) else {
                    return false;
                };
                self.set_productivity_rate(rate / factor);
                true
            }
        }
    }
}
